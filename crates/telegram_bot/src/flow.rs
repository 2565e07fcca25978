//! The step contract every conversational flow implements.
//!
//! A state handler consumes one operator input and yields a [`Step`]: stay
//! (re-prompt the same state), advance (the flow recorded its next state), or
//! finish (the driver clears the session context unconditionally).

use teloxide::types::InlineKeyboardMarkup;

/// One incoming operator interaction.
#[derive(Clone, Copy, Debug)]
pub(crate) enum FlowInput<'a> {
    /// Free text typed into the chat.
    Text(&'a str),
    /// Callback payload of a pressed inline button.
    Choice(&'a str),
}

impl<'a> FlowInput<'a> {
    pub(crate) fn text(self) -> Option<&'a str> {
        match self {
            FlowInput::Text(text) => Some(text),
            FlowInput::Choice(_) => None,
        }
    }

    pub(crate) fn choice(self) -> Option<&'a str> {
        match self {
            FlowInput::Choice(data) => Some(data),
            FlowInput::Text(_) => None,
        }
    }
}

/// Outgoing text plus an optional choice set.
#[derive(Clone, Debug)]
pub(crate) struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub(crate) fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Outcome of one state handler invocation.
#[derive(Clone, Debug)]
pub(crate) enum Step {
    /// Re-enter the same state (validation error or ignorable input).
    Stay(Reply),
    /// Context mutated, flow moved to its next state.
    Advance(Reply),
    /// Flow terminated (success, cancellation or error).
    Finish(Reply),
}

impl Step {
    #[cfg(test)]
    pub(crate) fn reply(&self) -> &Reply {
        match self {
            Step::Stay(reply) | Step::Advance(reply) | Step::Finish(reply) => reply,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_finish(&self) -> bool {
        matches!(self, Step::Finish(_))
    }
}
