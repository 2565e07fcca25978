use crate::{EngineError, OperatorId, ResultEngine, store::Store};

mod children;
mod lessons;
mod payments;
mod reports;

pub use children::ChildUsage;
pub use lessons::RecurrenceOutcome;
pub use reports::ChildStatement;

/// Domain operations over the entity store, scoped to the configured
/// allowed-operator set (the whole team sees the whole workspace).
#[derive(Clone, Debug)]
pub struct Engine {
    store: Store,
    allowed_operators: Vec<OperatorId>,
}

impl Engine {
    /// Return a builder for `Engine`.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    /// The flat allowlist every read is scoped to.
    #[must_use]
    pub fn allowed_operators(&self) -> &[OperatorId] {
        &self.allowed_operators
    }
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`.
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Store>,
    allowed_operators: Vec<OperatorId>,
}

impl EngineBuilder {
    /// Pass the required store.
    pub fn store(mut self, store: Store) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Set the allowed-operator set (admins included).
    pub fn allowed_operators(mut self, operators: Vec<OperatorId>) -> EngineBuilder {
        self.allowed_operators = operators;
        self
    }

    /// Construct `Engine`.
    pub fn build(self) -> Engine {
        Engine {
            store: self.store.unwrap_or_else(Store::in_memory),
            allowed_operators: self.allowed_operators,
        }
    }
}
