//! Per-operator conversation context.
//!
//! One operator drives at most one flow at a time; starting a new flow
//! overwrites whatever was in progress (last-write-wins), and finishing or
//! cancelling clears the slot. Nothing here is ever persisted.

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use tokio::sync::Mutex;

use engine::{ChildId, ClockTime, Money, OperatorId};

/// Scheduling flow: child, date, start, end, then the optional recurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AddLessonState {
    SelectChild,
    Date,
    StartTime,
    EndTime,
    AskRepeat,
    ConfirmRepeat,
}

#[derive(Clone, Debug)]
pub(crate) struct AddLessonFlow {
    pub state: AddLessonState,
    pub child_id: Option<ChildId>,
    pub child_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    /// Recurrence candidate dates, filled when the operator asks for them.
    pub candidates: Vec<NaiveDate>,
}

impl AddLessonFlow {
    pub(crate) fn new() -> Self {
        Self {
            state: AddLessonState::SelectChild,
            child_id: None,
            child_name: None,
            date: None,
            start_time: None,
            end_time: None,
            candidates: Vec::new(),
        }
    }
}

/// Amount-first payment entry: the lesson count is derived from the price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PayByAmountState {
    SelectChild,
    Amount,
    Confirm,
}

#[derive(Clone, Debug)]
pub(crate) struct PayByAmountFlow {
    pub state: PayByAmountState,
    pub child_id: Option<ChildId>,
    pub child_name: Option<String>,
    pub unit_price: Option<Money>,
    pub amount: Option<Money>,
    pub lessons_count: Option<u32>,
}

impl PayByAmountFlow {
    pub(crate) fn new() -> Self {
        Self {
            state: PayByAmountState::SelectChild,
            child_id: None,
            child_name: None,
            unit_price: None,
            amount: None,
            lessons_count: None,
        }
    }
}

/// Count-first payment entry: a suggested amount, then a free one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PayByCountState {
    SelectChild,
    Count,
    Amount,
    Date,
    Confirm,
}

#[derive(Clone, Debug)]
pub(crate) struct PayByCountFlow {
    pub state: PayByCountState,
    pub child_id: Option<ChildId>,
    pub child_name: Option<String>,
    pub unit_price: Option<Money>,
    pub lessons_count: Option<u32>,
    pub amount: Option<Money>,
    pub payment_date: Option<NaiveDate>,
}

impl PayByCountFlow {
    pub(crate) fn new() -> Self {
        Self {
            state: PayByCountState::SelectChild,
            child_id: None,
            child_name: None,
            unit_price: None,
            lessons_count: None,
            amount: None,
            payment_date: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AddChildState {
    Name,
    Age,
    Price,
}

#[derive(Clone, Debug)]
pub(crate) struct AddChildFlow {
    pub state: AddChildState,
    pub name: Option<String>,
    pub age: Option<u8>,
}

impl AddChildFlow {
    pub(crate) fn new() -> Self {
        Self {
            state: AddChildState::Name,
            name: None,
            age: None,
        }
    }
}

/// Which child attribute a single-field edit rewrites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChildField {
    Name,
    Age,
    Price,
}

#[derive(Clone, Debug)]
pub(crate) struct EditChildFlow {
    pub child_id: ChildId,
    pub field: ChildField,
}

/// The typed union of "no active flow" / "flow X at state S with fields F".
#[derive(Clone, Debug)]
pub(crate) enum ActiveFlow {
    AddLesson(AddLessonFlow),
    PayByAmount(PayByAmountFlow),
    PayByCount(PayByCountFlow),
    AddChild(AddChildFlow),
    EditChild(EditChildFlow),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    pub flow: Option<ActiveFlow>,
}

#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<OperatorId, Session>>>,
}

impl SessionStore {
    pub(crate) async fn get(&self, operator: OperatorId) -> Session {
        let guard = self.inner.lock().await;
        guard.get(&operator).cloned().unwrap_or_default()
    }

    pub(crate) async fn update<F>(&self, operator: OperatorId, f: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let mut guard = self.inner.lock().await;
        let session = guard.entry(operator).or_default();
        f(session);
        session.clone()
    }

    /// Starts `flow`, discarding any flow already in progress.
    pub(crate) async fn begin(&self, operator: OperatorId, flow: ActiveFlow) {
        self.update(operator, |s| s.flow = Some(flow)).await;
    }

    /// Unconditionally drops the operator's context.
    pub(crate) async fn clear(&self, operator: OperatorId) {
        self.update(operator, |s| s.flow = None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_independent_per_operator() {
        let store = SessionStore::default();
        let alice = OperatorId::new(1);
        let bob = OperatorId::new(2);

        store.begin(alice, ActiveFlow::AddLesson(AddLessonFlow::new())).await;
        assert!(store.get(alice).await.flow.is_some());
        assert!(store.get(bob).await.flow.is_none());

        store.clear(alice).await;
        assert!(store.get(alice).await.flow.is_none());
    }

    #[tokio::test]
    async fn begin_overwrites_previous_flow() {
        let store = SessionStore::default();
        let alice = OperatorId::new(1);

        store.begin(alice, ActiveFlow::AddLesson(AddLessonFlow::new())).await;
        store.begin(alice, ActiveFlow::AddChild(AddChildFlow::new())).await;
        match store.get(alice).await.flow {
            Some(ActiveFlow::AddChild(_)) => {}
            other => panic!("expected the new flow, got {other:?}"),
        }
    }
}
