use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChildId, Money, OperatorId};

/// A child (student) the team tutors.
///
/// Archiving hides the child from default listings and ledger aggregation
/// without touching its lessons or payments; the flag is reversible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    pub operator: OperatorId,
    pub name: String,
    pub age: u8,
    /// Price of a single session. Zero means "not set yet" and blocks
    /// amount-first payment entry.
    pub unit_price: Money,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Child {
    #[must_use]
    pub fn new(operator: OperatorId, name: String, age: u8, unit_price: Money) -> Self {
        let now = Utc::now();
        Self {
            id: ChildId::new(),
            operator,
            name,
            age,
            unit_price,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the child has a usable per-session price.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.unit_price.is_positive()
    }
}
