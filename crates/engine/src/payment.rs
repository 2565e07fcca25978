use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChildId, Money, OperatorId, PaymentId};

/// A recorded payment buying a fixed number of sessions for one child.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub operator: OperatorId,
    pub child_id: ChildId,
    pub amount: Money,
    /// How many sessions the amount purchases.
    pub lessons_count: u32,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    #[must_use]
    pub fn new(
        operator: OperatorId,
        child_id: ChildId,
        amount: Money,
        lessons_count: u32,
        payment_date: NaiveDate,
        note: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            operator,
            child_id,
            amount,
            lessons_count,
            payment_date,
            note,
            created_at: now,
            updated_at: now,
        }
    }
}
