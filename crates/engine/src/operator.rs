use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::OperatorId;

/// Profile of a team member, refreshed on every `/start`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperatorProfile {
    pub id: OperatorId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OperatorProfile {
    #[must_use]
    pub fn new(id: OperatorId, username: Option<String>, first_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            first_name,
            created_at: now,
            updated_at: now,
        }
    }
}
