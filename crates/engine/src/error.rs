//! The module contains the errors the engine can throw.
//!
//! Validation failures are recoverable (the caller re-prompts), `NotFound`
//! aborts the operation in progress, and the policy variants carry the data
//! a caller needs to explain the refusal.
use thiserror::Error;

use crate::{Money, store::StoreError};

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("end time must be later than start time")]
    EndNotAfterStart,
    #[error("unit price is not set for this child")]
    PriceNotSet,
    #[error("{amount} is not a whole number of sessions at {unit_price} per session")]
    NotMultipleOfPrice {
        amount: Money,
        unit_price: Money,
        /// How many sessions the amount would buy (fractional).
        approx: f64,
    },
    #[error("child is referenced by {lessons} lessons and {payments} payments")]
    ChildInUse { lessons: u64, payments: u64 },
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::EndNotAfterStart, Self::EndNotAfterStart) => true,
            (Self::PriceNotSet, Self::PriceNotSet) => true,
            (
                Self::NotMultipleOfPrice {
                    amount: a1,
                    unit_price: p1,
                    ..
                },
                Self::NotMultipleOfPrice {
                    amount: a2,
                    unit_price: p2,
                    ..
                },
            ) => a1 == a2 && p1 == p2,
            (
                Self::ChildInUse {
                    lessons: l1,
                    payments: p1,
                },
                Self::ChildInUse {
                    lessons: l2,
                    payments: p2,
                },
            ) => l1 == l2 && p1 == p2,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
