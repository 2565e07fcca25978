//! Domain engine for the tutoring tracker.
//!
//! Owns the entities (children, lessons, payments, operator profiles), the
//! document store they live in, and the billing ledger that reconciles
//! delivered sessions against paid ones. The chat transport lives in a
//! separate crate and talks to this one only through [`Engine`].
pub use child::Child;
pub use error::EngineError;
pub use ids::{ChildId, LessonId, OperatorId, PaymentId};
pub use lesson::{ClockTime, Lesson, RECURRENCE_WEEKS, recurrence_candidates};
pub use money::Money;
pub use operator::OperatorProfile;
pub use ops::{ChildStatement, ChildUsage, Engine, EngineBuilder, RecurrenceOutcome};
pub use payment::Payment;
pub use store::{ArchivedFilter, Store, StoreError};

mod child;
mod error;
mod ids;
pub mod ledger;
mod lesson;
mod money;
mod operator;
mod ops;
mod payment;
pub mod store;

type ResultEngine<T> = Result<T, EngineError>;
