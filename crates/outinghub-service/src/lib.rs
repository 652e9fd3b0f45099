//! # outinghub-service
//!
//! Business logic for OutingHub: the capacity ledger, the participation
//! state machine, the transition coordinator that commits each transition
//! together with its notification intents, the outbox drain, and the read
//! projections.
//!
//! Services follow constructor injection: every store is provided at
//! construction time as an `Arc<dyn ...>` trait object.

pub mod admission;
pub mod notification;
pub mod outbox;
pub mod query;
pub mod retry;

pub use admission::{
    CapacitySummary, OutingChangeOutcome, OutingChangeReason, SubmitRequest, TransitionCoordinator,
};
pub use notification::NotificationService;
pub use outbox::{DrainReport, OutboxDrain};
pub use query::{ParticipationQueries, Roster};
pub use retry::RetryPolicy;
