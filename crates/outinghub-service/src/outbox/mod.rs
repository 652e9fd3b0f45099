//! Turning durable outbox intents into notification records.

pub mod drain;

pub use drain::{DrainReport, OutboxDrain};
