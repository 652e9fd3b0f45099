//! Durable outbox intents.

pub mod model;

pub use model::OutboxEvent;
