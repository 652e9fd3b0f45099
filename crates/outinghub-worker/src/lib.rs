//! Background processing for OutingHub.
//!
//! The coordinator delivers notification intents inline right after each
//! commit. Anything that did not make it (crash between commit and
//! delivery, notification store outage) is picked up here by a poll loop
//! over the durable outbox.

pub mod runner;

pub use runner::OutboxWorker;
