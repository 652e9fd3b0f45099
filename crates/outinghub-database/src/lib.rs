//! # outinghub-database
//!
//! Storage for OutingHub: the store traits the admission engine and the
//! notification outbox are written against, the PostgreSQL repositories
//! backing them in production, and in-memory stores for single-node runs
//! and tests.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{
    ChangeSet, FailureDisposition, NotificationStore, OutboxStore, OutingGuard, OutingSnapshot,
    OutingStore,
};
