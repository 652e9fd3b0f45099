//! In-memory store implementations for single-node deployments and tests.
//!
//! State is lost on restart. Per-outing serialization uses one
//! `tokio::sync::Mutex` per outing, so different outings never contend.

pub mod notification;
pub mod outbox;
pub mod outing;

pub use notification::MemoryNotificationStore;
pub use outbox::MemoryOutboxStore;
pub use outing::MemoryOutingStore;
