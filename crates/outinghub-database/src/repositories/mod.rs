//! PostgreSQL implementations of the store traits.

pub mod notification;
pub mod outbox;
pub mod outing;

pub use notification::NotificationRepository;
pub use outbox::OutboxRepository;
pub use outing::OutingRepository;
