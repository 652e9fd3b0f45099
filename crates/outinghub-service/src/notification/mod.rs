//! Notification content and the recipient-facing notification service.

pub mod formatter;
pub mod service;

pub use service::NotificationService;
