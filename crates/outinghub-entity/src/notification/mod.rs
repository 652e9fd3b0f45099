//! Notification domain entities.

pub mod event;
pub mod kind;
pub mod model;
pub mod subject;

pub use event::NotificationEvent;
pub use kind::NotificationKind;
pub use model::{NotificationFilter, NotificationRecord};
pub use subject::{SubjectRef, SubjectType};
