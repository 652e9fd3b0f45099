//! # outinghub-entity
//!
//! Domain entity models for OutingHub. Every struct in this crate
//! represents a database table row or a domain value object. Row types
//! additionally derive `sqlx::FromRow`.

pub mod notification;
pub mod outbox;
pub mod outing;
pub mod participation;
