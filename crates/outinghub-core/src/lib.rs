//! # outinghub-core
//!
//! Core crate for OutingHub. Contains configuration schemas, typed
//! identifiers, pagination types, and the unified error system shared by
//! the admission engine and the notification outbox.
//!
//! This crate has **no** internal dependencies on other OutingHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
