//! Custom Axum extractors.

pub mod pagination;
pub mod path;
pub mod validated;
