//! # outinghub-api
//!
//! HTTP API layer for OutingHub built on Axum.
//!
//! Exposes the admission engine and the notification feed as a small
//! JSON request/response API under `/api`, with request logging, CORS,
//! compression, request timeouts, and the `AppError` to HTTP mapping.
//!
//! Caller identity is taken from the request body or path as-is;
//! authentication happens upstream of this service.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Backend, build_state, run_server};
pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
