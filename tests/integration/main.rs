//! Workspace integration tests.
//!
//! Everything runs on the in-memory backend except `postgres`, whose tests
//! are ignored by default and need `DATABASE_URL` pointing at a scratch
//! database: `cargo test --test integration -- --ignored`.

mod atomicity;
mod capacity_race;
mod helpers;
mod http_api;
mod postgres;
mod scenarios;
