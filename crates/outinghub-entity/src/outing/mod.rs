//! Outing domain entities.

pub mod model;
pub mod status;

pub use model::{NewOuting, Outing, OutingPatch};
pub use status::OutingStatus;
