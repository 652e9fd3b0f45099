//! Participation request domain entities.

pub mod model;
pub mod status;

pub use model::ParticipationRequest;
pub use status::ParticipationStatus;
