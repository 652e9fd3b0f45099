//! Weak reference from a notification to the entity it is about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outinghub_core::types::id::{OutingId, ParticipationId};

/// Entity type a notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// An outing.
    Outing,
    /// A participation request.
    Participation,
}

impl SubjectType {
    /// Return the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outing => "outing",
            Self::Participation => "participation",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outing" => Ok(Self::Outing),
            "participation" => Ok(Self::Participation),
            other => Err(format!("unknown subject type '{other}'")),
        }
    }
}

/// Type + id of the subject. Never owns the subject, which may disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    /// Entity type.
    pub subject_type: SubjectType,
    /// Entity id.
    pub subject_id: Uuid,
}

impl SubjectRef {
    /// Subject pointing at an outing.
    pub fn outing(id: OutingId) -> Self {
        Self {
            subject_type: SubjectType::Outing,
            subject_id: id.into_uuid(),
        }
    }

    /// Subject pointing at a participation request.
    pub fn participation(id: ParticipationId) -> Self {
        Self {
            subject_type: SubjectType::Participation,
            subject_id: id.into_uuid(),
        }
    }
}
