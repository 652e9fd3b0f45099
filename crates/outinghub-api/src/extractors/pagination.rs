//! Pagination and feed filter query parameters.

use serde::{Deserialize, Serialize};

use outinghub_core::error::AppError;
use outinghub_core::types::pagination::PageRequest;
use outinghub_entity::notification::{NotificationFilter, NotificationKind};

/// Query parameters of the notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    /// Page number (1-based, default: 1).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page (default: 25, max: 100).
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Only unread notifications.
    #[serde(default)]
    pub unread_only: bool,
    /// Only one kind, e.g. `PARTICIPATION_ACCEPTED`.
    pub kind: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    25
}

impl FeedParams {
    /// Converts to a `PageRequest`.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }

    /// Converts to a feed filter, rejecting unknown kinds.
    pub fn filter(&self) -> Result<NotificationFilter, AppError> {
        let kind = match self.kind.as_deref().filter(|k| !k.is_empty()) {
            Some(raw) => Some(
                raw.parse::<NotificationKind>()
                    .map_err(AppError::invalid_input)?,
            ),
            None => None,
        };
        Ok(NotificationFilter {
            kind,
            unread_only: self.unread_only,
        })
    }
}
