//! Record vocabulary shared by the two interest mirrors.
//!
//! One logical interest is materialized twice: in the book-scoped queue
//! (admin triage order, requester identity) and in the user-scoped index
//! (reader's list, book snapshot). Both carry the same `InterestId`,
//! `status`, `requested_at`, and `updated_at`.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::{BookId, InterestId, UserId};

/// Workflow state of an interest.
///
/// `success` and `cancelled` are terminal; records in those states are kept
/// for history and never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    Pending,
    Contacted,
    Success,
    Cancelled,
}

impl InterestStatus {
    /// Active interests count toward the one-per-(user, book) limit.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Contacted)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Cancelled)
    }

    /// Legal admin/reader transitions. `pending -> success` is the direct
    /// admin override; terminal states allow nothing.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Contacted)
                | (Self::Pending, Self::Success)
                | (Self::Pending, Self::Cancelled)
                | (Self::Contacted, Self::Success)
                | (Self::Contacted, Self::Cancelled)
        )
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Contacted => "contacted",
            Self::Success => "success",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Book-scoped mirror record: what an admin triaging a book's queue needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookQueueRecord {
    pub id: InterestId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub status: InterestStatus,
    /// Creation instant; write-once.
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    /// Last status change; never moves backwards.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// User-scoped mirror record: what a reader's own list needs, with the book
/// metadata snapshotted at creation so no catalog join is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInterestRecord {
    pub id: InterestId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub book_title: String,
    pub book_author: String,
    pub book_image: Option<String>,
    pub status: InterestStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
