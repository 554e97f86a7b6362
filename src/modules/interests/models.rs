use serde::{Deserialize, Serialize};

use folio_store::{BookId, InterestId, InterestStatus, UserId};

/// Request model for registering interest in a book.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInterestRequest {
    pub book_id: BookId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
}

/// Response model for a registered interest.
#[derive(Debug, Clone, Serialize)]
pub struct CreateInterestResponse {
    pub id: InterestId,
}

/// Request model for moving an interest through the triage workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub book_id: BookId,
    pub user_id: UserId,
    pub status: InterestStatus,
}

/// Pagination query parameters shared by the queue and user-list reads.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

impl PageParams {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Cheap aggregate read for one book: the denormalized counter plus the
/// catalog record, no row scan involved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterestAggregate {
    pub book_id: BookId,
    pub interest_count: i64,
    pub total_copies: u32,
    pub available_copies: u32,
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_default_and_clamp() {
        let defaults = PageParams::default();
        assert_eq!(defaults.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(defaults.offset(), 0);

        let oversized = PageParams {
            limit: Some(10_000),
            offset: Some(40),
        };
        assert_eq!(oversized.limit(), MAX_PAGE_SIZE);
        assert_eq!(oversized.offset(), 40);

        let zero = PageParams {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(zero.limit(), 1);
    }
}
