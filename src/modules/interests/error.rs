use serde_json::json;
use thiserror::Error;

use folio_http::error::AppError;
use folio_store::InterestStatus;

/// Failures of the interest workflow, each with a stable user-facing
/// mapping. `Unavailable` and `PartialWrite` deliberately share the generic
/// try-again surface: the partial state is repaired by reconciliation, not
/// described to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterestError {
    #[error("book not found")]
    BookNotFound,

    #[error("interest not found")]
    InterestNotFound,

    #[error("an active interest for this book already exists")]
    AlreadyInterested,

    #[error("book is not accepting interest")]
    BookUnavailable,

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: InterestStatus,
        to: InterestStatus,
    },

    #[error("the write could not be completed")]
    Unavailable,

    #[error("the write completed partially and was handed to reconciliation")]
    PartialWrite,
}

impl From<InterestError> for AppError {
    fn from(err: InterestError) -> Self {
        match err {
            InterestError::BookNotFound => AppError::not_found("Book not found"),
            InterestError::InterestNotFound => AppError::not_found("Interest not found"),
            InterestError::AlreadyInterested => AppError::conflict_with_code(
                "already_interested",
                "An active interest for this book already exists",
            ),
            InterestError::BookUnavailable => AppError::conflict_with_code(
                "book_unavailable",
                "This book is not accepting interest right now",
            ),
            InterestError::InvalidTransition { from, to } => AppError::validation(
                vec![json!({
                    "field": "status",
                    "error": format!("cannot change status from {from} to {to}"),
                })],
                "Illegal status change",
            ),
            InterestError::Unavailable | InterestError::PartialWrite => {
                AppError::unavailable("The request could not be completed, please try again")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    fn status_of(err: InterestError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn every_failure_kind_has_a_stable_http_mapping() {
        assert_eq!(status_of(InterestError::BookNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(InterestError::InterestNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(InterestError::AlreadyInterested),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(InterestError::BookUnavailable),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(InterestError::InvalidTransition {
                from: InterestStatus::Success,
                to: InterestStatus::Pending,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(InterestError::Unavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(InterestError::PartialWrite),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
