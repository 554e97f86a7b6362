use thiserror::Error;

use crate::interest::InterestStatus;

/// Failures surfaced by the individual stores.
///
/// `Conflict` is the only transient kind; everything else is terminal and
/// must not be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate record")]
    Duplicate,

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: InterestStatus,
        to: InterestStatus,
    },

    #[error("transient write conflict")]
    Conflict,
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(StoreError::Conflict.is_retryable());
        assert!(!StoreError::NotFound.is_retryable());
        assert!(!StoreError::Duplicate.is_retryable());
        assert!(!StoreError::InvalidTransition {
            from: InterestStatus::Success,
            to: InterestStatus::Pending,
        }
        .is_retryable());
    }
}
