//! In-process storage engine for FOLIO.
//!
//! Holds the catalog, the two mirrored interest stores (per-book queue,
//! per-user index), and the denormalized per-book counters. Everything is
//! sharded concurrent state; there is no cross-store transaction, so
//! multi-location writes are coordinated by the lifecycle engine through
//! idempotent, keyed steps.

pub mod catalog;
pub mod counter;
pub mod error;
pub mod ids;
pub mod index;
pub mod interest;
pub mod queue;
pub mod retry;

use serde::{Deserialize, Serialize};

pub use catalog::{CatalogBook, CatalogStore};
pub use counter::{AdjustmentKey, AdjustmentKind, CounterStore};
pub use error::StoreError;
pub use ids::{BookId, InterestId, UserId};
pub use index::UserIndexStore;
pub use interest::{BookQueueRecord, InterestStatus, UserInterestRecord};
pub use queue::{BookQueueStore, InsertOutcome, Transition};
pub use retry::RetryPolicy;

/// One page of a finite, restartable scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }
}

/// Root handle over the engine's stores. Cheap to share behind an `Arc`;
/// every field is internally synchronized.
#[derive(Debug, Default)]
pub struct Store {
    pub catalog: CatalogStore,
    pub counters: CounterStore,
    pub queues: BookQueueStore,
    pub index: UserIndexStore,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}
