//! Book-scoped interest mirror: one ordered queue per book.
//!
//! The queue's shard entry lock is the serialization point for the two
//! races the workflow cares about: concurrent creates by the same user for
//! the same book (at most one active winner) and concurrent transitions on
//! the same interest.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::ids::{BookId, InterestId};
use crate::interest::{BookQueueRecord, InterestStatus};
use crate::Page;

/// Queue position: newest requests first, ties broken by id ascending so
/// pagination is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueKey {
    requested_at: OffsetDateTime,
    id: InterestId,
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .requested_at
            .cmp(&self.requested_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
struct BookQueue {
    entries: BTreeMap<QueueKey, BookQueueRecord>,
    positions: HashMap<InterestId, QueueKey>,
}

/// Outcome of an idempotent queue insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The record was already present under the same id; a retried create
    /// resumed past this step.
    Resumed,
}

/// Outcome of a status transition on one queue record.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied {
        previous: InterestStatus,
        record: BookQueueRecord,
    },
    /// The record already carried the requested status; idempotent retry.
    Noop(BookQueueRecord),
}

impl Transition {
    pub fn record(&self) -> &BookQueueRecord {
        match self {
            Self::Applied { record, .. } => record,
            Self::Noop(record) => record,
        }
    }
}

#[derive(Debug, Default)]
pub struct BookQueueStore {
    queues: DashMap<BookId, BookQueue>,
}

impl BookQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending record, enforcing the one-active-interest-per-user
    /// rule under the book's entry lock. Re-inserting the same id succeeds
    /// as a resume and writes nothing.
    pub fn insert_pending(&self, record: BookQueueRecord) -> Result<InsertOutcome, StoreError> {
        let mut queue = self.queues.entry(record.book_id).or_default();
        if queue.positions.contains_key(&record.id) {
            return Ok(InsertOutcome::Resumed);
        }
        let already_active = queue
            .entries
            .values()
            .any(|existing| existing.user_id == record.user_id && existing.status.is_active());
        if already_active {
            return Err(StoreError::Duplicate);
        }
        let key = QueueKey {
            requested_at: record.requested_at,
            id: record.id,
        };
        queue.positions.insert(record.id, key);
        queue.entries.insert(key, record);
        Ok(InsertOutcome::Inserted)
    }

    /// Move a record to `new_status` under the book's entry lock.
    ///
    /// Requesting the status the record already has is a `Noop` (safe client
    /// retry); an illegal transition fails without touching the record.
    /// `updated_at` never moves backwards.
    pub fn transition(
        &self,
        book_id: BookId,
        id: InterestId,
        new_status: InterestStatus,
        now: OffsetDateTime,
    ) -> Result<Transition, StoreError> {
        let mut queue = self.queues.get_mut(&book_id).ok_or(StoreError::NotFound)?;
        let key = *queue.positions.get(&id).ok_or(StoreError::NotFound)?;
        let Some(record) = queue.entries.get_mut(&key) else {
            return Err(StoreError::NotFound);
        };
        if record.status == new_status {
            return Ok(Transition::Noop(record.clone()));
        }
        if !record.status.can_transition_to(new_status) {
            return Err(StoreError::InvalidTransition {
                from: record.status,
                to: new_status,
            });
        }
        let previous = record.status;
        record.status = new_status;
        record.updated_at = record.updated_at.max(now);
        Ok(Transition::Applied {
            previous,
            record: record.clone(),
        })
    }

    pub fn get(&self, book_id: BookId, id: InterestId) -> Option<BookQueueRecord> {
        let queue = self.queues.get(&book_id)?;
        let key = queue.positions.get(&id)?;
        queue.entries.get(key).cloned()
    }

    /// One page of the book's queue in triage order.
    pub fn page(&self, book_id: BookId, limit: usize, offset: usize) -> Page<BookQueueRecord> {
        let Some(queue) = self.queues.get(&book_id) else {
            return Page::empty();
        };
        let items: Vec<BookQueueRecord> = queue
            .entries
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        let has_more = queue.entries.len() > offset + items.len();
        Page { items, has_more }
    }

    /// Number of non-cancelled records; reconciliation ground truth for the
    /// denormalized counter.
    pub fn active_count(&self, book_id: BookId) -> i64 {
        self.queues
            .get(&book_id)
            .map(|queue| {
                queue
                    .entries
                    .values()
                    .filter(|record| record.status != InterestStatus::Cancelled)
                    .count() as i64
            })
            .unwrap_or(0)
    }

    /// Snapshot of every record for one book (reconciler mirror sweep).
    pub fn records(&self, book_id: BookId) -> Vec<BookQueueRecord> {
        self.queues
            .get(&book_id)
            .map(|queue| queue.entries.values().cloned().collect())
            .unwrap_or_default()
    }
}
