//! Interest lifecycle engine.
//!
//! Both write operations are coordinated multi-location writes: the
//! book-scoped queue, the user-scoped index, and the denormalized counter
//! must reach a consistent end state without a cross-store transaction.
//! The queue write is the decision point (serialized under the book's
//! entry lock); every later step is idempotent under the interest id, so
//! retries resume rather than duplicate, and anything left behind is
//! repaired by the reconciler.

use std::sync::Arc;

use time::OffsetDateTime;

use folio_store::{
    AdjustmentKey, BookQueueRecord, InterestId, InterestStatus, RetryPolicy, Store, StoreError,
    UserInterestRecord,
};

use super::error::InterestError;
use super::models::{ChangeStatusRequest, CreateInterestRequest};

pub struct InterestService {
    store: Arc<Store>,
    retry: RetryPolicy,
}

impl InterestService {
    pub fn new(store: Arc<Store>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Register a reader's interest in a book.
    ///
    /// Fails with `BookNotFound`/`BookUnavailable` before anything is
    /// written, and with `AlreadyInterested` if the user already holds an
    /// active interest for the book (the losing side of a concurrent race
    /// gets this error; it never creates a second active record).
    pub async fn create_interest(
        &self,
        req: CreateInterestRequest,
    ) -> Result<InterestId, InterestError> {
        let book = self
            .store
            .catalog
            .get(req.book_id)
            .ok_or(InterestError::BookNotFound)?;
        if !book.is_available {
            return Err(InterestError::BookUnavailable);
        }

        // One id and one instant shared by both mirrors.
        let id = InterestId::generate();
        let now = OffsetDateTime::now_utc();

        let queue_record = BookQueueRecord {
            id,
            book_id: req.book_id,
            user_id: req.user_id,
            user_name: req.user_name,
            user_email: req.user_email,
            status: InterestStatus::Pending,
            requested_at: now,
            updated_at: now,
        };
        let index_record = UserInterestRecord {
            id,
            user_id: req.user_id,
            book_id: req.book_id,
            book_title: book.title,
            book_author: book.author,
            book_image: book.image_url,
            status: InterestStatus::Pending,
            requested_at: now,
            updated_at: now,
        };

        // Decision point: the duplicate check runs under the book's entry
        // lock, so concurrent creates for the same (user, book) admit at
        // most one winner.
        let queues = &self.store.queues;
        self.retry
            .run(|| {
                let record = queue_record.clone();
                async move { queues.insert_pending(record).map(|_| ()) }
            })
            .await
            .map_err(|err| match err {
                StoreError::Duplicate => InterestError::AlreadyInterested,
                _ => InterestError::Unavailable,
            })?;

        // Both remaining writes are idempotent under the interest id: a
        // resumed create cannot duplicate the index record or double-count.
        self.store.index.upsert(index_record);
        self.store
            .counters
            .apply(req.book_id, AdjustmentKey::created(id));

        tracing::info!(
            interest_id = %id,
            book_id = %req.book_id,
            user_id = %req.user_id,
            "interest registered"
        );
        Ok(id)
    }

    /// Move an interest to a new workflow status in both mirrors, adjusting
    /// the counter when the interest is cancelled.
    ///
    /// Re-applying the same `(interest_id, status)` pair is a no-op
    /// success; the mirror and counter steps still run so a retried call
    /// completes any partially applied predecessor.
    pub async fn change_status(
        &self,
        interest_id: InterestId,
        req: ChangeStatusRequest,
    ) -> Result<BookQueueRecord, InterestError> {
        let existing = self
            .store
            .queues
            .get(req.book_id, interest_id)
            .ok_or(InterestError::InterestNotFound)?;
        if existing.user_id != req.user_id {
            return Err(InterestError::InterestNotFound);
        }

        let now = OffsetDateTime::now_utc();
        let transition = self
            .store
            .queues
            .transition(req.book_id, interest_id, req.status, now)
            .map_err(|err| match err {
                StoreError::NotFound => InterestError::InterestNotFound,
                StoreError::InvalidTransition { from, to } => {
                    InterestError::InvalidTransition { from, to }
                }
                _ => InterestError::Unavailable,
            })?;
        let record = transition.record().clone();

        // Mirror the accepted state into the user index with the exact
        // status/updated_at the queue now carries.
        let index = &self.store.index;
        let (user_id, id, status, updated_at) =
            (record.user_id, record.id, record.status, record.updated_at);
        let synced = self
            .retry
            .run(|| async move { index.set_status(user_id, id, status, updated_at) })
            .await;
        match synced {
            Ok(()) => {}
            Err(StoreError::NotFound) => {
                // The creating write never reached the user index; rebuild
                // the record from its queue twin and the catalog snapshot.
                self.restore_index_record(&record);
            }
            Err(err) => {
                tracing::warn!(
                    interest_id = %id,
                    book_id = %req.book_id,
                    error = %err,
                    "mirror sync exhausted retries, flagging counter for reconciliation"
                );
                self.store.counters.mark_dirty(req.book_id);
                return Err(InterestError::PartialWrite);
            }
        }

        // Only cancellation touches the counter: it tracks interests
        // created minus interests cancelled. The keyed adjustment makes a
        // retried cancellation a no-op.
        if record.status == InterestStatus::Cancelled {
            self.store
                .counters
                .apply(req.book_id, AdjustmentKey::cancelled(id));
        }

        tracing::info!(
            interest_id = %id,
            book_id = %req.book_id,
            status = %record.status,
            "interest status updated"
        );
        Ok(record)
    }

    fn restore_index_record(&self, record: &BookQueueRecord) {
        let Some(book) = self.store.catalog.get(record.book_id) else {
            // Queue record without a catalog row; leave it to the
            // reconciler rather than invent a snapshot.
            self.store.counters.mark_dirty(record.book_id);
            return;
        };
        self.store.index.upsert(UserInterestRecord {
            id: record.id,
            user_id: record.user_id,
            book_id: record.book_id,
            book_title: book.title,
            book_author: book.author,
            book_image: book.image_url,
            status: record.status,
            requested_at: record.requested_at,
            updated_at: record.updated_at,
        });
    }
}
