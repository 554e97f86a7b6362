//! Background repair of drifted counters and lagging mirrors.
//!
//! The book-scoped queue is ground truth. Reconciliation is per-book and
//! cheap: it only visits books that were flagged dirty by a coordinated
//! write that could not run to completion.

use std::sync::Arc;
use std::time::Duration;

use folio_store::{
    AdjustmentKey, BookId, BookQueueRecord, InterestStatus, Store, UserInterestRecord,
};

pub struct Reconciler {
    store: Arc<Store>,
}

impl Reconciler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Repair every flagged book. Returns how many books were visited.
    pub fn run_once(&self) -> usize {
        let flagged = self.store.counters.drain_dirty();
        for book_id in &flagged {
            self.reconcile_book(*book_id);
        }
        flagged.len()
    }

    fn reconcile_book(&self, book_id: BookId) {
        let records = self.store.queues.records(book_id);

        // Recompute the counter and the adjustment keys it accounts for.
        let mut applied = Vec::with_capacity(records.len());
        let mut interest_count = 0i64;
        for record in &records {
            applied.push(AdjustmentKey::created(record.id));
            if record.status == InterestStatus::Cancelled {
                applied.push(AdjustmentKey::cancelled(record.id));
            } else {
                interest_count += 1;
            }
        }
        self.store.counters.restore(book_id, interest_count, applied);

        // Push queue state into any user-index record that lags it.
        let mut resynced = 0usize;
        for record in &records {
            let needs_sync = match self.store.index.get(record.user_id, record.id) {
                Some(mirrored) => {
                    mirrored.status != record.status || mirrored.updated_at != record.updated_at
                }
                None => true,
            };
            if !needs_sync {
                continue;
            }
            if self
                .store
                .index
                .set_status(record.user_id, record.id, record.status, record.updated_at)
                .is_err()
            {
                self.rebuild_index_record(record);
            }
            resynced += 1;
        }

        tracing::info!(
            book_id = %book_id,
            interest_count,
            resynced,
            "reconciled interest counter from book queue"
        );
    }

    fn rebuild_index_record(&self, record: &BookQueueRecord) {
        let Some(book) = self.store.catalog.get(record.book_id) else {
            tracing::warn!(
                book_id = %record.book_id,
                interest_id = %record.id,
                "cannot rebuild index record, catalog row is missing"
            );
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

    /// Run on a fixed interval until the returned handle is aborted.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick; repair anything left from a
            // previous run before settling into the cadence.
            loop {
                ticker.tick().await;
                let repaired = self.run_once();
                if repaired > 0 {
                    tracing::info!(repaired, "reconciliation pass repaired books");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use folio_store::{CatalogBook, InterestId, UserId};
    use time::macros::datetime;

    use super::*;

    fn seeded() -> (Arc<Store>, Reconciler, BookId) {
        let store = Arc::new(Store::new());
        let book = CatalogBook {
            id: BookId::generate(),
            title: "Gamma".to_string(),
            author: "Anonymous".to_string(),
            slug: "gamma".to_string(),
            image_url: None,
            total_copies: 1,
            available_copies: 1,
            is_available: true,
        };
        let book_id = book.id;
        store.catalog.insert(book).unwrap();
        let reconciler = Reconciler::new(store.clone());
        (store, reconciler, book_id)
    }

    fn queue_record(book_id: BookId, status: InterestStatus) -> BookQueueRecord {
        let at = datetime!(2026-08-01 09:00:00 UTC);
        BookQueueRecord {
            id: InterestId::generate(),
            book_id,
            user_id: UserId::generate(),
            user_name: "Reader".to_string(),
            user_email: "reader@example.com".to_string(),
            status,
            requested_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn drifted_counter_is_recomputed_from_the_queue() {
        let (store, reconciler, book_id) = seeded();

        let pending = queue_record(book_id, InterestStatus::Pending);
        store.queues.insert_pending(pending.clone()).unwrap();
        let other = queue_record(book_id, InterestStatus::Pending);
        store.queues.insert_pending(other).unwrap();
        store
            .queues
            .transition(
                book_id,
                pending.id,
                InterestStatus::Cancelled,
                datetime!(2026-08-01 10:00:00 UTC),
            )
            .unwrap();

        // Counter never saw any of it.
        assert_eq!(store.counters.interest_count(book_id), 0);
        store.counters.mark_dirty(book_id);

        assert_eq!(reconciler.run_once(), 1);
        assert_eq!(store.counters.interest_count(book_id), 1);
        assert!(!store.counters.is_dirty(book_id));

        // Clean pass has nothing to do.
        assert_eq!(reconciler.run_once(), 0);
    }

    #[test]
    fn lagging_index_records_are_rebuilt() {
        let (store, reconciler, book_id) = seeded();

        let record = queue_record(book_id, InterestStatus::Pending);
        store.queues.insert_pending(record.clone()).unwrap();
        store.counters.mark_dirty(book_id);

        reconciler.run_once();

        let rebuilt = store.index.get(record.user_id, record.id).unwrap();
        assert_eq!(rebuilt.status, InterestStatus::Pending);
        assert_eq!(rebuilt.book_title, "Gamma");
        assert_eq!(rebuilt.updated_at, record.updated_at);
    }

    #[test]
    fn repaired_counter_keeps_retries_idempotent() {
        let (store, reconciler, book_id) = seeded();

        let record = queue_record(book_id, InterestStatus::Cancelled);
        // A cancelled record whose counter adjustments never landed.
        store
            .queues
            .insert_pending(BookQueueRecord {
                status: InterestStatus::Pending,
                ..record.clone()
            })
            .unwrap();
        store
            .queues
            .transition(
                book_id,
                record.id,
                InterestStatus::Cancelled,
                datetime!(2026-08-01 10:00:00 UTC),
            )
            .unwrap();
        store.counters.mark_dirty(book_id);
        reconciler.run_once();
        assert_eq!(store.counters.interest_count(book_id), 0);

        // A client retry of the cancellation must not decrement again.
        assert!(!store
            .counters
            .apply(book_id, AdjustmentKey::cancelled(record.id)));
        assert_eq!(store.counters.interest_count(book_id), 0);
    }
}
