//! Read side of the interest subsystem.
//!
//! Each read is served by the mirror keyed for it: the admin queue from the
//! book-scoped store, the reader's list from the user-scoped store, and the
//! aggregate from the counter record. None of them scans.

use std::sync::Arc;

use folio_store::{BookId, BookQueueRecord, Page, Store, UserId, UserInterestRecord};

use super::error::InterestError;
use super::models::InterestAggregate;

pub struct InterestQueries {
    store: Arc<Store>,
}

impl InterestQueries {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// A book's queue in triage order (newest request first).
    pub fn book_queue(
        &self,
        book_id: BookId,
        limit: usize,
        offset: usize,
    ) -> Result<Page<BookQueueRecord>, InterestError> {
        if self.store.catalog.get(book_id).is_none() {
            return Err(InterestError::BookNotFound);
        }
        Ok(self.store.queues.page(book_id, limit, offset))
    }

    /// A reader's own interests. Order is stable but unspecified.
    pub fn user_interests(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Page<UserInterestRecord> {
        self.store.index.page(user_id, limit, offset)
    }

    /// The cheap aggregate: counter record plus the single catalog read.
    pub fn aggregate(&self, book_id: BookId) -> Result<InterestAggregate, InterestError> {
        let book = self
            .store
            .catalog
            .get(book_id)
            .ok_or(InterestError::BookNotFound)?;
        Ok(InterestAggregate {
            book_id,
            interest_count: self.store.counters.interest_count(book_id),
            total_copies: book.total_copies,
            available_copies: book.available_copies,
            is_available: book.is_available,
        })
    }
}

#[cfg(test)]
mod tests {
    use folio_store::{AdjustmentKey, CatalogBook, InterestId, InterestStatus, UserInterestRecord};
    use time::macros::datetime;

    use super::*;

    fn seeded() -> (Arc<Store>, InterestQueries, BookId) {
        let store = Arc::new(Store::new());
        let book = CatalogBook {
            id: BookId::generate(),
            title: "Beta".to_string(),
            author: "Anonymous".to_string(),
            slug: "beta".to_string(),
            image_url: None,
            total_copies: 4,
            available_copies: 3,
            is_available: true,
        };
        let book_id = book.id;
        store.catalog.insert(book).unwrap();
        let queries = InterestQueries::new(store.clone());
        (store, queries, book_id)
    }

    #[test]
    fn aggregate_combines_counter_and_catalog() {
        let (store, queries, book_id) = seeded();
        store
            .counters
            .apply(book_id, AdjustmentKey::created(InterestId::generate()));
        store
            .counters
            .apply(book_id, AdjustmentKey::created(InterestId::generate()));

        let aggregate = queries.aggregate(book_id).unwrap();
        assert_eq!(aggregate.interest_count, 2);
        assert_eq!(aggregate.available_copies, 3);
        assert_eq!(aggregate.total_copies, 4);
        assert!(aggregate.is_available);

        assert_eq!(
            queries.aggregate(BookId::generate()),
            Err(InterestError::BookNotFound)
        );
    }

    #[test]
    fn book_queue_requires_a_known_book() {
        let (_, queries, book_id) = seeded();
        assert!(queries.book_queue(book_id, 10, 0).unwrap().items.is_empty());
        assert_eq!(
            queries.book_queue(BookId::generate(), 10, 0),
            Err(InterestError::BookNotFound)
        );
    }

    #[test]
    fn user_interests_page_through_without_gaps() {
        let (store, queries, book_id) = seeded();
        let user = UserId::generate();
        let at = datetime!(2026-08-01 09:00:00 UTC);
        for _ in 0..3 {
            store.index.upsert(UserInterestRecord {
                id: InterestId::generate(),
                user_id: user,
                book_id,
                book_title: "Beta".to_string(),
                book_author: "Anonymous".to_string(),
                book_image: None,
                status: InterestStatus::Pending,
                requested_at: at,
                updated_at: at,
            });
        }

        let first = queries.user_interests(user, 2, 0);
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more);
        let rest = queries.user_interests(user, 2, 2);
        assert_eq!(rest.items.len(), 1);
        assert!(!rest.has_more);
    }
}
