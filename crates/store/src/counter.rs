//! Denormalized per-book interest counters.
//!
//! The counter is the aggregate read path: it must never be rebuilt by
//! scanning records on a read. Every mutation is a keyed adjustment tied to
//! the interest's own id, so a retried coordinated write can re-apply its
//! counter step without double counting.

use std::collections::HashSet;

use dashmap::{DashMap, DashSet};

use crate::ids::{BookId, InterestId};

/// Direction of a keyed adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentKind {
    /// Interest created: +1.
    Created,
    /// Interest cancelled: -1.
    Cancelled,
}

/// Idempotency key for one counter adjustment. Applied at most once per
/// book over the counter's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdjustmentKey {
    pub interest_id: InterestId,
    pub kind: AdjustmentKind,
}

impl AdjustmentKey {
    pub fn created(interest_id: InterestId) -> Self {
        Self {
            interest_id,
            kind: AdjustmentKind::Created,
        }
    }

    pub fn cancelled(interest_id: InterestId) -> Self {
        Self {
            interest_id,
            kind: AdjustmentKind::Cancelled,
        }
    }
}

#[derive(Debug, Default)]
struct BookCounter {
    interest_count: i64,
    applied: HashSet<AdjustmentKey>,
}

/// Sharded counter store. All mutation happens under the book's shard entry
/// lock, which gives atomic increment/decrement semantics without a
/// read-modify-write window.
#[derive(Debug, Default)]
pub struct CounterStore {
    counters: DashMap<BookId, BookCounter>,
    dirty: DashSet<BookId>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a keyed adjustment. Returns `true` if the key was newly
    /// applied, `false` if it had already been consumed (idempotent retry).
    pub fn apply(&self, book_id: BookId, key: AdjustmentKey) -> bool {
        let mut drifted = false;
        let applied = {
            let mut counter = self.counters.entry(book_id).or_default();
            if !counter.applied.insert(key) {
                return false;
            }
            match key.kind {
                AdjustmentKind::Created => counter.interest_count += 1,
                AdjustmentKind::Cancelled => counter.interest_count -= 1,
            }
            if counter.interest_count < 0 {
                drifted = true;
            }
            true
        };
        if drifted {
            tracing::warn!(book_id = %book_id, "interest counter went negative, flagging for reconciliation");
            self.dirty.insert(book_id);
        }
        applied
    }

    /// Single-record aggregate read; unknown books count zero.
    pub fn interest_count(&self, book_id: BookId) -> i64 {
        self.counters
            .get(&book_id)
            .map(|counter| counter.interest_count)
            .unwrap_or(0)
    }

    /// Flag a counter whose coordinated write did not run to completion.
    pub fn mark_dirty(&self, book_id: BookId) {
        self.dirty.insert(book_id);
    }

    pub fn is_dirty(&self, book_id: BookId) -> bool {
        self.dirty.contains(&book_id)
    }

    /// Take the current set of flagged books, clearing the flags.
    pub fn drain_dirty(&self) -> Vec<BookId> {
        let flagged: Vec<BookId> = self.dirty.iter().map(|id| *id).collect();
        for book_id in &flagged {
            self.dirty.remove(book_id);
        }
        flagged
    }

    /// Reconciliation writes the value recomputed from the book-scoped
    /// mirror, together with the adjustment keys that value accounts for.
    /// Replacing the applied set keeps later client retries idempotent: a
    /// cancellation the recomputed count already reflects must not
    /// decrement again.
    pub fn restore(
        &self,
        book_id: BookId,
        interest_count: i64,
        applied: impl IntoIterator<Item = AdjustmentKey>,
    ) {
        let mut counter = self.counters.entry(book_id).or_default();
        counter.interest_count = interest_count;
        counter.applied = applied.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_adjustments_apply_at_most_once() {
        let store = CounterStore::new();
        let book = BookId::generate();
        let interest = InterestId::generate();

        assert!(store.apply(book, AdjustmentKey::created(interest)));
        assert!(!store.apply(book, AdjustmentKey::created(interest)));
        assert_eq!(store.interest_count(book), 1);

        assert!(store.apply(book, AdjustmentKey::cancelled(interest)));
        assert!(!store.apply(book, AdjustmentKey::cancelled(interest)));
        assert_eq!(store.interest_count(book), 0);
    }

    #[test]
    fn counters_for_different_books_are_independent() {
        let store = CounterStore::new();
        let alpha = BookId::generate();
        let beta = BookId::generate();

        store.apply(alpha, AdjustmentKey::created(InterestId::generate()));
        store.apply(alpha, AdjustmentKey::created(InterestId::generate()));
        store.apply(beta, AdjustmentKey::created(InterestId::generate()));

        assert_eq!(store.interest_count(alpha), 2);
        assert_eq!(store.interest_count(beta), 1);
        assert_eq!(store.interest_count(BookId::generate()), 0);
    }

    #[test]
    fn concurrent_increments_lose_no_updates() {
        let store = std::sync::Arc::new(CounterStore::new());
        let book = BookId::generate();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = std::sync::Arc::clone(&store);
                scope.spawn(move || {
                    for _ in 0..100 {
                        store.apply(book, AdjustmentKey::created(InterestId::generate()));
                    }
                });
            }
        });

        assert_eq!(store.interest_count(book), 800);
    }

    #[test]
    fn unmatched_decrement_flags_the_book() {
        let store = CounterStore::new();
        let book = BookId::generate();

        store.apply(book, AdjustmentKey::cancelled(InterestId::generate()));
        assert_eq!(store.interest_count(book), -1);
        assert!(store.is_dirty(book));
    }

    #[test]
    fn drain_dirty_clears_flags() {
        let store = CounterStore::new();
        let book = BookId::generate();

        store.mark_dirty(book);
        assert_eq!(store.drain_dirty(), vec![book]);
        assert!(!store.is_dirty(book));
        assert!(store.drain_dirty().is_empty());
    }

    #[test]
    fn restore_overwrites_count_and_key_bookkeeping() {
        let store = CounterStore::new();
        let book = BookId::generate();
        let interest = InterestId::generate();

        store.apply(book, AdjustmentKey::created(interest));
        assert_eq!(store.interest_count(book), 1);

        // Reconciliation observed the interest as cancelled: the restored
        // state accounts for both adjustments.
        store.restore(
            book,
            0,
            [
                AdjustmentKey::created(interest),
                AdjustmentKey::cancelled(interest),
            ],
        );
        assert_eq!(store.interest_count(book), 0);

        // A retried cancellation after the repair must be a no-op.
        assert!(!store.apply(book, AdjustmentKey::cancelled(interest)));
        assert_eq!(store.interest_count(book), 0);
    }
}
