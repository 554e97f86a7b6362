//! User-scoped interest mirror: each reader's own list, carrying the book
//! snapshot captured at creation. Order is unspecified to callers but
//! stable, so a paginated scan of an unchanging set never skips or repeats.

use std::collections::BTreeMap;

use dashmap::DashMap;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::ids::{InterestId, UserId};
use crate::interest::{InterestStatus, UserInterestRecord};
use crate::Page;

#[derive(Debug, Default)]
pub struct UserIndexStore {
    indexes: DashMap<UserId, BTreeMap<InterestId, UserInterestRecord>>,
}

impl UserIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creation write; idempotent under the record id so a resumed create
    /// never duplicates or clobbers an entry that already landed.
    pub fn upsert(&self, record: UserInterestRecord) {
        let mut index = self.indexes.entry(record.user_id).or_default();
        index.entry(record.id).or_insert(record);
    }

    /// Force the mirror to the status/updated_at of its book-scoped twin.
    pub fn set_status(
        &self,
        user_id: UserId,
        id: InterestId,
        status: InterestStatus,
        updated_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut index = self.indexes.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        let record = index.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.status = status;
        record.updated_at = updated_at;
        Ok(())
    }

    pub fn get(&self, user_id: UserId, id: InterestId) -> Option<UserInterestRecord> {
        self.indexes.get(&user_id)?.get(&id).cloned()
    }

    /// One page of the user's interests in stable iteration order.
    pub fn page(&self, user_id: UserId, limit: usize, offset: usize) -> Page<UserInterestRecord> {
        let Some(index) = self.indexes.get(&user_id) else {
            return Page::empty();
        };
        let items: Vec<UserInterestRecord> =
            index.values().skip(offset).take(limit).cloned().collect();
        let has_more = index.len() > offset + items.len();
        Page { items, has_more }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::ids::BookId;

    fn record(user_id: UserId) -> UserInterestRecord {
        let at = datetime!(2026-08-01 09:00:00 UTC);
        UserInterestRecord {
            id: InterestId::generate(),
            user_id,
            book_id: BookId::generate(),
            book_title: "The Trial".to_string(),
            book_author: "Franz Kafka".to_string(),
            book_image: None,
            status: InterestStatus::Pending,
            requested_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn upsert_is_idempotent_per_id() {
        let store = UserIndexStore::new();
        let user = UserId::generate();
        let mut r = record(user);
        store.upsert(r.clone());

        // A resumed create must not clobber what already landed.
        r.book_title = "Different".to_string();
        store.upsert(r.clone());

        let kept = store.get(user, r.id).unwrap();
        assert_eq!(kept.book_title, "The Trial");
    }

    #[test]
    fn set_status_requires_an_existing_record() {
        let store = UserIndexStore::new();
        let user = UserId::generate();
        let at = datetime!(2026-08-01 10:00:00 UTC);

        assert_eq!(
            store.set_status(user, InterestId::generate(), InterestStatus::Contacted, at),
            Err(StoreError::NotFound)
        );

        let r = record(user);
        let id = r.id;
        store.upsert(r);
        store
            .set_status(user, id, InterestStatus::Contacted, at)
            .unwrap();

        let updated = store.get(user, id).unwrap();
        assert_eq!(updated.status, InterestStatus::Contacted);
        assert_eq!(updated.updated_at, at);
    }

    #[test]
    fn paginated_scan_is_stable_and_complete() {
        let store = UserIndexStore::new();
        let user = UserId::generate();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let r = record(user);
            ids.push(r.id);
            store.upsert(r);
        }
        ids.sort();

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = store.page(user, 2, offset);
            offset += page.items.len();
            let done = !page.has_more;
            seen.extend(page.items.into_iter().map(|r| r.id));
            if done {
                break;
            }
        }
        assert_eq!(seen, ids);
    }

    #[test]
    fn users_see_only_their_own_interests() {
        let store = UserIndexStore::new();
        let alice = UserId::generate();
        let bob = UserId::generate();
        store.upsert(record(alice));
        store.upsert(record(alice));
        store.upsert(record(bob));

        assert_eq!(store.page(alice, 10, 0).items.len(), 2);
        assert_eq!(store.page(bob, 10, 0).items.len(), 1);
        assert!(store.page(UserId::generate(), 10, 0).items.is_empty());
    }
}
