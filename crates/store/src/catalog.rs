//! Catalog records. The interest engine only ever reads this store; copy
//! counts and the availability toggle belong to catalog administration.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::ids::BookId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBook {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// URL-friendly slug; unique across the catalog.
    pub slug: String,
    pub image_url: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
    /// Admin toggle gating new interest registrations.
    pub is_available: bool,
}

#[derive(Debug, Default)]
pub struct CatalogStore {
    books: DashMap<BookId, CatalogBook>,
    slugs: DashMap<String, BookId>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new book; fails with `Duplicate` if the slug is taken.
    pub fn insert(&self, book: CatalogBook) -> Result<(), StoreError> {
        match self.slugs.entry(book.slug.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(book.id);
                self.books.insert(book.id, book);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: BookId) -> Option<CatalogBook> {
        self.books.get(&id).map(|book| book.clone())
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<CatalogBook> {
        let id = *self.slugs.get(slug)?;
        self.get(id)
    }

    /// All books, ordered by id (v7 ids, so insertion-time order).
    pub fn list(&self) -> Vec<CatalogBook> {
        let mut books: Vec<CatalogBook> = self.books.iter().map(|b| b.clone()).collect();
        books.sort_by_key(|book| book.id);
        books
    }

    pub fn set_availability(&self, id: BookId, is_available: bool) -> Result<CatalogBook, StoreError> {
        let mut book = self.books.get_mut(&id).ok_or(StoreError::NotFound)?;
        book.is_available = is_available;
        Ok(book.clone())
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(slug: &str) -> CatalogBook {
        CatalogBook {
            id: BookId::generate(),
            title: "The Trial".to_string(),
            author: "Franz Kafka".to_string(),
            slug: slug.to_string(),
            image_url: None,
            total_copies: 3,
            available_copies: 3,
            is_available: true,
        }
    }

    #[test]
    fn slug_collisions_are_rejected() {
        let store = CatalogStore::new();
        store.insert(book("the-trial")).unwrap();
        assert_eq!(
            store.insert(book("the-trial")),
            Err(StoreError::Duplicate)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn availability_toggle_round_trips() {
        let store = CatalogStore::new();
        let entry = book("the-castle");
        let id = entry.id;
        store.insert(entry).unwrap();

        let updated = store.set_availability(id, false).unwrap();
        assert!(!updated.is_available);
        assert!(!store.get(id).unwrap().is_available);

        assert_eq!(
            store.set_availability(BookId::generate(), true),
            Err(StoreError::NotFound)
        );
    }

    #[test]
    fn lookup_by_slug_matches_lookup_by_id() {
        let store = CatalogStore::new();
        let entry = book("amerika");
        let id = entry.id;
        store.insert(entry).unwrap();

        assert_eq!(store.get_by_slug("amerika").unwrap().id, id);
        assert!(store.get_by_slug("missing").is_none());
    }
}
