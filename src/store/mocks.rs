use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Mutex, PoisonError};

use crate::error::StoreResult;
use crate::store::pagination::{ListQuery, PaginatedResponse};
use crate::store::products::{Product, ProductCollection, ProductDraft};
use crate::store::ProductStore;

pub const SEEDED_PRODUCTS: usize = 10;

/// Deterministic store for tests.
///
/// Starts with "Product 1".."Product 10" and stamps every write from a
/// logical clock that advances one second per write.
#[derive(Debug)]
pub struct MockProductStore {
    inner: Mutex<MockState>,
}

#[derive(Debug)]
struct MockState {
    collection: ProductCollection,
    ticks: i64,
}

impl MockState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        epoch() + Duration::seconds(self.ticks)
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

impl MockProductStore {
    /// An empty store
    pub fn empty() -> Self {
        Self {
            inner: Mutex::new(MockState {
                collection: ProductCollection::default(),
                ticks: 0,
            }),
        }
    }

    /// A store seeded with ten sample products
    pub fn new() -> Self {
        let store = Self::empty();
        for i in 1..=SEEDED_PRODUCTS {
            store.create(ProductDraft::new(
                format!("Product {}", i),
                format!("Description for product {}", i),
                format!("Category {}", i),
            ));
        }
        store
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut state = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl Default for MockProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStore for MockProductStore {
    fn create(&self, draft: ProductDraft) -> Product {
        self.with_state(|state| {
            let now = state.tick();
            state.collection.create(draft, now)
        })
    }

    fn get(&self, id: i64) -> StoreResult<Product> {
        self.with_state(|state| state.collection.get(id))
    }

    fn update(&self, id: i64, draft: ProductDraft) -> StoreResult<Product> {
        self.with_state(|state| {
            let now = state.tick();
            state.collection.update(id, draft, now)
        })
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        self.with_state(|state| state.collection.delete(id))
    }

    fn list(&self, query: &ListQuery) -> PaginatedResponse {
        self.with_state(|state| state.collection.list(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_seeded_products() {
        let store = MockProductStore::new();
        let response = store.list(&ListQuery::default());

        assert_eq!(response.total, SEEDED_PRODUCTS);
        assert_eq!(response.data[0].name, "Product 1");
        assert_eq!(response.data[9].category, "Category 10");
    }

    #[test]
    fn test_logical_clock_advances_per_write() {
        let store = MockProductStore::empty();
        let created = store.create(ProductDraft::new("a", "b", "c"));
        let updated = store.update(created.id, ProductDraft::new("x", "y", "z")).unwrap();

        assert_eq!(created.created_at, epoch() + Duration::seconds(1));
        assert_eq!(updated.updated_at, epoch() + Duration::seconds(2));
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn test_filter_composition() {
        let store = MockProductStore::new();
        let query = ListQuery {
            search: "Product 1".to_string(),
            ..ListQuery::default()
        };

        let names: Vec<String> = store.list(&query).data.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Product 1", "Product 10"]);
    }

    #[test]
    fn test_missing_ids() {
        let store = MockProductStore::new();
        assert_eq!(store.get(999), Err(StoreError::NotFound { id: 999 }));
        assert_eq!(store.delete(999), Err(StoreError::NotFound { id: 999 }));
    }
}
