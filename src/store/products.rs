use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use validator::Validate;

use crate::error::{StoreError, StoreResult};
use crate::store::pagination::{paginate, ListQuery, PaginatedResponse};
use crate::store::ProductStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable product fields, as supplied on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "description must be 1 to 100 characters"))]
    pub description: String,

    #[validate(length(min = 1, max = 50, message = "category must be 1 to 50 characters"))]
    pub category: String,
}

impl ProductDraft {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: category.into(),
        }
    }
}

/// Products in insertion order plus the id sequence.
///
/// Timestamps are passed in so each store decides its own clock.
#[derive(Debug)]
pub(crate) struct ProductCollection {
    products: Vec<Product>,
    next_id: i64,
}

impl Default for ProductCollection {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            next_id: 1,
        }
    }
}

impl ProductCollection {
    pub(crate) fn create(&mut self, draft: ProductDraft, now: DateTime<Utc>) -> Product {
        let product = Product {
            id: self.next_id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.products.push(product.clone());
        product
    }

    pub(crate) fn get(&self, id: i64) -> StoreResult<Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    pub(crate) fn update(
        &mut self,
        id: i64,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound { id })?;

        product.name = draft.name;
        product.description = draft.description;
        product.category = draft.category;
        product.updated_at = now.max(product.updated_at);

        Ok(product.clone())
    }

    pub(crate) fn delete(&mut self, id: i64) -> StoreResult<()> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound { id })?;

        self.products.remove(index);
        Ok(())
    }

    pub(crate) fn list(&self, query: &ListQuery) -> PaginatedResponse {
        paginate(&self.products, query)
    }
}

fn lock_collection(
    collection: &Mutex<ProductCollection>,
) -> MutexGuard<'_, ProductCollection> {
    collection.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-memory product store stamped with the wall clock
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    collection: Mutex<ProductCollection>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for InMemoryProductStore {
    fn create(&self, draft: ProductDraft) -> Product {
        lock_collection(&self.collection).create(draft, Utc::now())
    }

    fn get(&self, id: i64) -> StoreResult<Product> {
        lock_collection(&self.collection).get(id)
    }

    fn update(&self, id: i64, draft: ProductDraft) -> StoreResult<Product> {
        lock_collection(&self.collection).update(id, draft, Utc::now())
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        lock_collection(&self.collection).delete(id)
    }

    fn list(&self, query: &ListQuery) -> PaginatedResponse {
        lock_collection(&self.collection).list(query)
    }
}
