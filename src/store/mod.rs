//! Product storage.
//!
//! Handlers only see [`ProductStore`]; any implementation can be injected
//! through [`Storage`].

pub mod mocks;
pub mod pagination;
pub mod products;

use std::sync::Arc;

use crate::error::StoreResult;

pub use mocks::MockProductStore;
pub use pagination::{ListQuery, Order, PaginatedResponse};
pub use products::{InMemoryProductStore, Product, ProductDraft};

/// Operations every product store provides. All methods are safe to call
/// concurrently; each one runs under the store's single lock.
pub trait ProductStore: Send + Sync {
    /// Assign the next id, stamp both timestamps and store the product.
    fn create(&self, draft: ProductDraft) -> Product;

    fn get(&self, id: i64) -> StoreResult<Product>;

    /// Replace the mutable fields of an existing product. Never inserts.
    fn update(&self, id: i64, draft: ProductDraft) -> StoreResult<Product>;

    fn delete(&self, id: i64) -> StoreResult<()>;

    /// Filter and window the collection. `next` is left unset.
    fn list(&self, query: &ListQuery) -> PaginatedResponse;
}

/// Storage handles injected into the HTTP layer
#[derive(Clone)]
pub struct Storage {
    pub products: Arc<dyn ProductStore>,
}

impl Storage {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    /// Empty process-memory storage
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryProductStore::new()))
    }

    /// Seeded deterministic storage for tests
    pub fn mock() -> Self {
        Self::new(Arc::new(MockProductStore::new()))
    }
}
