use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use myshop_core::domain::cart::Cart;
use myshop_core::domain::category::ProductCategory;
use myshop_core::domain::product::Product;
use myshop_core::domain::Entity;

use super::{Repository, RepositoryError};

/// Process-lifetime store holding one named collection per entity kind.
///
/// Collections are never evicted or bounded. Each collection is lock
/// protected, but a repository's load/mutate/commit cycle is not atomic:
/// two repositories committing the same kind race and the last commit wins.
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
    categories: RwLock<Vec<ProductCategory>>,
    carts: RwLock<Vec<Cart>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot<T: MemoryBacked>(&self) -> Vec<T> {
        T::partition(self).read().await.clone()
    }

    pub async fn replace<T: MemoryBacked>(&self, items: Vec<T>) {
        *T::partition(self).write().await = items;
    }

    pub async fn count<T: MemoryBacked>(&self) -> usize {
        T::partition(self).read().await.len()
    }
}

/// Maps an entity type to its collection inside [`MemoryStore`].
pub trait MemoryBacked: Entity {
    fn partition(store: &MemoryStore) -> &RwLock<Vec<Self>>;
}

impl MemoryBacked for Product {
    fn partition(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.products
    }
}

impl MemoryBacked for ProductCategory {
    fn partition(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.categories
    }
}

impl MemoryBacked for Cart {
    fn partition(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.carts
    }
}

/// Works on a private copy of the store's collection taken at load time;
/// `commit` writes the copy back.
pub struct InMemoryRepository<T: MemoryBacked> {
    store: Arc<MemoryStore>,
    items: RwLock<Vec<T>>,
}

impl<T: MemoryBacked> InMemoryRepository<T> {
    pub async fn load(store: Arc<MemoryStore>) -> Self {
        let items = store.snapshot::<T>().await;
        Self { store, items: RwLock::new(items) }
    }
}

#[async_trait::async_trait]
impl<T: MemoryBacked> Repository<T> for InMemoryRepository<T> {
    async fn insert(&self, item: T) -> Result<(), RepositoryError> {
        self.items.write().await.push(item);
        Ok(())
    }

    async fn update(&self, item: T) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|existing| existing.id() == item.id())
            .ok_or_else(RepositoryError::not_found::<T>)?;
        *slot = item;
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<T, RepositoryError> {
        let items = self.items.read().await;
        items.iter().find(|item| item.id() == id).cloned().ok_or_else(RepositoryError::not_found::<T>)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        let index = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(RepositoryError::not_found::<T>)?;
        items.remove(index);
        Ok(())
    }

    async fn collection(&self) -> Result<Vec<T>, RepositoryError> {
        Ok(self.items.read().await.clone())
    }

    async fn commit(&self) -> Result<(), RepositoryError> {
        let items = self.items.read().await.clone();
        debug!(
            event_name = "repository.commit",
            backend = "memory",
            kind = %T::KIND,
            items = items.len(),
            "in-memory collection committed"
        );
        self.store.replace(items).await;
        Ok(())
    }
}
