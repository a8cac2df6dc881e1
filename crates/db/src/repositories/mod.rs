use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use myshop_core::domain::{Entity, EntityKind};
use myshop_core::errors::ApplicationError;

use crate::DbPool;

pub mod cart;
pub mod category;
pub mod memory;
pub mod product;
pub mod sql;

pub use memory::{InMemoryRepository, MemoryBacked, MemoryStore};
pub use sql::{SqlEntity, SqlRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{kind} not found!")]
    NotFound { kind: EntityKind },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    pub fn not_found<T: Entity>() -> Self {
        Self::NotFound { kind: T::KIND }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound { kind } => Self::NotFound(kind.to_string()),
            RepositoryError::Database(error) => Self::Persistence(error.to_string()),
            RepositoryError::Decode(message) => Self::Persistence(message),
        }
    }
}

/// Generic store for one entity kind.
///
/// Mutations are staged until [`Repository::commit`] flushes them to the
/// backing store. Reads observe the repository's own staged changes.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Stages `item`. Ids are not checked for uniqueness.
    async fn insert(&self, item: T) -> Result<(), RepositoryError>;

    /// Replaces the stored item carrying the same id.
    async fn update(&self, item: T) -> Result<(), RepositoryError>;

    async fn find(&self, id: &str) -> Result<T, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    /// Snapshot of every item, used for caller-side joins.
    async fn collection(&self) -> Result<Vec<T>, RepositoryError>;

    async fn commit(&self) -> Result<(), RepositoryError>;
}

/// Where repositories get their data from. Cheap to clone; every call to
/// [`RepositoryBackend::open`] yields a fresh unit of work.
#[derive(Clone)]
pub enum RepositoryBackend {
    InMemory(Arc<MemoryStore>),
    Sql(DbPool),
}

impl RepositoryBackend {
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(MemoryStore::default()))
    }

    pub async fn open<T>(&self) -> Arc<dyn Repository<T>>
    where
        T: MemoryBacked + SqlEntity,
    {
        match self {
            Self::InMemory(store) => Arc::new(InMemoryRepository::<T>::load(store.clone()).await),
            Self::Sql(pool) => Arc::new(SqlRepository::<T>::new(pool.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InMemory(_) => "memory",
            Self::Sql(_) => "sql",
        }
    }

    pub fn pool(&self) -> Option<&DbPool> {
        match self {
            Self::InMemory(_) => None,
            Self::Sql(pool) => Some(pool),
        }
    }
}
