use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tokio::sync::Mutex;
use tracing::debug;

use myshop_core::domain::Entity;

use super::{Repository, RepositoryError};
use crate::DbPool;

/// Table mapping for an entity kind stored in SQLite.
#[async_trait]
pub trait SqlEntity: Entity + Sized {
    async fn fetch(pool: &DbPool, id: &str) -> Result<Option<Self>, RepositoryError>;

    async fn fetch_all(pool: &DbPool) -> Result<Vec<Self>, RepositoryError>;

    async fn upsert(conn: &mut SqliteConnection, item: &Self) -> Result<(), RepositoryError>;

    async fn remove(conn: &mut SqliteConnection, id: &str) -> Result<(), RepositoryError>;
}

enum PendingWrite<T> {
    Upsert(T),
    Delete(String),
}

impl<T: Entity> PendingWrite<T> {
    fn id(&self) -> &str {
        match self {
            Self::Upsert(item) => item.id(),
            Self::Delete(id) => id,
        }
    }
}

/// SQL-backed repository. Writes are queued in call order and applied in a
/// single transaction on `commit`; reads overlay the queue on committed rows.
pub struct SqlRepository<T: SqlEntity> {
    pool: DbPool,
    pending: Mutex<Vec<PendingWrite<T>>>,
}

impl<T: SqlEntity> SqlRepository<T> {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, pending: Mutex::new(Vec::new()) }
    }

    async fn lookup(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        {
            let pending = self.pending.lock().await;
            if let Some(write) = pending.iter().rev().find(|write| write.id() == id) {
                return Ok(match write {
                    PendingWrite::Upsert(item) => Some(item.clone()),
                    PendingWrite::Delete(_) => None,
                });
            }
        }
        T::fetch(&self.pool, id).await
    }
}

#[async_trait]
impl<T: SqlEntity> Repository<T> for SqlRepository<T> {
    async fn insert(&self, item: T) -> Result<(), RepositoryError> {
        self.pending.lock().await.push(PendingWrite::Upsert(item));
        Ok(())
    }

    async fn update(&self, item: T) -> Result<(), RepositoryError> {
        if self.lookup(item.id()).await?.is_none() {
            return Err(RepositoryError::not_found::<T>());
        }
        self.pending.lock().await.push(PendingWrite::Upsert(item));
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<T, RepositoryError> {
        self.lookup(id).await?.ok_or_else(RepositoryError::not_found::<T>)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        if self.lookup(id).await?.is_none() {
            return Err(RepositoryError::not_found::<T>());
        }
        self.pending.lock().await.push(PendingWrite::Delete(id.to_string()));
        Ok(())
    }

    async fn collection(&self) -> Result<Vec<T>, RepositoryError> {
        let mut items = T::fetch_all(&self.pool).await?;
        let pending = self.pending.lock().await;
        for write in pending.iter() {
            match write {
                PendingWrite::Upsert(item) => {
                    match items.iter_mut().find(|existing| existing.id() == item.id()) {
                        Some(existing) => *existing = item.clone(),
                        None => items.push(item.clone()),
                    }
                }
                PendingWrite::Delete(id) => items.retain(|existing| existing.id() != id),
            }
        }
        Ok(items)
    }

    async fn commit(&self) -> Result<(), RepositoryError> {
        let mut pending = self.pending.lock().await;
        if pending.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for write in pending.iter() {
            match write {
                PendingWrite::Upsert(item) => T::upsert(&mut *tx, item).await?,
                PendingWrite::Delete(id) => T::remove(&mut *tx, id).await?,
            }
        }
        tx.commit().await?;

        debug!(
            event_name = "repository.commit",
            backend = "sql",
            kind = %T::KIND,
            writes = pending.len(),
            "pending writes committed"
        );
        pending.clear();
        Ok(())
    }
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{field}: {error}")))
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|error| RepositoryError::Decode(format!("{field}: {error}")))
}
