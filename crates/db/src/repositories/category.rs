use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use myshop_core::domain::category::{CategoryId, ProductCategory};

use super::sql::{parse_timestamp, SqlEntity};
use super::RepositoryError;
use crate::DbPool;

fn row_to_category(row: &SqliteRow) -> Result<ProductCategory, RepositoryError> {
    let created_at: String = row.try_get("created_at")?;

    Ok(ProductCategory {
        id: CategoryId(row.try_get("id")?),
        name: row.try_get("name")?,
        created_at: parse_timestamp("product_category.created_at", &created_at)?,
    })
}

#[async_trait]
impl SqlEntity for ProductCategory {
    async fn fetch(pool: &DbPool, id: &str) -> Result<Option<Self>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM product_category WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(row_to_category).transpose()
    }

    async fn fetch_all(pool: &DbPool) -> Result<Vec<Self>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, created_at FROM product_category ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(pool)
        .await?;

        rows.iter().map(row_to_category).collect()
    }

    async fn upsert(conn: &mut SqliteConnection, item: &Self) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product_category (id, name, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(&item.id.0)
        .bind(&item.name)
        .bind(item.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    async fn remove(conn: &mut SqliteConnection, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM product_category WHERE id = ?").bind(id).execute(&mut *conn).await?;
        Ok(())
    }
}
