use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use myshop_core::domain::product::{Product, ProductId};

use super::sql::{parse_decimal, parse_timestamp, SqlEntity};
use super::RepositoryError;
use crate::DbPool;

const SELECT_PRODUCT: &str =
    "SELECT id, name, description, price, image, category_id, created_at FROM product";

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let price: String = row.try_get("price")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: parse_decimal("product.price", &price)?,
        image: row.try_get("image")?,
        category_id: row.try_get("category_id")?,
        created_at: parse_timestamp("product.created_at", &created_at)?,
    })
}

#[async_trait]
impl SqlEntity for Product {
    async fn fetch(pool: &DbPool, id: &str) -> Result<Option<Self>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_PRODUCT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn fetch_all(pool: &DbPool) -> Result<Vec<Self>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_PRODUCT} ORDER BY created_at ASC, id ASC"))
            .fetch_all(pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn upsert(conn: &mut SqliteConnection, item: &Self) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, name, description, price, image, category_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 price = excluded.price,
                 image = excluded.image,
                 category_id = excluded.category_id",
        )
        .bind(&item.id.0)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.to_string())
        .bind(&item.image)
        .bind(&item.category_id)
        .bind(item.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    async fn remove(conn: &mut SqliteConnection, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM product WHERE id = ?").bind(id).execute(&mut *conn).await?;
        Ok(())
    }
}
