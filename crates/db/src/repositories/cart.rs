use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use myshop_core::domain::cart::{Cart, CartId, CartItem, CartItemId};
use myshop_core::domain::product::ProductId;

use super::sql::{parse_timestamp, SqlEntity};
use super::RepositoryError;
use crate::DbPool;

const SELECT_ITEMS: &str =
    "SELECT id, cart_id, product_id, quantity, created_at FROM cart_item";

fn row_to_item(row: &SqliteRow) -> Result<CartItem, RepositoryError> {
    let quantity: i64 = row.try_get("quantity")?;
    let created_at: String = row.try_get("created_at")?;
    let quantity = u32::try_from(quantity)
        .map_err(|_| RepositoryError::Decode(format!("cart_item.quantity: {quantity}")))?;

    let item = CartItem {
        id: CartItemId(row.try_get("id")?),
        cart_id: CartId(row.try_get("cart_id")?),
        product_id: ProductId(row.try_get("product_id")?),
        quantity,
        created_at: parse_timestamp("cart_item.created_at", &created_at)?,
    };
    item.ensure_valid().map_err(|error| RepositoryError::Decode(error.to_string()))?;
    Ok(item)
}

fn row_to_cart(row: &SqliteRow, items: Vec<CartItem>) -> Result<Cart, RepositoryError> {
    let created_at: String = row.try_get("created_at")?;

    Ok(Cart {
        id: CartId(row.try_get("id")?),
        items,
        created_at: parse_timestamp("cart.created_at", &created_at)?,
    })
}

#[async_trait]
impl SqlEntity for Cart {
    async fn fetch(pool: &DbPool, id: &str) -> Result<Option<Self>, RepositoryError> {
        let Some(row) = sqlx::query("SELECT id, created_at FROM cart WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let item_rows = sqlx::query(&format!("{SELECT_ITEMS} WHERE cart_id = ? ORDER BY position"))
            .bind(id)
            .fetch_all(pool)
            .await?;
        let items = item_rows.iter().map(row_to_item).collect::<Result<Vec<_>, _>>()?;

        row_to_cart(&row, items).map(Some)
    }

    async fn fetch_all(pool: &DbPool) -> Result<Vec<Self>, RepositoryError> {
        let cart_rows = sqlx::query("SELECT id, created_at FROM cart ORDER BY created_at ASC, id ASC")
            .fetch_all(pool)
            .await?;
        let item_rows = sqlx::query(&format!("{SELECT_ITEMS} ORDER BY cart_id, position"))
            .fetch_all(pool)
            .await?;

        let mut items_by_cart: HashMap<String, Vec<CartItem>> = HashMap::new();
        for row in &item_rows {
            let item = row_to_item(row)?;
            items_by_cart.entry(item.cart_id.0.clone()).or_default().push(item);
        }

        cart_rows
            .iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                row_to_cart(row, items_by_cart.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn upsert(conn: &mut SqliteConnection, item: &Self) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO cart (id, created_at) VALUES (?, ?) ON CONFLICT(id) DO NOTHING")
            .bind(&item.id.0)
            .bind(item.created_at.to_rfc3339())
            .execute(&mut *conn)
            .await?;

        // Items are owned by the cart row: rewrite them to match the aggregate.
        sqlx::query("DELETE FROM cart_item WHERE cart_id = ?")
            .bind(&item.id.0)
            .execute(&mut *conn)
            .await?;

        for (position, line) in item.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cart_item (id, cart_id, product_id, quantity, position, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&line.id.0)
            .bind(&item.id.0)
            .bind(&line.product_id.0)
            .bind(i64::from(line.quantity))
            .bind(position as i64)
            .bind(line.created_at.to_rfc3339())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    async fn remove(conn: &mut SqliteConnection, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_item WHERE cart_id = ?").bind(id).execute(&mut *conn).await?;
        sqlx::query("DELETE FROM cart WHERE id = ?").bind(id).execute(&mut *conn).await?;
        Ok(())
    }
}
