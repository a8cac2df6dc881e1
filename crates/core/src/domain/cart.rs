use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::domain::{new_entity_id, Entity, EntityKind};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItemId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(cart_id: CartId, product_id: ProductId) -> Self {
        Self {
            id: CartItemId(new_entity_id()),
            cart_id,
            product_id,
            quantity: 1,
            created_at: Utc::now(),
        }
    }

    pub fn ensure_valid(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::InvariantViolation(format!(
                "cart item {} has zero quantity",
                self.id.0
            )));
        }
        Ok(())
    }
}

/// A session-scoped list of line items, kept in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Self { id: CartId(new_entity_id()), items: Vec::new(), created_at: Utc::now() }
    }

    pub fn item_for_product(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Adds one unit of `product_id`, bumping the existing line instead of
    /// creating a duplicate. Returns the resulting line.
    pub fn add_product(&mut self, product_id: &ProductId) -> &CartItem {
        let position = self.items.iter().position(|item| &item.product_id == product_id);
        let index = match position {
            Some(index) => {
                self.items[index].quantity += 1;
                index
            }
            None => {
                self.items.push(CartItem::new(self.id.clone(), product_id.clone()));
                self.items.len() - 1
            }
        };
        &self.items[index]
    }

    pub fn remove_item(&mut self, item_id: &str) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.id.0 == item_id)?;
        Some(self.items.remove(index))
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

impl Entity for Cart {
    const KIND: EntityKind = EntityKind::Cart;

    fn id(&self) -> &str {
        &self.id.0
    }
}
