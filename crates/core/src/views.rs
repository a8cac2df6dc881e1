//! Display-ready projections built by joining carts with the product catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::cart::CartItemId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub quantity: u32,
    pub product_name: String,
    pub price: Decimal,
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub cart_count: u32,
    pub cart_total: Decimal,
}

impl CartSummary {
    pub fn empty() -> Self {
        Self { cart_count: 0, cart_total: Decimal::ZERO }
    }
}

impl Default for CartSummary {
    fn default() -> Self {
        Self::empty()
    }
}
