pub mod config;
pub mod domain;
pub mod errors;
pub mod views;

pub use domain::cart::{Cart, CartId, CartItem, CartItemId};
pub use domain::category::{CategoryId, ProductCategory};
pub use domain::product::{Product, ProductId};
pub use domain::{Entity, EntityKind};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use views::{CartItemView, CartSummary};
