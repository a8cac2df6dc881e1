use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod cart;
pub mod category;
pub mod product;

/// Partition tag for every stored entity type.
///
/// The display name doubles as the in-memory store partition key and as the
/// type name in not-found errors, so it must stay stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    ProductCategory,
    Cart,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::ProductCategory => "ProductCategory",
            Self::Cart => "Cart",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything a repository can store: identified by a string id that is unique
/// within its kind.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}
