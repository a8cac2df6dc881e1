use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{new_entity_id, Entity, EntityKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl ProductCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: CategoryId(new_entity_id()), name: name.into(), created_at: Utc::now() }
    }
}

impl Entity for ProductCategory {
    const KIND: EntityKind = EntityKind::ProductCategory;

    fn id(&self) -> &str {
        &self.id.0
    }
}
