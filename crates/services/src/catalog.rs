use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use myshop_core::domain::category::ProductCategory;
use myshop_core::domain::new_entity_id;
use myshop_core::domain::product::{Product, ProductId};
use myshop_core::errors::{ApplicationError, DomainError};
use myshop_db::{Repository, RepositoryBackend, RepositoryError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Invalid(error) => Self::Domain(error),
            CatalogError::Repository(error) => error.into(),
        }
    }
}

/// Client-supplied product fields for create and update.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category_id: String,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidField {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::InvalidField {
                field: "price",
                reason: format!("must not be negative, got {}", self.price),
            });
        }
        Ok(())
    }

    fn apply(self, product: &mut Product) {
        product.name = self.name;
        product.description = self.description;
        product.price = self.price;
        product.image = self.image;
        product.category_id = self.category_id;
    }
}

/// Product and category administration. Every mutation commits before
/// returning.
pub struct CatalogService {
    products: Arc<dyn Repository<Product>>,
    categories: Arc<dyn Repository<ProductCategory>>,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn Repository<Product>>,
        categories: Arc<dyn Repository<ProductCategory>>,
    ) -> Self {
        Self { products, categories }
    }

    pub async fn open(backend: &RepositoryBackend) -> Self {
        Self::new(backend.open::<Product>().await, backend.open::<ProductCategory>().await)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.collection().await?)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, CatalogError> {
        Ok(self.products.find(id).await?)
    }

    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, CatalogError> {
        draft.validate()?;
        self.ensure_category(&draft.category_id).await?;

        let mut product = Product {
            id: ProductId(new_entity_id()),
            name: String::new(),
            description: String::new(),
            price: Decimal::ZERO,
            image: String::new(),
            category_id: String::new(),
            created_at: Utc::now(),
        };
        draft.apply(&mut product);

        self.products.insert(product.clone()).await?;
        self.products.commit().await?;

        info!(
            event_name = "catalog.product.created",
            product_id = %product.id.0,
            price = %product.price,
            "product created"
        );
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, draft: ProductDraft) -> Result<Product, CatalogError> {
        draft.validate()?;
        let mut product = self.products.find(id).await?;
        self.ensure_category(&draft.category_id).await?;

        draft.apply(&mut product);
        self.products.update(product.clone()).await?;
        self.products.commit().await?;

        info!(event_name = "catalog.product.updated", product_id = %product.id.0, "product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), CatalogError> {
        self.products.delete(id).await?;
        self.products.commit().await?;

        info!(event_name = "catalog.product.deleted", product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<ProductCategory>, CatalogError> {
        Ok(self.categories.collection().await?)
    }

    pub async fn create_category(&self, name: &str) -> Result<ProductCategory, CatalogError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidField {
                field: "name",
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        let category = ProductCategory::new(name.trim());
        self.categories.insert(category.clone()).await?;
        self.categories.commit().await?;

        info!(
            event_name = "catalog.category.created",
            category_id = %category.id.0,
            "category created"
        );
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), CatalogError> {
        self.categories.delete(id).await?;
        self.categories.commit().await?;

        info!(event_name = "catalog.category.deleted", category_id = %id, "category deleted");
        Ok(())
    }

    // An empty category id leaves the product uncategorised.
    async fn ensure_category(&self, category_id: &str) -> Result<(), CatalogError> {
        if category_id.is_empty() {
            return Ok(());
        }
        self.categories.find(category_id).await?;
        Ok(())
    }
}
