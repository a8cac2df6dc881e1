use chrono::Utc;
use rust_decimal::Decimal;

use myshop_core::domain::category::{CategoryId, ProductCategory};
use myshop_core::domain::product::{Product, ProductId};

use crate::repositories::{RepositoryBackend, RepositoryError};

struct SeedCategory {
    id: &'static str,
    name: &'static str,
}

struct SeedProduct {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    image: &'static str,
    category_id: &'static str,
}

const SEED_CATEGORIES: &[SeedCategory] = &[
    SeedCategory { id: "cat-kitchen", name: "Kitchen" },
    SeedCategory { id: "cat-apparel", name: "Apparel" },
];

/// Deterministic demo catalog. Ids are stable so repeated loads are no-ops.
const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        id: "prod-mug",
        name: "Enamel Mug",
        description: "12oz camp mug",
        price_cents: 1000,
        image: "prod-mug.png",
        category_id: "cat-kitchen",
    },
    SeedProduct {
        id: "prod-tea-towel",
        name: "Tea Towel",
        description: "Linen tea towel",
        price_cents: 500,
        image: "prod-tea-towel.png",
        category_id: "cat-kitchen",
    },
    SeedProduct {
        id: "prod-hoodie",
        name: "Logo Hoodie",
        description: "Heavyweight cotton hoodie",
        price_cents: 4500,
        image: "prod-hoodie.png",
        category_id: "cat-apparel",
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub categories_inserted: usize,
    pub products_inserted: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

/// Demo catalog loaded through the repository layer, so it works against
/// either backend.
pub struct CatalogSeedDataset;

impl CatalogSeedDataset {
    pub async fn load(backend: &RepositoryBackend) -> Result<SeedResult, RepositoryError> {
        let categories = backend.open::<ProductCategory>().await;
        let existing = categories.collection().await?;
        let mut categories_inserted = 0;
        for seed in SEED_CATEGORIES {
            if existing.iter().any(|category| category.id.0 == seed.id) {
                continue;
            }
            categories.insert(seed.to_category()).await?;
            categories_inserted += 1;
        }
        categories.commit().await?;

        let products = backend.open::<Product>().await;
        let existing = products.collection().await?;
        let mut products_inserted = 0;
        for seed in SEED_PRODUCTS {
            if existing.iter().any(|product| product.id.0 == seed.id) {
                continue;
            }
            products.insert(seed.to_product()).await?;
            products_inserted += 1;
        }
        products.commit().await?;

        Ok(SeedResult { categories_inserted, products_inserted })
    }

    pub async fn verify(backend: &RepositoryBackend) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let categories = backend.open::<ProductCategory>().await.collection().await?;
        for seed in SEED_CATEGORIES {
            let present = categories
                .iter()
                .any(|category| category.id.0 == seed.id && category.name == seed.name);
            checks.push((seed.id, present));
        }

        let products = backend.open::<Product>().await.collection().await?;
        for seed in SEED_PRODUCTS {
            let present = products.iter().any(|product| {
                product.id.0 == seed.id
                    && product.price == Decimal::new(seed.price_cents, 2)
                    && product.category_id == seed.category_id
            });
            checks.push((seed.id, present));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    pub fn product_ids() -> impl Iterator<Item = &'static str> {
        SEED_PRODUCTS.iter().map(|seed| seed.id)
    }
}

impl SeedCategory {
    fn to_category(&self) -> ProductCategory {
        ProductCategory {
            id: CategoryId(self.id.to_string()),
            name: self.name.to_string(),
            created_at: Utc::now(),
        }
    }
}

impl SeedProduct {
    fn to_product(&self) -> Product {
        Product {
            id: ProductId(self.id.to_string()),
            name: self.name.to_string(),
            description: self.description.to_string(),
            price: Decimal::new(self.price_cents, 2),
            image: self.image.to_string(),
            category_id: self.category_id.to_string(),
            created_at: Utc::now(),
        }
    }
}
