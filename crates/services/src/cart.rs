use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use myshop_core::domain::cart::Cart;
use myshop_core::domain::product::{Product, ProductId};
use myshop_core::errors::ApplicationError;
use myshop_core::views::{CartItemView, CartSummary};
use myshop_db::{Repository, RepositoryBackend, RepositoryError};

use crate::session::{self, SessionError, SessionGrant, SessionPolicy};

#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<CartServiceError> for ApplicationError {
    fn from(value: CartServiceError) -> Self {
        match value {
            CartServiceError::Repository(error) => error.into(),
            CartServiceError::Session(error) => Self::Configuration(error.to_string()),
        }
    }
}

/// Outcome of resolving the caller's cart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCart {
    pub cart: Cart,
    /// False for the empty placeholder returned when no cart exists and
    /// creation was not requested.
    pub persisted: bool,
    /// Set only when a new cart was created.
    pub grant: Option<SessionGrant>,
}

/// Shopping cart bound to a client-carried session token.
pub struct CartService {
    products: Arc<dyn Repository<Product>>,
    carts: Arc<dyn Repository<Cart>>,
    policy: SessionPolicy,
}

impl CartService {
    pub fn new(
        products: Arc<dyn Repository<Product>>,
        carts: Arc<dyn Repository<Cart>>,
        policy: SessionPolicy,
    ) -> Self {
        Self { products, carts, policy }
    }

    /// Opens fresh repositories on `backend` for one unit of work.
    pub async fn open(backend: &RepositoryBackend, policy: SessionPolicy) -> Self {
        Self::new(backend.open::<Product>().await, backend.open::<Cart>().await, policy)
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Resolves the cart named by `session`.
    ///
    /// A token that no longer names a stored cart fails with `NotFound`.
    /// Without a token, a new cart is created and committed when
    /// `create_if_missing` is set; otherwise an empty placeholder is returned
    /// and nothing is written.
    pub async fn get_cart(
        &self,
        session: Option<&str>,
        create_if_missing: bool,
    ) -> Result<ResolvedCart, CartServiceError> {
        if let Some(cart_id) = session::token(session) {
            let cart = self.carts.find(cart_id).await?;
            return Ok(ResolvedCart { cart, persisted: true, grant: None });
        }

        if create_if_missing {
            return self.create_cart().await;
        }

        Ok(ResolvedCart { cart: Cart::new(), persisted: false, grant: None })
    }

    async fn create_cart(&self) -> Result<ResolvedCart, CartServiceError> {
        let cart = Cart::new();
        let grant = self.policy.grant(cart.id.0.clone(), Utc::now())?;
        self.carts.insert(cart.clone()).await?;
        self.carts.commit().await?;

        info!(
            event_name = "cart.created",
            cart_id = %cart.id.0,
            expires_at = %grant.expires_at,
            "new cart created"
        );

        Ok(ResolvedCart { cart, persisted: true, grant: Some(grant) })
    }

    /// Adds one unit of `product_id`. Returns a grant when a cart had to be
    /// created for this call.
    pub async fn add_to_cart(
        &self,
        session: Option<&str>,
        product_id: &ProductId,
    ) -> Result<Option<SessionGrant>, CartServiceError> {
        let ResolvedCart { mut cart, grant, .. } = self.get_cart(session, true).await?;

        let quantity = cart.add_product(product_id).quantity;
        self.carts.update(cart.clone()).await?;
        self.carts.commit().await?;

        info!(
            event_name = "cart.item.added",
            cart_id = %cart.id.0,
            product_id = %product_id.0,
            quantity,
            "product added to cart"
        );

        Ok(grant)
    }

    /// Removes a line by item id. Missing cart or item is a silent no-op.
    pub async fn remove_from_cart(
        &self,
        session: Option<&str>,
        item_id: &str,
    ) -> Result<(), CartServiceError> {
        let ResolvedCart { mut cart, persisted, .. } = self.get_cart(session, false).await?;
        if !persisted {
            return Ok(());
        }

        let Some(removed) = cart.remove_item(item_id) else {
            debug!(
                event_name = "cart.item.remove_skipped",
                cart_id = %cart.id.0,
                item_id = %item_id,
                "cart item not present"
            );
            return Ok(());
        };

        self.carts.update(cart.clone()).await?;
        self.carts.commit().await?;

        info!(
            event_name = "cart.item.removed",
            cart_id = %cart.id.0,
            item_id = %item_id,
            product_id = %removed.product_id.0,
            "cart item removed"
        );
        Ok(())
    }

    /// Cart lines joined to the catalog, in cart order. Lines whose product
    /// is missing from the catalog are dropped.
    pub async fn cart_items(
        &self,
        session: Option<&str>,
    ) -> Result<Vec<CartItemView>, CartServiceError> {
        let ResolvedCart { cart, .. } = self.get_cart(session, false).await?;
        if cart.items.is_empty() {
            return Ok(Vec::new());
        }

        let products = self.products.collection().await?;
        let catalog = index_by_id(&products);

        let views = cart
            .items
            .iter()
            .flat_map(|item| {
                catalog.get(item.product_id.0.as_str()).into_iter().flatten().map(move |product| {
                    CartItemView {
                        id: item.id.clone(),
                        quantity: item.quantity,
                        product_name: product.name.clone(),
                        price: product.price,
                        image: product.image.clone(),
                    }
                })
            })
            .collect();

        Ok(views)
    }

    /// Item count over every line; total over lines with a catalog match.
    pub async fn cart_summary(&self, session: Option<&str>) -> Result<CartSummary, CartServiceError> {
        let ResolvedCart { cart, .. } = self.get_cart(session, false).await?;
        if cart.items.is_empty() {
            return Ok(CartSummary::empty());
        }

        let products = self.products.collection().await?;
        let catalog = index_by_id(&products);

        let cart_total = cart
            .items
            .iter()
            .flat_map(|item| {
                catalog
                    .get(item.product_id.0.as_str())
                    .into_iter()
                    .flatten()
                    .map(move |product| Decimal::from(item.quantity) * product.price)
            })
            .sum();

        Ok(CartSummary { cart_count: cart.item_count(), cart_total })
    }
}

// Inner-join semantics: every product sharing an id matches.
fn index_by_id(products: &[Product]) -> HashMap<&str, Vec<&Product>> {
    let mut index: HashMap<&str, Vec<&Product>> = HashMap::new();
    for product in products {
        index.entry(product.id.0.as_str()).or_default().push(product);
    }
    index
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use myshop_core::domain::cart::Cart;
    use myshop_core::domain::product::{Product, ProductId};
    use myshop_db::{
        connect_with_settings, migrations, InMemoryRepository, MemoryStore, Repository,
        RepositoryBackend,
    };
    use rust_decimal::Decimal;

    use super::{CartService, CartServiceError};
    use crate::session::SessionPolicy;

    fn product(id: &str, name: &str, cents: i64) -> Product {
        let mut product = Product::new(name, Decimal::new(cents, 2));
        product.id = ProductId(id.to_string());
        product.image = format!("{id}.png");
        product
    }

    async fn backend_with_products(products: &[Product]) -> RepositoryBackend {
        let backend = RepositoryBackend::in_memory();
        let repo = backend.open::<Product>().await;
        for product in products {
            repo.insert(product.clone()).await.expect("insert product");
        }
        repo.commit().await.expect("commit products");
        backend
    }

    async fn service(backend: &RepositoryBackend) -> CartService {
        CartService::open(backend, SessionPolicy::default()).await
    }

    #[tokio::test]
    async fn add_to_cart_creates_cart_and_issues_one_day_grant() {
        let backend = backend_with_products(&[product("p-1", "Mug", 1000)]).await;
        let before = Utc::now();

        let grant = service(&backend)
            .await
            .add_to_cart(None, &ProductId("p-1".to_string()))
            .await
            .expect("add")
            .expect("new cart should issue a grant");

        assert_eq!(grant.name, "eCommerceCart");
        assert!(grant.expires_at >= before + Duration::days(1));
        assert!(grant.expires_at <= Utc::now() + Duration::days(1));

        let carts = backend.open::<Cart>().await;
        let stored = carts.find(&grant.token).await.expect("cart persisted");
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn overflowing_session_expiry_fails_before_any_cart_is_stored() {
        let backend = backend_with_products(&[product("p-1", "Mug", 1000)]).await;
        let policy = SessionPolicy { ttl: Duration::MAX, ..SessionPolicy::default() };

        let error = CartService::open(&backend, policy)
            .await
            .add_to_cart(None, &ProductId("p-1".to_string()))
            .await
            .expect_err("expiry overflow should fail");

        assert!(matches!(error, CartServiceError::Session(_)));
        let carts = backend.open::<Cart>().await;
        assert!(carts.collection().await.expect("collection").is_empty());
    }

    #[tokio::test]
    async fn adding_same_product_twice_yields_single_line_with_quantity_two() {
        let backend = backend_with_products(&[product("p-1", "Mug", 1000)]).await;
        let product_id = ProductId("p-1".to_string());

        let grant =
            service(&backend).await.add_to_cart(None, &product_id).await.expect("add").expect("grant");
        let second = service(&backend)
            .await
            .add_to_cart(Some(&grant.token), &product_id)
            .await
            .expect("add again");
        assert!(second.is_none(), "existing cart must not issue a new grant");

        let items = service(&backend).await.cart_items(Some(&grant.token)).await.expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].product_name, "Mug");
        assert_eq!(items[0].image, "p-1.png");
    }

    #[tokio::test]
    async fn summary_sums_quantity_times_price() {
        let backend =
            backend_with_products(&[product("p-10", "Mug", 1000), product("p-5", "Towel", 500)])
                .await;
        let cart_service = service(&backend).await;

        let grant = cart_service
            .add_to_cart(None, &ProductId("p-10".to_string()))
            .await
            .expect("add")
            .expect("grant");
        let session = Some(grant.token.as_str());
        cart_service.add_to_cart(session, &ProductId("p-10".to_string())).await.expect("add");
        cart_service.add_to_cart(session, &ProductId("p-5".to_string())).await.expect("add");

        let summary = cart_service.cart_summary(session).await.expect("summary");
        assert_eq!(summary.cart_count, 3);
        assert_eq!(summary.cart_total, Decimal::new(2500, 2));
    }

    #[tokio::test]
    async fn items_view_drops_lines_with_missing_products() {
        let backend = backend_with_products(&[product("p-1", "Mug", 1000)]).await;
        let cart_service = service(&backend).await;

        let grant = cart_service
            .add_to_cart(None, &ProductId("p-1".to_string()))
            .await
            .expect("add")
            .expect("grant");
        let session = Some(grant.token.as_str());
        cart_service.add_to_cart(session, &ProductId("ghost".to_string())).await.expect("add");

        let items = cart_service.cart_items(session).await.expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Mug");

        let summary = cart_service.cart_summary(session).await.expect("summary");
        assert_eq!(summary.cart_count, 2, "count covers every line");
        assert_eq!(summary.cart_total, Decimal::new(1000, 2), "total covers matched lines only");
    }

    #[tokio::test]
    async fn remove_with_unknown_item_is_a_no_op() {
        let backend = backend_with_products(&[product("p-1", "Mug", 1000)]).await;
        let cart_service = service(&backend).await;
        let grant = cart_service
            .add_to_cart(None, &ProductId("p-1".to_string()))
            .await
            .expect("add")
            .expect("grant");
        let session = Some(grant.token.as_str());

        cart_service.remove_from_cart(session, "no-such-item").await.expect("no-op");
        cart_service.remove_from_cart(None, "no-such-item").await.expect("no-op without cart");

        let stored = backend.open::<Cart>().await.find(&grant.token).await.expect("cart");
        assert_eq!(stored.items.len(), 1);
        assert_eq!(backend.open::<Cart>().await.collection().await.expect("carts").len(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_the_line_and_commits() {
        let backend = backend_with_products(&[product("p-1", "Mug", 1000)]).await;
        let cart_service = service(&backend).await;
        let grant = cart_service
            .add_to_cart(None, &ProductId("p-1".to_string()))
            .await
            .expect("add")
            .expect("grant");
        let session = Some(grant.token.as_str());
        let item_id = cart_service.cart_items(session).await.expect("items")[0].id.0.clone();

        cart_service.remove_from_cart(session, &item_id).await.expect("remove");

        let fresh = service(&backend).await;
        assert!(fresh.cart_items(session).await.expect("items").is_empty());
        assert_eq!(fresh.cart_summary(session).await.expect("summary").cart_count, 0);
    }

    #[tokio::test]
    async fn get_cart_without_session_does_not_insert() {
        let store = Arc::new(MemoryStore::new());
        let backend = RepositoryBackend::InMemory(store.clone());
        let cart_service = service(&backend).await;

        let resolved = cart_service.get_cart(None, false).await.expect("resolve");
        assert!(!resolved.persisted);
        assert!(resolved.grant.is_none());
        assert!(resolved.cart.items.is_empty());
        assert_eq!(store.count::<Cart>().await, 0);

        let resolved = cart_service.get_cart(Some(""), false).await.expect("resolve empty token");
        assert!(!resolved.persisted);
        assert_eq!(store.count::<Cart>().await, 0);

        let summary = cart_service.cart_summary(None).await.expect("summary");
        assert_eq!(summary.cart_count, 0);
        assert_eq!(summary.cart_total, Decimal::ZERO);
        assert!(cart_service.cart_items(None).await.expect("items").is_empty());
    }

    #[tokio::test]
    async fn stale_session_token_surfaces_not_found() {
        let backend = backend_with_products(&[]).await;
        let cart_service = service(&backend).await;

        let error = cart_service.cart_summary(Some("deleted-cart")).await.expect_err("stale");
        assert!(matches!(error, CartServiceError::Repository(ref inner) if inner.is_not_found()));
        assert_eq!(error.to_string(), "Cart not found!");

        assert!(cart_service
            .add_to_cart(Some("deleted-cart"), &ProductId("p-1".to_string()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn service_accepts_explicit_repositories() {
        let store = Arc::new(MemoryStore::new());
        let products: Arc<dyn Repository<Product>> =
            Arc::new(InMemoryRepository::<Product>::load(store.clone()).await);
        let carts: Arc<dyn Repository<Cart>> =
            Arc::new(InMemoryRepository::<Cart>::load(store.clone()).await);
        products.insert(product("p-1", "Mug", 1000)).await.expect("insert");

        let cart_service = CartService::new(products, carts, SessionPolicy::default());
        let grant = cart_service
            .add_to_cart(None, &ProductId("p-1".to_string()))
            .await
            .expect("add")
            .expect("grant");

        // the product repository shares this unit of work, so its uncommitted insert joins
        let items = cart_service.cart_items(Some(&grant.token)).await.expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(store.count::<Cart>().await, 1);
        assert_eq!(store.count::<Product>().await, 0);
    }

    #[tokio::test]
    async fn cart_flow_runs_against_sql_backend() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let backend = RepositoryBackend::Sql(pool.clone());

        let products = backend.open::<Product>().await;
        products.insert(product("p-10", "Mug", 1000)).await.expect("insert");
        products.insert(product("p-5", "Towel", 500)).await.expect("insert");
        products.commit().await.expect("commit");

        let grant = service(&backend)
            .await
            .add_to_cart(None, &ProductId("p-10".to_string()))
            .await
            .expect("add")
            .expect("grant");
        let session = Some(grant.token.as_str());
        service(&backend).await.add_to_cart(session, &ProductId("p-10".to_string())).await.expect("add");
        service(&backend).await.add_to_cart(session, &ProductId("p-5".to_string())).await.expect("add");

        let summary = service(&backend).await.cart_summary(session).await.expect("summary");
        assert_eq!(summary.cart_count, 3);
        assert_eq!(summary.cart_total, Decimal::new(2500, 2));

        let items = service(&backend).await.cart_items(session).await.expect("items");
        let names: Vec<&str> = items.iter().map(|item| item.product_name.as_str()).collect();
        assert_eq!(names, vec!["Mug", "Towel"]);

        pool.close().await;
    }
}
