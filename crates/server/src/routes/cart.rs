use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use myshop_core::domain::product::ProductId;
use myshop_core::errors::ApplicationError;
use myshop_core::views::{CartItemView, CartSummary};
use myshop_services::{CartService, SessionGrant};
use serde::Serialize;
use time::OffsetDateTime;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemView>,
    pub summary: CartSummary,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(show_cart))
        .route("/cart/summary", get(show_summary))
        .route("/cart/items/{id}", post(add_item).delete(remove_item))
}

fn session_token(jar: &CookieJar, state: &AppState) -> Option<String> {
    jar.get(&state.policy.name).map(|cookie| cookie.value().to_owned())
}

/// Cookie carrying a freshly issued cart token.
fn session_cookie(grant: &SessionGrant) -> Result<Cookie<'static>, ApplicationError> {
    let expires = OffsetDateTime::from_unix_timestamp(grant.expires_at.timestamp()).map_err(
        |error| ApplicationError::Configuration(format!("cart cookie expiry: {error}")),
    )?;
    Ok(Cookie::build((grant.name.clone(), grant.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .expires(expires)
        .build())
}

async fn show_cart(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<CartResponse>, ApiError> {
    let session = session_token(&jar, &state);
    let service = CartService::open(&state.backend, state.policy.clone()).await;

    let items = service.cart_items(session.as_deref()).await?;
    let summary = service.cart_summary(session.as_deref()).await?;
    Ok(Json(CartResponse { items, summary }))
}

async fn show_summary(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<CartSummary>, ApiError> {
    let session = session_token(&jar, &state);
    let service = CartService::open(&state.backend, state.policy.clone()).await;

    Ok(Json(service.cart_summary(session.as_deref()).await?))
}

async fn add_item(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<CartSummary>), ApiError> {
    let mut session = session_token(&jar, &state);
    let service = CartService::open(&state.backend, state.policy.clone()).await;

    let grant = service.add_to_cart(session.as_deref(), &ProductId(product_id)).await?;
    let jar = match grant {
        Some(grant) => {
            session = Some(grant.token.clone());
            jar.add(session_cookie(&grant)?)
        }
        None => jar,
    };

    let summary = service.cart_summary(session.as_deref()).await?;
    Ok((jar, Json(summary)))
}

async fn remove_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    jar: CookieJar,
) -> Result<Json<CartSummary>, ApiError> {
    let session = session_token(&jar, &state);
    let service = CartService::open(&state.backend, state.policy.clone()).await;

    service.remove_from_cart(session.as_deref(), &item_id).await?;
    Ok(Json(service.cart_summary(session.as_deref()).await?))
}
