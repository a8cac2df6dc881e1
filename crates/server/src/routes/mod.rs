//! HTTP surface for the shop.
//!
//! Cart endpoints (session carried in the cart cookie):
//! - `GET    /cart`                 cart lines joined to the catalog, plus summary
//! - `GET    /cart/summary`         item count and total
//! - `POST   /cart/items/{id}`      add one unit of product `id`
//! - `DELETE /cart/items/{id}`      remove cart line `id`
//!
//! Catalog endpoints:
//! - `GET|POST /products`, `GET|PUT|DELETE /products/{id}`
//! - `GET|POST /categories`, `DELETE /categories/{id}`
//!
//! Also mounts `/health` and the static `/images` directory.

use std::path::Path;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use myshop_core::config::AppConfig;
use myshop_core::errors::{ApplicationError, InterfaceError};
use myshop_db::RepositoryBackend;
use myshop_services::{CartServiceError, CatalogError, SessionPolicy};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::{error, warn};
use uuid::Uuid;

use crate::health;

pub mod cart;
pub mod catalog;

#[derive(Clone)]
pub struct AppState {
    pub backend: RepositoryBackend,
    pub policy: SessionPolicy,
}

impl AppState {
    pub fn from_config(config: &AppConfig, backend: RepositoryBackend) -> Self {
        Self { backend, policy: SessionPolicy::from_config(&config.cart) }
    }
}

pub fn router(state: AppState, image_dir: &Path) -> Router {
    let health = health::router(state.backend.clone());

    Router::new()
        .merge(cart::router())
        .merge(catalog::router())
        .with_state(state)
        .merge(health)
        .nest_service("/images", ServeDir::new(image_dir))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

/// Handler error rendered as a JSON body with a mapped status code.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self(value.into_interface(Uuid::new_v4().to_string()))
    }
}

impl From<CartServiceError> for ApiError {
    fn from(value: CartServiceError) -> Self {
        ApplicationError::from(value).into()
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        ApplicationError::from(value).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = self.0.correlation_id().to_string();
        let (status, message) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
            InterfaceError::ServiceUnavailable { message, .. } => {
                warn!(
                    event_name = "http.request.unavailable",
                    correlation_id = %correlation_id,
                    error = %message,
                    "storage unavailable"
                );
                (StatusCode::SERVICE_UNAVAILABLE, self.0.user_message().to_string())
            }
            InterfaceError::Internal { message, .. } => {
                error!(
                    event_name = "http.request.internal_error",
                    correlation_id = %correlation_id,
                    error = %message,
                    "request failed"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.user_message().to_string())
            }
        };

        (status, Json(ErrorBody { error: message, correlation_id })).into_response()
    }
}
