use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use myshop_db::{DbPool, RepositoryBackend};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    backend: RepositoryBackend,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage_backend: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub fn router(backend: RepositoryBackend) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { backend })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.backend.pool() {
        Some(pool) => database_check(pool).await,
        None => HealthCheck { status: "ready", detail: "in-memory store, no database".to_string() },
    };
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        storage_backend: state.backend.name(),
        service: HealthCheck {
            status: "ready",
            detail: "myshop-server runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}
