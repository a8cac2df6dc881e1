use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use myshop_core::domain::category::ProductCategory;
use myshop_core::domain::product::Product;
use myshop_services::{CatalogService, ProductDraft};
use serde::Deserialize;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", delete(delete_category))
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let catalog = CatalogService::open(&state.backend).await;
    Ok(Json(catalog.list_products().await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let catalog = CatalogService::open(&state.backend).await;
    Ok(Json(catalog.get_product(&id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let catalog = CatalogService::open(&state.backend).await;
    let product = catalog.create_product(draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>, ApiError> {
    let catalog = CatalogService::open(&state.backend).await;
    Ok(Json(catalog.update_product(&id, draft).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    CatalogService::open(&state.backend).await.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductCategory>>, ApiError> {
    let catalog = CatalogService::open(&state.backend).await;
    Ok(Json(catalog.list_categories().await?))
}

async fn create_category(
    State(state): State<AppState>,
    Json(draft): Json<CategoryDraft>,
) -> Result<(StatusCode, Json<ProductCategory>), ApiError> {
    let catalog = CatalogService::open(&state.backend).await;
    let category = catalog.create_category(&draft.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    CatalogService::open(&state.backend).await.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes::test_support::{json_request, read_json, request, seeded_app};

    #[tokio::test]
    async fn seeded_products_are_listed_and_fetchable() {
        let (app, _) = seeded_app().await;

        let response = app.clone().oneshot(request("GET", "/products", None)).await.expect("list");
        assert_eq!(response.status(), StatusCode::OK);
        let products: Vec<serde_json::Value> = read_json(response).await;
        assert_eq!(products.len(), 3);

        let response =
            app.oneshot(request("GET", "/products/prod-hoodie", None)).await.expect("get");
        assert_eq!(response.status(), StatusCode::OK);
        let product: serde_json::Value = read_json(response).await;
        assert_eq!(product["name"], "Logo Hoodie");
        assert_eq!(product["category_id"], "cat-apparel");
    }

    #[tokio::test]
    async fn product_crud_round_trip() {
        let (app, _) = seeded_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/products",
                json!({ "name": "Pour Over", "price": "32.00", "category_id": "cat-kitchen" }),
            ))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: serde_json::Value = read_json(response).await;
        let id = created["id"].as_str().expect("id").to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/products/{id}"),
                json!({ "name": "Pour Over Kit", "price": "36.00", "category_id": "cat-kitchen" }),
            ))
            .await
            .expect("update");
        assert_eq!(response.status(), StatusCode::OK);
        let updated: serde_json::Value = read_json(response).await;
        assert_eq!(updated["name"], "Pour Over Kit");

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/products/{id}"), None))
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response =
            app.oneshot(request("GET", &format!("/products/{id}"), None)).await.expect("get");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "Product not found!");
    }

    #[tokio::test]
    async fn invalid_product_is_rejected_with_bad_request() {
        let (app, _) = seeded_app().await;

        let response = app
            .oneshot(json_request("POST", "/products", json!({ "name": "", "price": "3.00" })))
            .await
            .expect("create");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(response).await;
        assert!(body["error"].as_str().is_some_and(|message| message.contains("name")));
    }

    #[tokio::test]
    async fn categories_can_be_created_and_deleted() {
        let (app, _) = seeded_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/categories", json!({ "name": "Stationery" })))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::CREATED);
        let category: serde_json::Value = read_json(response).await;
        let id = category["id"].as_str().expect("id").to_string();

        let response =
            app.clone().oneshot(request("GET", "/categories", None)).await.expect("list");
        let categories: Vec<serde_json::Value> = read_json(response).await;
        assert_eq!(categories.len(), 3);

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/categories/{id}"), None))
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response =
            app.oneshot(request("DELETE", &format!("/categories/{id}"), None)).await.expect("again");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
