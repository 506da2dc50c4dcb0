use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::Category;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "recipes",
    responses(
        (status = 200, description = "All categories sorted by name", body = CategoriesResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    match state.kitchen.list_categories().await {
        Ok(categories) => Json(CategoriesResponse { categories }).into_response(),
        Err(e) => data_error(e),
    }
}
