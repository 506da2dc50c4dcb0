use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::Recipe;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "Every recipe with its ingredients and category", body = RecipesResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_recipes(State(state): State<AppState>) -> impl IntoResponse {
    match state.kitchen.list_recipes().await {
        Ok(recipes) => Json(RecipesResponse { recipes }).into_response(),
        Err(e) => data_error(e),
    }
}
