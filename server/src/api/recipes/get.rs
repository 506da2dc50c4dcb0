use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use kochbuch_core::Recipe;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe with ingredients and creator", body = Recipe),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match state.kitchen.get_recipe(id).await {
        Ok(recipe) => Json(recipe).into_response(),
        Err(e) => data_error(e),
    }
}
