use super::check::FavoriteStatus;
use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Idempotent: adding a recipe twice leaves a single entry.
#[utoipa::path(
    put,
    path = "/api/favorites/{recipe_id}",
    tag = "favorites",
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe is a favorite", body = FavoriteStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.kitchen.add_favorite(&user, recipe_id).await {
        Ok(()) => Json(FavoriteStatus {
            recipe_id,
            favorite: true,
        })
        .into_response(),
        Err(e) => data_error(e),
    }
}
