use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FavoriteStatus {
    pub recipe_id: Uuid,
    pub favorite: bool,
}

#[utoipa::path(
    get,
    path = "/api/favorites/{recipe_id}",
    tag = "favorites",
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Whether the recipe is a favorite", body = FavoriteStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn check_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.kitchen.is_favorite(&user, recipe_id).await {
        Ok(favorite) => Json(FavoriteStatus {
            recipe_id,
            favorite,
        })
        .into_response(),
        Err(e) => data_error(e),
    }
}
