use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use kochbuch_core::{Recipe, RecipeDraft};
use uuid::Uuid;

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeDraft,
    responses(
        (status = 200, description = "Recipe replaced, ingredients included", body = Recipe),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's owner", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<RecipeDraft>,
) -> impl IntoResponse {
    match state.kitchen.update_recipe(&user, id, draft).await {
        Ok(recipe) => Json(recipe).into_response(),
        Err(e) => data_error(e),
    }
}
