use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use kochbuch_core::{Recipe, RecipeDraft};

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = RecipeDraft,
    responses(
        (status = 201, description = "Recipe created", body = Recipe),
        (status = 400, description = "Invalid recipe or unknown category", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(draft): Json<RecipeDraft>,
) -> impl IntoResponse {
    match state.kitchen.create_recipe(&user, draft).await {
        Ok(recipe) => {
            tracing::info!(recipe_id = %recipe.id, user_id = %user.id, "Recipe created");
            (StatusCode::CREATED, Json(recipe)).into_response()
        }
        Err(e) => data_error(e),
    }
}
