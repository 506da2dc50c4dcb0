use crate::api::recipes::list::RecipesResponse;
use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::Identity;

#[utoipa::path(
    get,
    path = "/api/me",
    tag = "me",
    responses(
        (status = 200, description = "The signed-in user", body = Identity),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn whoami(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(user)
}

#[utoipa::path(
    get,
    path = "/api/me/recipes",
    tag = "me",
    responses(
        (status = 200, description = "Recipes created by the signed-in user", body = RecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_recipes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.kitchen.list_my_recipes(&user).await {
        Ok(recipes) => Json(RecipesResponse { recipes }).into_response(),
        Err(e) => data_error(e),
    }
}
