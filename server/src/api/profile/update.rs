use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::{Profile, ProfileChanges};

#[utoipa::path(
    patch,
    path = "/api/profile",
    tag = "profile",
    request_body(content = ProfileChanges, example = json!({"username": "chefkoch"})),
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Blank username", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(changes): Json<ProfileChanges>,
) -> impl IntoResponse {
    match state.kitchen.update_profile(&user, changes).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => data_error(e),
    }
}
