use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::Profile;

#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "profile",
    responses(
        (status = 200, description = "The signed-in user's profile", body = Profile),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Profile missing", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.kitchen.get_profile(&user).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => data_error(e),
    }
}
