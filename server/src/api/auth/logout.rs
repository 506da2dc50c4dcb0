use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::{bearer_token, AuthUser};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use kochbuch_core::DataError;

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(rejection) => return rejection.into_response(),
    };

    match state.identity.sign_out(token).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "Signed out");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => data_error(DataError::Auth(e)),
    }
}
