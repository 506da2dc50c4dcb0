use super::session::SessionResponse;
use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::forms::LoginForm;
use kochbuch_core::DataError;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "ada@example.com", "password": "password"})),
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 400, description = "Missing credentials", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let form = LoginForm {
        email: req.email,
        password: req.password,
    };
    let (email, password) = match form.credentials() {
        Ok(c) => c,
        Err(e) => return data_error(e),
    };

    match state.identity.sign_in(&email, &password).await {
        Ok(session) => Json(SessionResponse::from(session)).into_response(),
        Err(e) => data_error(DataError::Auth(e)),
    }
}
