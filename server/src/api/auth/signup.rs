use super::session::SessionResponse;
use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use kochbuch_core::forms::SignUpForm;
use kochbuch_core::DataError;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(content = SignupRequest, example = json!({
        "email": "ada@example.com",
        "password": "password",
        "username": "ada",
        "first_name": "Ada",
        "last_name": "Lovelace"
    })),
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    let form = SignUpForm {
        email: req.email,
        password: req.password,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
    };
    let request = match form.to_request() {
        Ok(r) => r,
        Err(e) => return data_error(e),
    };

    match state.identity.sign_up(request).await {
        Ok(session) => (StatusCode::CREATED, Json(SessionResponse::from(session))).into_response(),
        Err(e) => {
            tracing::warn!("Sign-up failed: {}", e);
            data_error(DataError::Auth(e))
        }
    }
}
