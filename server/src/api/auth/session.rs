use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use kochbuch_core::{AuthSession, Identity};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: Identity,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.access_token,
            user: session.user,
            expires_at: session.expires_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "The user behind the bearer token", body = Identity),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn session(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(user)
}
