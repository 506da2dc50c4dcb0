use crate::api::ErrorResponse;
use crate::app::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use kochbuch_core::Identity;

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// Use this in any handler that requires authentication:
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     // user is the authenticated Identity
/// }
/// ```
pub struct AuthUser(pub Identity);

#[derive(Debug)]
pub enum AuthRejection {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthRejection::MissingHeader => {
                (StatusCode::UNAUTHORIZED, "Missing Authorization header")
            }
            AuthRejection::InvalidHeader => {
                (StatusCode::UNAUTHORIZED, "Invalid Authorization header")
            }
            AuthRejection::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format",
            ),
            AuthRejection::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthRejection::Unavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to validate session",
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// The token of a `Bearer` Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthRejection::MissingHeader)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthRejection::InvalidHeader)?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::InvalidFormat)
}

/// Resolve the request's bearer token to an identity.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Identity, AuthRejection> {
    let token = bearer_token(headers)?;
    match state.identity.user(token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AuthRejection::InvalidToken),
        Err(e) => {
            tracing::error!("Failed to resolve session: {}", e);
            Err(AuthRejection::Unavailable)
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate(&state, &parts.headers).await.map(AuthUser)
    }
}
