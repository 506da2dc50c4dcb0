pub mod login;
pub mod logout;
pub mod session;
pub mod signup;

use crate::app::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/auth endpoints (mounted at /api/auth).
/// Sign-up and login are public; the rest authenticate via `AuthUser`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup::signup))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/session", get(session::session))
}

#[derive(OpenApi)]
#[openapi(
    paths(signup::signup, login::login, logout::logout, session::session),
    components(schemas(
        signup::SignupRequest,
        login::LoginRequest,
        session::SessionResponse,
    ))
)]
pub struct ApiDoc;
