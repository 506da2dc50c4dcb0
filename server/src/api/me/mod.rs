pub mod recipes;

use crate::app::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/me endpoints (mounted at /api/me)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(recipes::whoami))
        .route("/recipes", get(recipes::my_recipes))
}

#[derive(OpenApi)]
#[openapi(paths(recipes::whoami, recipes::my_recipes))]
pub struct ApiDoc;
