pub mod upload;

use crate::app::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/photos endpoints (mounted at /api/photos)
pub fn router() -> Router<AppState> {
    Router::new().route("/recipe", post(upload::upload_recipe_image))
}

#[derive(OpenApi)]
#[openapi(
    paths(upload::upload_recipe_image),
    components(schemas(upload::RecipeImageUploadRequest, upload::UploadResponse))
)]
pub struct ApiDoc;
