pub mod get;
pub mod photo;
pub mod update;

use crate::app::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/profile endpoints (mounted at /api/profile)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get::get_profile).patch(update::update_profile))
        .route("/photo", post(photo::upload_photo))
}

#[derive(OpenApi)]
#[openapi(
    paths(get::get_profile, update::update_profile, photo::upload_photo),
    components(schemas(kochbuch_core::ProfileChanges, photo::PhotoUploadRequest))
)]
pub struct ApiDoc;
