pub mod add;
pub mod get;
pub mod remove;

use crate::app::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/cart endpoints (mounted at /api/cart)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get::get_cart))
        .route("/items", post(add::add_item))
        .route("/items/{id}", delete(remove::remove_item))
}

#[derive(OpenApi)]
#[openapi(
    paths(get::get_cart, add::add_item, remove::remove_item),
    components(schemas(add::AddCartItemRequest))
)]
pub struct ApiDoc;
