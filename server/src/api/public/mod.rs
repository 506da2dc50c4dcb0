pub mod categories;
pub mod products;
pub mod storage;
pub mod unauthed_ping;

use crate::app::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/test/unauthed-ping",
            get(unauthed_ping::unauthed_ping),
        )
        .route("/api/categories", get(categories::list_categories))
        .route("/api/products", get(products::list_products))
        .route("/storage/{bucket}/{*path}", get(storage::get_object))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        unauthed_ping::unauthed_ping,
        categories::list_categories,
        products::list_products,
        storage::get_object,
    ),
    components(schemas(
        unauthed_ping::UnauthedPingResponse,
        categories::CategoriesResponse,
        products::ProductsResponse,
    ))
)]
pub struct ApiDoc;
