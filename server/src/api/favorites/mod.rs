pub mod add;
pub mod check;
pub mod list;
pub mod remove;

use crate::app::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/favorites endpoints (mounted at /api/favorites)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list::list_favorites)).route(
        "/{recipe_id}",
        get(check::check_favorite)
            .put(add::add_favorite)
            .delete(remove::remove_favorite),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_favorites,
        check::check_favorite,
        add::add_favorite,
        remove::remove_favorite,
    ),
    components(schemas(check::FavoriteStatus))
)]
pub struct ApiDoc;
