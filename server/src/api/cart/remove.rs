use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use kochbuch_core::CartView;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    tag = "cart",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Item not in the user's cart", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_item(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.kitchen.remove_cart_item(&user, id).await {
        Ok(cart) => Json(cart).into_response(),
        Err(e) => data_error(e),
    }
}
