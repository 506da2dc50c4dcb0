use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::CartView;

#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "cart",
    responses(
        (status = 200, description = "Cart lines with products and total", body = CartView),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_cart(AuthUser(user): AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    match state.kitchen.cart(&user).await {
        Ok(cart) => Json(cart).into_response(),
        Err(e) => data_error(e),
    }
}
