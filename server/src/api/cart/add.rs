use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{extract::State, response::IntoResponse, Json};
use kochbuch_core::CartView;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    tag = "cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_item(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AddCartItemRequest>,
) -> impl IntoResponse {
    match state.kitchen.add_to_cart(&user, req.product_id).await {
        Ok(cart) => Json(cart).into_response(),
        Err(e) => data_error(e),
    }
}
