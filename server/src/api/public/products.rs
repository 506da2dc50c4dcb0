use crate::api::{data_error, ErrorResponse};
use crate::app::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use kochbuch_core::Product;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductParams {
    /// Case-insensitive title search.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "cart",
    params(ProductParams),
    responses(
        (status = 200, description = "Products with their category", body = ProductsResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductParams>,
) -> impl IntoResponse {
    match state.kitchen.list_products(params.q.as_deref()).await {
        Ok(products) => Json(ProductsResponse { products }).into_response(),
        Err(e) => data_error(e),
    }
}
