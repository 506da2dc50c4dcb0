use crate::api::{error_response, ErrorResponse};
use crate::app::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use kochbuch_core::signing::SignatureError;
use kochbuch_core::StorageError;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SignedParams {
    /// Unix timestamp after which the link stops working.
    pub expires: i64,
    pub token: String,
}

#[utoipa::path(
    get,
    path = "/storage/{bucket}/{path}",
    tag = "storage",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("path" = String, Path, description = "Object path inside the bucket"),
        SignedParams,
    ),
    responses(
        (status = 200, description = "Object data"),
        (status = 403, description = "Signature invalid or expired", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse)
    )
)]
pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    Query(params): Query<SignedParams>,
) -> impl IntoResponse {
    match state
        .signer
        .verify(&bucket, &path, params.expires, &params.token, Utc::now())
    {
        Ok(()) => {}
        Err(SignatureError::Expired) => {
            return error_response(StatusCode::FORBIDDEN, "Signed URL expired")
        }
        Err(SignatureError::Invalid) => {
            return error_response(StatusCode::FORBIDDEN, "Invalid signature")
        }
    }

    let object = match state.kitchen.storage().download(&bucket, &path).await {
        Ok(object) => object,
        Err(StorageError::NotFound { .. }) | Err(StorageError::InvalidPath(_)) => {
            return error_response(StatusCode::NOT_FOUND, "Object not found")
        }
        Err(e) => {
            tracing::error!("Failed to read object {}/{}: {}", bucket, path, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read object");
        }
    };

    let cache_control = format!("private, max-age={}", object.cache_control);
    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(object.data))
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build object response: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read object")
        }
    }
}
