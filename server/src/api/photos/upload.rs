use crate::api::{data_error, read_upload, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart body for recipe image uploads
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RecipeImageUploadRequest {
    #[schema(format = Binary)]
    pub file: String,
    /// Recipe the image belongs to, omitted while the recipe is still a draft.
    pub recipe_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Signed URL, valid for a year.
    pub url: String,
}

#[utoipa::path(
    post,
    path = "/api/photos/recipe",
    tag = "photos",
    request_body(content = RecipeImageUploadRequest, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Invalid file", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_recipe_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    match state
        .kitchen
        .upload_recipe_image(&user, upload.recipe_id, &upload.file_name, upload.data)
        .await
    {
        Ok(url) => (StatusCode::CREATED, Json(UploadResponse { url })).into_response(),
        Err(e) => data_error(e),
    }
}
