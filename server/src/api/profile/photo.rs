use crate::api::{data_error, read_upload, ErrorResponse};
use crate::app::AppState;
use crate::auth::AuthUser;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use kochbuch_core::Profile;
use utoipa::ToSchema;

/// Multipart body for image uploads
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct PhotoUploadRequest {
    #[schema(format = Binary)]
    pub file: String,
}

#[utoipa::path(
    post,
    path = "/api/profile/photo",
    tag = "profile",
    request_body(content = PhotoUploadRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Profile with the new photo URL", body = Profile),
        (status = 400, description = "Invalid file", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_photo(
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
        .set_profile_photo(&user, &upload.file_name, upload.data)
        .await
    {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => data_error(e),
    }
}
