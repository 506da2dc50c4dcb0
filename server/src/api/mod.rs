pub mod auth;
pub mod cart;
pub mod favorites;
pub mod me;
pub mod photos;
pub mod profile;
pub mod public;
pub mod recipes;
pub mod testing;

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kochbuch_core::{AuthError, DataError};
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Translate a data-access failure into a JSON error response.
pub fn data_error(e: DataError) -> Response {
    match e {
        DataError::Validation(message) => error_response(StatusCode::BAD_REQUEST, message),
        DataError::NotFound => error_response(StatusCode::NOT_FOUND, "Not found"),
        DataError::Unauthorized => {
            error_response(StatusCode::FORBIDDEN, "Not the owner of this resource")
        }
        DataError::Unauthenticated => error_response(StatusCode::UNAUTHORIZED, "Login required"),
        DataError::Conflict(message) => error_response(StatusCode::CONFLICT, message),
        DataError::Auth(AuthError::EmailTaken) => {
            error_response(StatusCode::CONFLICT, "Email already registered")
        }
        DataError::Auth(AuthError::InvalidCredentials) => {
            error_response(StatusCode::UNAUTHORIZED, "Invalid credentials")
        }
        DataError::Auth(AuthError::InvalidSession) => {
            error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token")
        }
        DataError::Auth(AuthError::Provider(_)) | DataError::Store(_) | DataError::Storage(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// A file read from a multipart request, plus the optional `recipe_id` field.
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
    pub recipe_id: Option<Uuid>,
}

/// Read the `file` part (and `recipe_id`, when present) of a multipart body.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, Response> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut recipe_id = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Multipart read error: {}", e);
                return Err(error_response(
                    e.status(),
                    format!("Failed to read multipart data: {}", e.body_text()),
                ));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => {
                        tracing::warn!("Field read error: {}", e);
                        return Err(error_response(
                            e.status(),
                            format!("Failed to read file data: {}", e.body_text()),
                        ));
                    }
                };
                file = Some((file_name, data));
            }
            Some("recipe_id") => {
                let text = field.text().await.unwrap_or_default();
                let text = text.trim();
                if !text.is_empty() {
                    match Uuid::parse_str(text) {
                        Ok(id) => recipe_id = Some(id),
                        Err(_) => {
                            return Err(error_response(
                                StatusCode::BAD_REQUEST,
                                "recipe_id must be a UUID",
                            ))
                        }
                    }
                }
            }
            _ => {}
        }
    }

    match file {
        Some((file_name, data)) => Ok(UploadedFile {
            file_name,
            data,
            recipe_id,
        }),
        None => Err(error_response(StatusCode::BAD_REQUEST, "No file provided")),
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(components(schemas(
        ErrorResponse,
        kochbuch_core::Recipe,
        kochbuch_core::Ingredient,
        kochbuch_core::CreatorSummary,
        kochbuch_core::RecipeDraft,
        kochbuch_core::IngredientDraft,
        kochbuch_core::Category,
        kochbuch_core::Identity,
        kochbuch_core::Profile,
        kochbuch_core::Product,
        kochbuch_core::CartLine,
        kochbuch_core::CartView,
    )))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // Add security scheme
    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        auth::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        me::ApiDoc::openapi(),
        favorites::ApiDoc::openapi(),
        profile::ApiDoc::openapi(),
        photos::ApiDoc::openapi(),
        cart::ApiDoc::openapi(),
        testing::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        // Merge paths
        spec.paths.paths.extend(module_spec.paths.paths);

        // Merge components (schemas)
        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
