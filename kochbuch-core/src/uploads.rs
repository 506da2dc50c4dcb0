//! Image uploads into the object storage buckets.

use chrono::Duration;
use uuid::Uuid;

use crate::backend::UploadOptions;
use crate::error::DataError;
use crate::image::validate_image;
use crate::kitchen::{storage_failure, Kitchen};
use crate::types::Identity;

pub const RECIPE_BUCKET: &str = "recipe-img";
pub const PROFILE_BUCKET: &str = "profiles-img";

pub fn recipe_image_ttl() -> Duration {
    Duration::days(365)
}

pub fn profile_photo_ttl() -> Duration {
    Duration::hours(1)
}

/// Reduce a client-supplied file name to a single safe path segment.
pub fn sanitize_file_name(name: &str) -> Result<String, DataError> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(DataError::validation("File name is required"));
    }
    Ok(cleaned)
}

/// Storage path of a recipe image; `temp` when the recipe does not exist yet.
pub fn recipe_image_path(user_id: Uuid, recipe_id: Option<Uuid>, file_name: &str) -> String {
    match recipe_id {
        Some(recipe_id) => format!("{}/{}/{}", user_id, recipe_id, file_name),
        None => format!("{}/temp/{}", user_id, file_name),
    }
}

pub fn profile_photo_path(user_id: Uuid, file_name: &str) -> String {
    format!("{}/{}", user_id, file_name)
}

impl Kitchen {
    /// Upload a recipe image and return a signed URL valid for one year.
    pub async fn upload_recipe_image(
        &self,
        user: &Identity,
        recipe_id: Option<Uuid>,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<String, DataError> {
        let file_name = sanitize_file_name(file_name)?;
        let path = recipe_image_path(user.id, recipe_id, &file_name);
        self.upload_signed(RECIPE_BUCKET, &path, data, recipe_image_ttl())
            .await
    }

    /// Upload a profile photo and return a signed URL valid for one hour.
    pub async fn upload_profile_photo(
        &self,
        user: &Identity,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<String, DataError> {
        let file_name = sanitize_file_name(file_name)?;
        let path = profile_photo_path(user.id, &file_name);
        self.upload_signed(PROFILE_BUCKET, &path, data, profile_photo_ttl())
            .await
    }

    async fn upload_signed(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        ttl: Duration,
    ) -> Result<String, DataError> {
        let content_type = validate_image(&data)?;
        let size = data.len();

        self.storage
            .upload(bucket, path, data, &UploadOptions::image(content_type))
            .await
            .map_err(storage_failure("upload image"))?;
        tracing::info!(bucket, path, size, "Image uploaded");

        self.storage
            .create_signed_url(bucket, path, ttl)
            .await
            .map_err(storage_failure("sign image URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_last_component() {
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\pic.png").unwrap(), "pic.png");
        assert_eq!(sanitize_file_name("my photo (1).jpg").unwrap(), "my_photo__1_.jpg");
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("dir/").is_err());
        assert!(sanitize_file_name("..").is_err());
    }

    #[test]
    fn test_paths() {
        let user = Uuid::nil();
        let recipe = Uuid::from_u128(7);
        assert_eq!(
            recipe_image_path(user, None, "a.png"),
            format!("{}/temp/a.png", user)
        );
        assert_eq!(
            recipe_image_path(user, Some(recipe), "a.png"),
            format!("{}/{}/a.png", user, recipe)
        );
        assert_eq!(profile_photo_path(user, "me.png"), format!("{}/me.png", user));
    }
}
