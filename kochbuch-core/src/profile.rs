//! Profile reads and edits.

use crate::error::DataError;
use crate::kitchen::{store_failure, Kitchen};
use crate::types::{Identity, Profile, ProfileChanges};

impl Kitchen {
    pub async fn get_profile(&self, user: &Identity) -> Result<Profile, DataError> {
        self.store
            .find_profile(user.id)
            .await
            .map_err(store_failure("fetch profile"))?
            .ok_or(DataError::NotFound)
    }

    /// Apply a partial update. Blank usernames are rejected; an unchanged
    /// username does not touch the row.
    pub async fn update_profile(
        &self,
        user: &Identity,
        mut changes: ProfileChanges,
    ) -> Result<Profile, DataError> {
        let current = self.get_profile(user).await?;

        if let Some(username) = changes.username.take() {
            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(DataError::validation("Username is required"));
            }
            if username != current.username {
                changes.username = Some(username);
            }
        }

        if changes == ProfileChanges::default() {
            return Ok(current);
        }

        self.store
            .update_profile(user.id, &changes)
            .await
            .map_err(store_failure("update profile"))?
            .ok_or(DataError::NotFound)
    }

    pub async fn update_username(
        &self,
        user: &Identity,
        username: &str,
    ) -> Result<Profile, DataError> {
        self.update_profile(
            user,
            ProfileChanges {
                username: Some(username.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Upload a new profile photo and store its signed URL on the profile.
    ///
    /// The uploaded object is left in place if the profile write fails.
    pub async fn set_profile_photo(
        &self,
        user: &Identity,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Profile, DataError> {
        let url = self.upload_profile_photo(user, file_name, data).await?;
        self.store
            .update_profile(
                user.id,
                &ProfileChanges {
                    image_url: Some(url),
                    ..Default::default()
                },
            )
            .await
            .map_err(store_failure("store profile photo"))?
            .ok_or(DataError::NotFound)
    }
}
