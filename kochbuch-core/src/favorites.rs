//! Per-user favorites list.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::DataError;
use crate::kitchen::{store_failure, Kitchen};
use crate::types::{Identity, Recipe};

impl Kitchen {
    /// True only when the user has a favorites list containing `recipe_id`.
    pub async fn is_favorite(&self, user: &Identity, recipe_id: Uuid) -> Result<bool, DataError> {
        let Some(list) = self
            .store
            .find_favorites_list(user.id)
            .await
            .map_err(store_failure("fetch favorites list"))?
        else {
            return Ok(false);
        };

        Ok(self
            .store
            .find_favorite_item(list.id, recipe_id)
            .await
            .map_err(store_failure("fetch favorite item"))?
            .is_some())
    }

    /// Add a recipe to the user's favorites. Adding it again is a no-op.
    pub async fn add_favorite(&self, user: &Identity, recipe_id: Uuid) -> Result<(), DataError> {
        self.store
            .find_recipe(recipe_id)
            .await
            .map_err(store_failure("fetch recipe"))?
            .ok_or(DataError::NotFound)?;

        let list = self
            .store
            .get_or_create_favorites_list(user.id)
            .await
            .map_err(store_failure("create favorites list"))?;

        self.store
            .insert_favorite_item(list.id, recipe_id)
            .await
            .map_err(store_failure("add favorite"))?;
        Ok(())
    }

    /// Returns whether an item was removed.
    pub async fn remove_favorite(
        &self,
        user: &Identity,
        recipe_id: Uuid,
    ) -> Result<bool, DataError> {
        let Some(list) = self
            .store
            .find_favorites_list(user.id)
            .await
            .map_err(store_failure("fetch favorites list"))?
        else {
            return Ok(false);
        };

        let removed = self
            .store
            .delete_favorite_item(list.id, recipe_id)
            .await
            .map_err(store_failure("remove favorite"))?;
        Ok(removed > 0)
    }

    /// Favorite recipes, most recently favorited first.
    pub async fn list_favorites(&self, user: &Identity) -> Result<Vec<Recipe>, DataError> {
        let Some(list) = self
            .store
            .find_favorites_list(user.id)
            .await
            .map_err(store_failure("fetch favorites list"))?
        else {
            return Ok(Vec::new());
        };

        let items = self
            .store
            .favorite_items(list.id)
            .await
            .map_err(store_failure("list favorite items"))?;
        let ids: Vec<Uuid> = items.iter().map(|i| i.recipe_id).collect();

        let mut rows: HashMap<Uuid, _> = self
            .store
            .recipes_by_ids(&ids)
            .await
            .map_err(store_failure("fetch favorite recipes"))?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let ordered = ids.iter().filter_map(|id| rows.remove(id)).collect();

        self.assemble(ordered).await
    }
}
