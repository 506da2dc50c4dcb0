//! Recipe operations.

use std::collections::HashMap;

use uuid::Uuid;

use crate::backend::RecipeRow;
use crate::error::DataError;
use crate::kitchen::{store_failure, Kitchen};
use crate::types::{Category, CreatorSummary, Identity, Ingredient, Recipe, RecipeDraft};

/// Reject drafts that must never reach the store.
pub fn validate_draft(draft: &RecipeDraft) -> Result<(), DataError> {
    if draft.name.trim().is_empty() {
        return Err(DataError::validation("Recipe name is required"));
    }
    if draft.servings < 1 {
        return Err(DataError::validation("Servings must be at least 1"));
    }
    let ingredients = draft.named_ingredients();
    if ingredients.is_empty() {
        return Err(DataError::validation(
            "At least one ingredient with a name is required",
        ));
    }
    if let Some(bad) = ingredients
        .iter()
        .find(|i| i.quantity.is_some_and(|q| !q.is_finite() || q < 0.0))
    {
        return Err(DataError::validation(format!(
            "Invalid quantity for {}",
            bad.name
        )));
    }
    Ok(())
}

impl Kitchen {
    /// All recipes with category names and ingredients, newest first.
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, DataError> {
        let rows = self
            .store
            .list_recipes(None)
            .await
            .map_err(store_failure("list recipes"))?;
        self.assemble(rows).await
    }

    pub async fn list_my_recipes(&self, user: &Identity) -> Result<Vec<Recipe>, DataError> {
        let rows = self
            .store
            .list_recipes(Some(user.id))
            .await
            .map_err(store_failure("list own recipes"))?;
        self.assemble(rows).await
    }

    /// One recipe including its creator summary.
    pub async fn get_recipe(&self, id: Uuid) -> Result<Recipe, DataError> {
        let row = self
            .store
            .find_recipe(id)
            .await
            .map_err(store_failure("fetch recipe"))?
            .ok_or(DataError::NotFound)?;

        let creator = self
            .store
            .find_profile(row.user_id)
            .await
            .map_err(store_failure("fetch recipe creator"))?
            .map(|p| CreatorSummary {
                username: p.username,
                image_url: p.image_url,
            });

        let mut recipe = self
            .assemble(vec![row])
            .await?
            .pop()
            .ok_or(DataError::NotFound)?;
        recipe.creator = creator;
        Ok(recipe)
    }

    pub async fn create_recipe(
        &self,
        user: &Identity,
        draft: RecipeDraft,
    ) -> Result<Recipe, DataError> {
        validate_draft(&draft)?;
        self.require_category(draft.category_id).await?;

        let (row, ingredients) = self
            .store
            .insert_recipe(user.id, &draft)
            .await
            .map_err(store_failure("create recipe"))?;
        tracing::info!(recipe_id = %row.id, ingredients = ingredients.len(), "Recipe created");

        let category = self.category_name(row.category_id).await?;
        Ok(into_recipe(row, category, ingredients))
    }

    /// Replace the fields and the full ingredient list of an owned recipe.
    pub async fn update_recipe(
        &self,
        user: &Identity,
        id: Uuid,
        draft: RecipeDraft,
    ) -> Result<Recipe, DataError> {
        validate_draft(&draft)?;
        self.check_owner(user, id).await?;
        self.require_category(draft.category_id).await?;

        // Filtered by owner again, so a concurrent ownership change cannot
        // slip through between the check and the write.
        let Some((row, ingredients)) = self
            .store
            .replace_recipe(id, user.id, &draft)
            .await
            .map_err(store_failure("update recipe"))?
        else {
            return Err(self.write_rejected(user, id).await);
        };

        let category = self.category_name(row.category_id).await?;
        Ok(into_recipe(row, category, ingredients))
    }

    /// Delete an owned recipe with its ingredients and favorite entries.
    pub async fn delete_recipe(&self, user: &Identity, id: Uuid) -> Result<(), DataError> {
        self.check_owner(user, id).await?;
        let deleted = self
            .store
            .delete_recipe(id, user.id)
            .await
            .map_err(store_failure("delete recipe"))?;
        if !deleted {
            return Err(self.write_rejected(user, id).await);
        }
        tracing::info!(recipe_id = %id, "Recipe deleted");
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DataError> {
        self.store
            .list_categories()
            .await
            .map_err(store_failure("list categories"))
    }

    async fn check_owner(&self, user: &Identity, id: Uuid) -> Result<(), DataError> {
        let row = self
            .store
            .find_recipe(id)
            .await
            .map_err(store_failure("fetch recipe"))?
            .ok_or(DataError::NotFound)?;
        if row.user_id != user.id {
            tracing::warn!(recipe_id = %id, user_id = %user.id, "Rejected change to foreign recipe");
            return Err(DataError::Unauthorized);
        }
        Ok(())
    }

    /// Why an owner-filtered write matched no row: the recipe is gone, or it
    /// is not ours.
    async fn write_rejected(&self, user: &Identity, id: Uuid) -> DataError {
        match self.check_owner(user, id).await {
            Err(e) => e,
            Ok(()) => DataError::Unauthorized,
        }
    }

    async fn require_category(&self, id: Uuid) -> Result<(), DataError> {
        self.store
            .find_category(id)
            .await
            .map_err(store_failure("fetch category"))?
            .map(|_| ())
            .ok_or_else(|| DataError::validation("Unknown category"))
    }

    async fn category_name(&self, id: Uuid) -> Result<Option<String>, DataError> {
        Ok(self
            .store
            .find_category(id)
            .await
            .map_err(store_failure("fetch category"))?
            .map(|c| c.name))
    }

    /// Join rows with their category names and ingredients, keeping row order.
    pub(crate) async fn assemble(&self, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, DataError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let categories: HashMap<Uuid, String> = self
            .store
            .list_categories()
            .await
            .map_err(store_failure("list categories"))?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut by_recipe: HashMap<Uuid, Vec<Ingredient>> = HashMap::new();
        for ingredient in self
            .store
            .ingredients_for(&ids)
            .await
            .map_err(store_failure("fetch ingredients"))?
        {
            by_recipe
                .entry(ingredient.recipe_id)
                .or_default()
                .push(ingredient);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let category = categories.get(&row.category_id).cloned();
                let ingredients = by_recipe.remove(&row.id).unwrap_or_default();
                into_recipe(row, category, ingredients)
            })
            .collect())
    }
}

fn into_recipe(row: RecipeRow, category: Option<String>, ingredients: Vec<Ingredient>) -> Recipe {
    Recipe {
        id: row.id,
        name: row.name,
        description: row.description,
        servings: row.servings,
        instructions: row.instructions,
        image_url: row.image_url,
        additional_info: row.additional_info,
        category_id: row.category_id,
        category,
        user_id: row.user_id,
        created_at: row.created_at,
        ingredients,
        creator: None,
    }
}
