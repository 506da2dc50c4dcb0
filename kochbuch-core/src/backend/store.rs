use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{
    Category, FavoriteItem, FavoritesList, Ingredient, Product, Profile, ProfileChanges,
    RecipeDraft,
};

/// A `recipes` row without its joined relations.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub servings: i32,
    pub instructions: String,
    pub image_url: Option<String>,
    pub additional_info: Option<String>,
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Table-scoped access to the relational store.
///
/// Operations that touch more than one table (`insert_recipe`,
/// `replace_recipe`, `delete_recipe`) are atomic: either every row is
/// written or none is. Get-or-create and insert-or-ignore operations rely on
/// unique constraints rather than on a preceding lookup.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError>;

    /// Recipe rows, newest first. `owner` restricts to one user's recipes.
    async fn list_recipes(&self, owner: Option<Uuid>) -> Result<Vec<RecipeRow>, StoreError>;

    async fn recipes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeRow>, StoreError>;

    async fn find_recipe(&self, id: Uuid) -> Result<Option<RecipeRow>, StoreError>;

    /// Ingredients of the given recipes in insertion order.
    async fn ingredients_for(&self, recipe_ids: &[Uuid]) -> Result<Vec<Ingredient>, StoreError>;

    /// Insert a recipe owned by `owner` together with the draft's ingredients.
    async fn insert_recipe(
        &self,
        owner: Uuid,
        draft: &RecipeDraft,
    ) -> Result<(RecipeRow, Vec<Ingredient>), StoreError>;

    /// Overwrite the recipe's fields and replace all of its ingredients.
    /// Returns `None` when no recipe with this id is owned by `owner`.
    async fn replace_recipe(
        &self,
        id: Uuid,
        owner: Uuid,
        draft: &RecipeDraft,
    ) -> Result<Option<(RecipeRow, Vec<Ingredient>)>, StoreError>;

    /// Delete a recipe owned by `owner` along with its ingredients and any
    /// favorite items referencing it. Returns whether a recipe was deleted.
    async fn delete_recipe(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError>;

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Profile>, StoreError>;

    async fn find_favorites_list(&self, user_id: Uuid)
        -> Result<Option<FavoritesList>, StoreError>;

    async fn get_or_create_favorites_list(&self, user_id: Uuid)
        -> Result<FavoritesList, StoreError>;

    async fn find_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<FavoriteItem>, StoreError>;

    /// Insert-or-ignore on `(favorite_id, recipe_id)`; returns the stored item.
    async fn insert_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<FavoriteItem, StoreError>;

    async fn delete_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<u64, StoreError>;

    /// Items of a favorites list, most recent first.
    async fn favorite_items(&self, favorite_id: Uuid) -> Result<Vec<FavoriteItem>, StoreError>;

    /// Products with their category name, optionally filtered by a
    /// case-insensitive title substring.
    async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, StoreError>;

    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError>;

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError>;

    async fn get_or_create_cart(&self, user_id: Uuid) -> Result<Cart, StoreError>;

    async fn cart_items(&self, cart_id: Uuid) -> Result<Vec<CartItem>, StoreError>;

    /// Insert the product with quantity 1, or increment the existing line.
    async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid)
        -> Result<CartItem, StoreError>;

    async fn delete_cart_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<u64, StoreError>;
}
