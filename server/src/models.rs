use chrono::{DateTime, Utc};
use diesel::prelude::*;
use kochbuch_core::backend::{Cart, CartItem, RecipeRow};
use kochbuch_core::{Category, FavoriteItem, FavoritesList, Ingredient, Profile};
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::accounts)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub account_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::profiles)]
pub struct NewProfile<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::profiles)]
pub struct ProfileUpdate<'a> {
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeRecord {
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

impl From<RecipeRecord> for RecipeRow {
    fn from(r: RecipeRecord) -> Self {
        RecipeRow {
            id: r.id,
            name: r.name,
            description: r.description,
            servings: r.servings,
            instructions: r.instructions,
            image_url: r.image_url,
            additional_info: r.additional_info,
            category_id: r.category_id,
            user_id: r.user_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(treat_none_as_null = true)]
pub struct RecipeValues<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub servings: i32,
    pub instructions: &'a str,
    pub image_url: Option<&'a str>,
    pub additional_info: Option<&'a str>,
    pub category_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub user_id: Uuid,
    #[diesel(embed)]
    pub values: RecipeValues<'a>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngredientRecord {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<IngredientRecord> for Ingredient {
    fn from(r: IngredientRecord) -> Self {
        Ingredient {
            id: r.id,
            recipe_id: r.recipe_id,
            name: r.name,
            quantity: r.quantity,
            unit: r.unit,
            additional_info: r.additional_info,
            created_at: r.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub recipe_id: Uuid,
    pub position: i32,
    pub name: &'a str,
    pub quantity: Option<f64>,
    pub unit: Option<&'a str>,
    pub additional_info: Option<&'a str>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::favorites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FavoritesRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<FavoritesRow> for FavoritesList {
    fn from(r: FavoritesRow) -> Self {
        FavoritesList {
            id: r.id,
            user_id: r.user_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::favorite_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FavoriteItemRow {
    pub id: Uuid,
    pub favorite_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteItemRow> for FavoriteItem {
    fn from(r: FavoriteItemRow) -> Self {
        FavoriteItem {
            id: r.id,
            favorite_id: r.favorite_id,
            recipe_id: r.recipe_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Cart {
            id: r.id,
            user_id: r.user_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        CartItem {
            id: r.id,
            cart_id: r.cart_id,
            product_id: r.product_id,
            quantity: r.quantity,
            created_at: r.created_at,
        }
    }
}
