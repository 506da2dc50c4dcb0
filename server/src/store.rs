//! Postgres implementation of the relational store.
//!
//! Diesel is synchronous, so every call runs on the blocking thread pool
//! with its own pooled connection. Multi-table writes use one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use kochbuch_core::backend::{Cart, CartItem, RecipeRow};
use kochbuch_core::{
    Category, FavoriteItem, FavoritesList, Ingredient, Product, Profile, ProfileChanges,
    RecipeDraft, Store, StoreError,
};
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{
    CartItemRow, CartRow, CategoryRow, FavoriteItemRow, FavoritesRow, IngredientRecord,
    NewIngredient, NewRecipe, ProfileRow, ProfileUpdate, RecipeRecord, RecipeValues,
};
use crate::schema::{
    cart_items, carts, categories, favorite_items, favorites, ingredients, product_categories,
    products, profiles, recipes,
};

#[derive(Clone)]
pub struct PgStore {
    pool: Arc<DbPool>,
}

impl PgStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, DieselError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let span = tracing::info_span!("db.query");
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            f(&mut conn).map_err(store_error)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

fn store_error(e: DieselError) -> StoreError {
    match e {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
            info,
        ) => StoreError::Constraint(info.message().to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

fn recipe_values(draft: &RecipeDraft) -> RecipeValues<'_> {
    RecipeValues {
        name: &draft.name,
        description: &draft.description,
        servings: draft.servings,
        instructions: &draft.instructions,
        image_url: draft.image_url.as_deref(),
        additional_info: draft.additional_info.as_deref(),
        category_id: draft.category_id,
    }
}

fn insert_ingredients(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    draft: &RecipeDraft,
) -> Result<Vec<Ingredient>, DieselError> {
    let named = draft.named_ingredients();
    let rows: Vec<NewIngredient> = named
        .iter()
        .enumerate()
        .map(|(position, i)| NewIngredient {
            recipe_id,
            position: position as i32,
            name: &i.name,
            quantity: i.quantity,
            unit: i.unit.as_deref(),
            additional_info: i.additional_info.as_deref(),
        })
        .collect();

    let inserted: Vec<IngredientRecord> = diesel::insert_into(ingredients::table)
        .values(&rows)
        .returning(IngredientRecord::as_returning())
        .get_results(conn)?;
    Ok(inserted.into_iter().map(Ingredient::from).collect())
}

type ProductTuple = (Uuid, String, Option<f64>, Option<String>, Option<String>);

fn into_product((id, title, price, quality, category): ProductTuple) -> Product {
    Product {
        id,
        title,
        price,
        quality,
        category,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.run(|conn| {
            let rows: Vec<CategoryRow> = categories::table
                .order(categories::name.asc())
                .select(CategoryRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Category::from).collect())
        })
        .await
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        self.run(move |conn| {
            Ok(categories::table
                .find(id)
                .select(CategoryRow::as_select())
                .first(conn)
                .optional()?
                .map(Category::from))
        })
        .await
    }

    async fn list_recipes(&self, owner: Option<Uuid>) -> Result<Vec<RecipeRow>, StoreError> {
        self.run(move |conn| {
            let mut query = recipes::table
                .select(RecipeRecord::as_select())
                .order(recipes::created_at.desc())
                .into_boxed();
            if let Some(owner) = owner {
                query = query.filter(recipes::user_id.eq(owner));
            }
            let rows: Vec<RecipeRecord> = query.load(conn)?;
            Ok(rows.into_iter().map(RecipeRow::from).collect())
        })
        .await
    }

    async fn recipes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeRow>, StoreError> {
        let ids = ids.to_vec();
        self.run(move |conn| {
            let rows: Vec<RecipeRecord> = recipes::table
                .filter(recipes::id.eq_any(&ids))
                .select(RecipeRecord::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(RecipeRow::from).collect())
        })
        .await
    }

    async fn find_recipe(&self, id: Uuid) -> Result<Option<RecipeRow>, StoreError> {
        self.run(move |conn| {
            Ok(recipes::table
                .find(id)
                .select(RecipeRecord::as_select())
                .first(conn)
                .optional()?
                .map(RecipeRow::from))
        })
        .await
    }

    async fn ingredients_for(&self, recipe_ids: &[Uuid]) -> Result<Vec<Ingredient>, StoreError> {
        let ids = recipe_ids.to_vec();
        self.run(move |conn| {
            let rows: Vec<IngredientRecord> = ingredients::table
                .filter(ingredients::recipe_id.eq_any(&ids))
                .order((ingredients::recipe_id, ingredients::position.asc()))
                .select(IngredientRecord::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Ingredient::from).collect())
        })
        .await
    }

    async fn insert_recipe(
        &self,
        owner: Uuid,
        draft: &RecipeDraft,
    ) -> Result<(RecipeRow, Vec<Ingredient>), StoreError> {
        let draft = draft.clone();
        self.run(move |conn| {
            conn.transaction(|conn| {
                let record: RecipeRecord = diesel::insert_into(recipes::table)
                    .values(&NewRecipe {
                        user_id: owner,
                        values: recipe_values(&draft),
                    })
                    .returning(RecipeRecord::as_returning())
                    .get_result(conn)?;
                let ingredients = insert_ingredients(conn, record.id, &draft)?;
                Ok((RecipeRow::from(record), ingredients))
            })
        })
        .await
    }

    async fn replace_recipe(
        &self,
        id: Uuid,
        owner: Uuid,
        draft: &RecipeDraft,
    ) -> Result<Option<(RecipeRow, Vec<Ingredient>)>, StoreError> {
        let draft = draft.clone();
        self.run(move |conn| {
            conn.transaction(|conn| {
                let updated: Option<RecipeRecord> = diesel::update(
                    recipes::table
                        .filter(recipes::id.eq(id))
                        .filter(recipes::user_id.eq(owner)),
                )
                .set(&recipe_values(&draft))
                .returning(RecipeRecord::as_returning())
                .get_result(conn)
                .optional()?;

                let Some(record) = updated else {
                    return Ok(None);
                };

                diesel::delete(ingredients::table.filter(ingredients::recipe_id.eq(id)))
                    .execute(conn)?;
                let ingredients = insert_ingredients(conn, id, &draft)?;
                Ok(Some((RecipeRow::from(record), ingredients)))
            })
        })
        .await
    }

    async fn delete_recipe(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let owned = recipes::table
                    .filter(recipes::id.eq(id))
                    .filter(recipes::user_id.eq(owner))
                    .select(recipes::id)
                    .for_update()
                    .first::<Uuid>(conn)
                    .optional()?;
                if owned.is_none() {
                    return Ok(false);
                }

                diesel::delete(favorite_items::table.filter(favorite_items::recipe_id.eq(id)))
                    .execute(conn)?;
                diesel::delete(ingredients::table.filter(ingredients::recipe_id.eq(id)))
                    .execute(conn)?;
                diesel::delete(recipes::table.find(id)).execute(conn)?;
                Ok(true)
            })
        })
        .await
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.run(move |conn| {
            Ok(profiles::table
                .find(id)
                .select(ProfileRow::as_select())
                .first(conn)
                .optional()?
                .map(Profile::from))
        })
        .await
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        let ids = ids.to_vec();
        self.run(move |conn| {
            let rows: Vec<ProfileRow> = profiles::table
                .filter(profiles::id.eq_any(&ids))
                .select(ProfileRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Profile::from).collect())
        })
        .await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Profile>, StoreError> {
        let changes = changes.clone();
        self.run(move |conn| {
            let update = ProfileUpdate {
                username: changes.username.as_deref(),
                first_name: changes.first_name.as_deref(),
                last_name: changes.last_name.as_deref(),
                image_url: changes.image_url.as_deref(),
                updated_at: Some(Utc::now()),
            };
            Ok(diesel::update(profiles::table.find(id))
                .set(&update)
                .returning(ProfileRow::as_returning())
                .get_result(conn)
                .optional()?
                .map(Profile::from))
        })
        .await
    }

    async fn find_favorites_list(
        &self,
        user_id: Uuid,
    ) -> Result<Option<FavoritesList>, StoreError> {
        self.run(move |conn| {
            Ok(favorites::table
                .filter(favorites::user_id.eq(user_id))
                .select(FavoritesRow::as_select())
                .first(conn)
                .optional()?
                .map(FavoritesList::from))
        })
        .await
    }

    async fn get_or_create_favorites_list(
        &self,
        user_id: Uuid,
    ) -> Result<FavoritesList, StoreError> {
        self.run(move |conn| {
            diesel::insert_into(favorites::table)
                .values(favorites::user_id.eq(user_id))
                .on_conflict(favorites::user_id)
                .do_nothing()
                .execute(conn)?;
            let row: FavoritesRow = favorites::table
                .filter(favorites::user_id.eq(user_id))
                .select(FavoritesRow::as_select())
                .first(conn)?;
            Ok(row.into())
        })
        .await
    }

    async fn find_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<FavoriteItem>, StoreError> {
        self.run(move |conn| {
            Ok(favorite_items::table
                .filter(favorite_items::favorite_id.eq(favorite_id))
                .filter(favorite_items::recipe_id.eq(recipe_id))
                .select(FavoriteItemRow::as_select())
                .first(conn)
                .optional()?
                .map(FavoriteItem::from))
        })
        .await
    }

    async fn insert_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<FavoriteItem, StoreError> {
        self.run(move |conn| {
            diesel::insert_into(favorite_items::table)
                .values((
                    favorite_items::favorite_id.eq(favorite_id),
                    favorite_items::recipe_id.eq(recipe_id),
                ))
                .on_conflict((favorite_items::favorite_id, favorite_items::recipe_id))
                .do_nothing()
                .execute(conn)?;
            let row: FavoriteItemRow = favorite_items::table
                .filter(favorite_items::favorite_id.eq(favorite_id))
                .filter(favorite_items::recipe_id.eq(recipe_id))
                .select(FavoriteItemRow::as_select())
                .first(conn)?;
            Ok(row.into())
        })
        .await
    }

    async fn delete_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<u64, StoreError> {
        self.run(move |conn| {
            let deleted = diesel::delete(
                favorite_items::table
                    .filter(favorite_items::favorite_id.eq(favorite_id))
                    .filter(favorite_items::recipe_id.eq(recipe_id)),
            )
            .execute(conn)?;
            Ok(deleted as u64)
        })
        .await
    }

    async fn favorite_items(&self, favorite_id: Uuid) -> Result<Vec<FavoriteItem>, StoreError> {
        self.run(move |conn| {
            let rows: Vec<FavoriteItemRow> = favorite_items::table
                .filter(favorite_items::favorite_id.eq(favorite_id))
                .order(favorite_items::created_at.desc())
                .select(FavoriteItemRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(FavoriteItem::from).collect())
        })
        .await
    }

    async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, StoreError> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));
        self.run(move |conn| {
            let mut query = products::table
                .left_join(product_categories::table)
                .select((
                    products::id,
                    products::title,
                    products::price,
                    products::quality,
                    product_categories::name.nullable(),
                ))
                .order(products::title.asc())
                .into_boxed();
            if let Some(pattern) = pattern {
                query = query.filter(products::title.ilike(pattern));
            }
            let rows: Vec<ProductTuple> = query.load(conn)?;
            Ok(rows.into_iter().map(into_product).collect())
        })
        .await
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError> {
        let ids = ids.to_vec();
        self.run(move |conn| {
            let rows: Vec<ProductTuple> = products::table
                .left_join(product_categories::table)
                .filter(products::id.eq_any(&ids))
                .select((
                    products::id,
                    products::title,
                    products::price,
                    products::quality,
                    product_categories::name.nullable(),
                ))
                .load(conn)?;
            Ok(rows.into_iter().map(into_product).collect())
        })
        .await
    }

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError> {
        self.run(move |conn| {
            Ok(carts::table
                .filter(carts::user_id.eq(user_id))
                .select(CartRow::as_select())
                .first(conn)
                .optional()?
                .map(Cart::from))
        })
        .await
    }

    async fn get_or_create_cart(&self, user_id: Uuid) -> Result<Cart, StoreError> {
        self.run(move |conn| {
            diesel::insert_into(carts::table)
                .values(carts::user_id.eq(user_id))
                .on_conflict(carts::user_id)
                .do_nothing()
                .execute(conn)?;
            let row: CartRow = carts::table
                .filter(carts::user_id.eq(user_id))
                .select(CartRow::as_select())
                .first(conn)?;
            Ok(row.into())
        })
        .await
    }

    async fn cart_items(&self, cart_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        self.run(move |conn| {
            let rows: Vec<CartItemRow> = cart_items::table
                .filter(cart_items::cart_id.eq(cart_id))
                .order(cart_items::created_at.asc())
                .select(CartItemRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(CartItem::from).collect())
        })
        .await
    }

    async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<CartItem, StoreError> {
        self.run(move |conn| {
            let row: CartItemRow = diesel::insert_into(cart_items::table)
                .values((
                    cart_items::cart_id.eq(cart_id),
                    cart_items::product_id.eq(product_id),
                    cart_items::quantity.eq(1),
                ))
                .on_conflict((cart_items::cart_id, cart_items::product_id))
                .do_update()
                .set(cart_items::quantity.eq(cart_items::quantity + 1))
                .returning(CartItemRow::as_returning())
                .get_result(conn)?;
            Ok(row.into())
        })
        .await
    }

    async fn delete_cart_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<u64, StoreError> {
        self.run(move |conn| {
            let deleted = diesel::delete(
                cart_items::table
                    .filter(cart_items::cart_id.eq(cart_id))
                    .filter(cart_items::id.eq(item_id)),
            )
            .execute(conn)?;
            Ok(deleted as u64)
        })
        .await
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
