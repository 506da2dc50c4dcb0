//! In-memory implementations of the backend ports.
//!
//! These back the test suites and local experiments. They honour the same
//! contracts as the production implementations: multi-table writes happen
//! under a single lock, and uniqueness of favorites lists, carts, favorite
//! items and cart lines is enforced on insert.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::identity::{AuthSession, IdentityProvider, SignUp};
use super::storage::{validate_object_path, ObjectStorage, StoredObject, UploadOptions};
use super::store::{Cart, CartItem, RecipeRow, Store};
use crate::error::{AuthError, StorageError, StoreError};
use crate::kitchen::Kitchen;
use crate::signing::UrlSigner;
use crate::types::{
    Category, FavoriteItem, FavoritesList, Identity, Ingredient, Product, Profile, ProfileChanges,
    RecipeDraft,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    recipes: Vec<RecipeRow>,
    ingredients: Vec<Ingredient>,
    profiles: Vec<Profile>,
    favorites: Vec<FavoritesList>,
    favorite_items: Vec<FavoriteItem>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    cart_items: Vec<CartItem>,
}

impl Tables {
    fn ingredient_rows(recipe_id: Uuid, draft: &RecipeDraft, now: DateTime<Utc>) -> Vec<Ingredient> {
        draft
            .named_ingredients()
            .into_iter()
            .map(|i| Ingredient {
                id: Uuid::new_v4(),
                recipe_id,
                name: i.name,
                quantity: i.quantity,
                unit: i.unit,
                additional_info: i.additional_info,
                created_at: now,
            })
            .collect()
    }

    fn category_exists(&self, id: Uuid) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }
}

/// Newest first; rows with equal timestamps keep reverse insertion order.
fn newest_first(mut rows: Vec<RecipeRow>) -> Vec<RecipeRow> {
    rows.reverse();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(lock(&self.tables))
    }

    pub fn add_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        lock(&self.tables).categories.push(category.clone());
        category
    }

    pub fn add_product(
        &self,
        title: &str,
        price: Option<f64>,
        quality: Option<&str>,
        category: Option<&str>,
    ) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            title: title.to_string(),
            price,
            quality: quality.map(str::to_string),
            category: category.map(str::to_string),
        };
        lock(&self.tables).products.push(product.clone());
        product
    }

    /// Stand-in for the sign-up trigger that creates the profile row.
    pub fn insert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(StoreError::Constraint("profiles_pkey".to_string()));
        }
        tables.profiles.push(profile);
        Ok(())
    }

    /// Number of ingredient rows referencing `recipe_id`, deleted recipe or not.
    pub fn ingredient_count(&self, recipe_id: Uuid) -> usize {
        lock(&self.tables)
            .ingredients
            .iter()
            .filter(|i| i.recipe_id == recipe_id)
            .count()
    }

    pub fn favorites_list_count(&self, user_id: Uuid) -> usize {
        lock(&self.tables)
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .count()
    }

    pub fn favorite_item_count(&self, recipe_id: Uuid) -> usize {
        lock(&self.tables)
            .favorite_items
            .iter()
            .filter(|i| i.recipe_id == recipe_id)
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.tables()?.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        Ok(self
            .tables()?
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_recipes(&self, owner: Option<Uuid>) -> Result<Vec<RecipeRow>, StoreError> {
        let rows = self
            .tables()?
            .recipes
            .iter()
            .filter(|r| owner.map_or(true, |o| r.user_id == o))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn recipes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeRow>, StoreError> {
        Ok(self
            .tables()?
            .recipes
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn find_recipe(&self, id: Uuid) -> Result<Option<RecipeRow>, StoreError> {
        Ok(self.tables()?.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn ingredients_for(&self, recipe_ids: &[Uuid]) -> Result<Vec<Ingredient>, StoreError> {
        Ok(self
            .tables()?
            .ingredients
            .iter()
            .filter(|i| recipe_ids.contains(&i.recipe_id))
            .cloned()
            .collect())
    }

    async fn insert_recipe(
        &self,
        owner: Uuid,
        draft: &RecipeDraft,
    ) -> Result<(RecipeRow, Vec<Ingredient>), StoreError> {
        let mut tables = self.tables()?;
        if !tables.category_exists(draft.category_id) {
            return Err(StoreError::Constraint(
                "recipes_category_id_fkey".to_string(),
            ));
        }

        let now = Utc::now();
        let row = RecipeRow {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            servings: draft.servings,
            instructions: draft.instructions.clone(),
            image_url: draft.image_url.clone(),
            additional_info: draft.additional_info.clone(),
            category_id: draft.category_id,
            user_id: owner,
            created_at: now,
        };
        let ingredients = Tables::ingredient_rows(row.id, draft, now);

        tables.recipes.push(row.clone());
        tables.ingredients.extend(ingredients.iter().cloned());
        Ok((row, ingredients))
    }

    async fn replace_recipe(
        &self,
        id: Uuid,
        owner: Uuid,
        draft: &RecipeDraft,
    ) -> Result<Option<(RecipeRow, Vec<Ingredient>)>, StoreError> {
        let mut tables = self.tables()?;
        if !tables.category_exists(draft.category_id) {
            return Err(StoreError::Constraint(
                "recipes_category_id_fkey".to_string(),
            ));
        }

        let Some(row) = tables
            .recipes
            .iter_mut()
            .find(|r| r.id == id && r.user_id == owner)
        else {
            return Ok(None);
        };

        row.name = draft.name.clone();
        row.description = draft.description.clone();
        row.servings = draft.servings;
        row.instructions = draft.instructions.clone();
        row.image_url = draft.image_url.clone();
        row.additional_info = draft.additional_info.clone();
        row.category_id = draft.category_id;
        let row = row.clone();

        let ingredients = Tables::ingredient_rows(id, draft, Utc::now());
        tables.ingredients.retain(|i| i.recipe_id != id);
        tables.ingredients.extend(ingredients.iter().cloned());
        Ok(Some((row, ingredients)))
    }

    async fn delete_recipe(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.recipes.len();
        tables.recipes.retain(|r| !(r.id == id && r.user_id == owner));
        if tables.recipes.len() == before {
            return Ok(false);
        }
        tables.ingredients.retain(|i| i.recipe_id != id);
        tables.favorite_items.retain(|i| i.recipe_id != id);
        Ok(true)
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables()?.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        Ok(self
            .tables()?
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Profile>, StoreError> {
        let mut tables = self.tables()?;
        let Some(profile) = tables.profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(username) = &changes.username {
            profile.username = username.clone();
        }
        if let Some(first_name) = &changes.first_name {
            profile.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            profile.last_name = last_name.clone();
        }
        if let Some(image_url) = &changes.image_url {
            profile.image_url = Some(image_url.clone());
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn find_favorites_list(
        &self,
        user_id: Uuid,
    ) -> Result<Option<FavoritesList>, StoreError> {
        Ok(self
            .tables()?
            .favorites
            .iter()
            .find(|f| f.user_id == user_id)
            .cloned())
    }

    async fn get_or_create_favorites_list(
        &self,
        user_id: Uuid,
    ) -> Result<FavoritesList, StoreError> {
        let mut tables = self.tables()?;
        if let Some(existing) = tables.favorites.iter().find(|f| f.user_id == user_id) {
            return Ok(existing.clone());
        }
        let list = FavoritesList {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
        };
        tables.favorites.push(list.clone());
        Ok(list)
    }

    async fn find_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<FavoriteItem>, StoreError> {
        Ok(self
            .tables()?
            .favorite_items
            .iter()
            .find(|i| i.favorite_id == favorite_id && i.recipe_id == recipe_id)
            .cloned())
    }

    async fn insert_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<FavoriteItem, StoreError> {
        let mut tables = self.tables()?;
        if !tables.recipes.iter().any(|r| r.id == recipe_id) {
            return Err(StoreError::Constraint(
                "favorite_items_recipe_id_fkey".to_string(),
            ));
        }
        if let Some(existing) = tables
            .favorite_items
            .iter()
            .find(|i| i.favorite_id == favorite_id && i.recipe_id == recipe_id)
        {
            return Ok(existing.clone());
        }
        let item = FavoriteItem {
            id: Uuid::new_v4(),
            favorite_id,
            recipe_id,
            created_at: Utc::now(),
        };
        tables.favorite_items.push(item.clone());
        Ok(item)
    }

    async fn delete_favorite_item(
        &self,
        favorite_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.favorite_items.len();
        tables
            .favorite_items
            .retain(|i| !(i.favorite_id == favorite_id && i.recipe_id == recipe_id));
        Ok((before - tables.favorite_items.len()) as u64)
    }

    async fn favorite_items(&self, favorite_id: Uuid) -> Result<Vec<FavoriteItem>, StoreError> {
        let mut items: Vec<FavoriteItem> = self
            .tables()?
            .favorite_items
            .iter()
            .filter(|i| i.favorite_id == favorite_id)
            .cloned()
            .collect();
        items.reverse();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, StoreError> {
        let needle = search.map(str::to_lowercase);
        Ok(self
            .tables()?
            .products
            .iter()
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| p.title.to_lowercase().contains(n))
            })
            .cloned()
            .collect())
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .tables()?
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .tables()?
            .carts
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn get_or_create_cart(&self, user_id: Uuid) -> Result<Cart, StoreError> {
        let mut tables = self.tables()?;
        if let Some(existing) = tables.carts.iter().find(|c| c.user_id == user_id) {
            return Ok(existing.clone());
        }
        let cart = Cart {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
        };
        tables.carts.push(cart.clone());
        Ok(cart)
    }

    async fn cart_items(&self, cart_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        Ok(self
            .tables()?
            .cart_items
            .iter()
            .filter(|i| i.cart_id == cart_id)
            .cloned()
            .collect())
    }

    async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<CartItem, StoreError> {
        let mut tables = self.tables()?;
        if !tables.products.iter().any(|p| p.id == product_id) {
            return Err(StoreError::Constraint(
                "cart_items_product_id_fkey".to_string(),
            ));
        }
        if let Some(existing) = tables
            .cart_items
            .iter_mut()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id)
        {
            existing.quantity += 1;
            return Ok(existing.clone());
        }
        let item = CartItem {
            id: Uuid::new_v4(),
            cart_id,
            product_id,
            quantity: 1,
            created_at: Utc::now(),
        };
        tables.cart_items.push(item.clone());
        Ok(item)
    }

    async fn delete_cart_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.cart_items.len();
        tables
            .cart_items
            .retain(|i| !(i.cart_id == cart_id && i.id == item_id));
        Ok((before - tables.cart_items.len()) as u64)
    }
}

struct Account {
    id: Uuid,
    email: String,
    password: String,
}

#[derive(Default)]
struct IdentityState {
    accounts: Vec<Account>,
    // token -> (user id, expiry)
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
}

/// Identity provider fake. Passwords are compared verbatim.
pub struct MemoryIdentity {
    store: Arc<MemoryStore>,
    state: Mutex<IdentityState>,
    session_ttl: Duration,
}

impl MemoryIdentity {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            state: Mutex::new(IdentityState::default()),
            session_ttl: Duration::days(30),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    fn open_session(&self, user_id: Uuid) -> (String, DateTime<Utc>) {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + self.session_ttl;
        lock(&self.state)
            .sessions
            .insert(token.clone(), (user_id, expires_at));
        (token, expires_at)
    }

    async fn identity(&self, user_id: Uuid) -> Result<Identity, AuthError> {
        let profile = self
            .store
            .find_profile(user_id)
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .ok_or_else(|| AuthError::Provider("profile row missing".to_string()))?;
        Ok(profile.identity())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, request: SignUp) -> Result<AuthSession, AuthError> {
        let id = Uuid::new_v4();
        {
            let mut state = lock(&self.state);
            if state
                .accounts
                .iter()
                .any(|a| a.email.eq_ignore_ascii_case(&request.email))
            {
                return Err(AuthError::EmailTaken);
            }

            // The account only exists once its profile row does.
            let now = Utc::now();
            self.store
                .insert_profile(Profile {
                    id,
                    username: request.username,
                    first_name: request.first_name,
                    last_name: request.last_name,
                    email: request.email.clone(),
                    image_url: None,
                    created_at: now,
                    updated_at: now,
                })
                .map_err(|e| AuthError::Provider(e.to_string()))?;
            state.accounts.push(Account {
                id,
                email: request.email,
                password: request.password,
            });
        }

        let (access_token, expires_at) = self.open_session(id);
        Ok(AuthSession {
            access_token,
            user: self.identity(id).await?,
            expires_at,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user_id = lock(&self.state)
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
            .map(|a| a.id)
            .ok_or(AuthError::InvalidCredentials)?;

        let (access_token, expires_at) = self.open_session(user_id);
        Ok(AuthSession {
            access_token,
            user: self.identity(user_id).await?,
            expires_at,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        lock(&self.state).sessions.remove(access_token);
        Ok(())
    }

    async fn user(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
        let session = lock(&self.state).sessions.get(access_token).copied();
        match session {
            Some((user_id, expires_at)) if expires_at > Utc::now() => {
                Ok(Some(self.identity(user_id).await?))
            }
            _ => Ok(None),
        }
    }
}

/// Object storage fake keyed by `(bucket, path)`.
pub struct MemoryStorage {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    signer: UrlSigner,
}

impl MemoryStorage {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            signer,
        }
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    pub fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        validate_object_path(path)?;
        let key = (bucket.to_string(), path.to_string());
        let mut objects = lock(&self.objects);
        if !options.upsert && objects.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                bucket: key.0,
                path: key.1,
            });
        }
        objects.insert(
            key,
            StoredObject {
                data,
                content_type: options.content_type.clone(),
                cache_control: options.cache_control.clone(),
            },
        );
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let key = (bucket.to_string(), path.to_string());
        if !lock(&self.objects).contains_key(&key) {
            return Err(StorageError::NotFound {
                bucket: key.0,
                path: key.1,
            });
        }
        Ok(self.signer.sign(bucket, path, ttl, Utc::now()))
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<StoredObject, StorageError> {
        lock(&self.objects)
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
    }
}

/// The three in-memory ports wired together.
pub struct MemoryBackend {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentity>,
    pub storage: Arc<MemoryStorage>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new(store.clone()));
        let storage = Arc::new(MemoryStorage::new(UrlSigner::new(
            "memory-signing-secret",
            "http://localhost:3000",
        )));
        Self {
            store,
            identity,
            storage,
        }
    }

    pub fn kitchen(&self) -> Kitchen {
        Kitchen::new(self.store.clone(), self.storage.clone())
    }
}
