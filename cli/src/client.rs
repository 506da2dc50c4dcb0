//! HTTP client for the kochbuch server API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kochbuch_core::{
    AuthError, AuthSession, CartView, Category, DataError, Identity, Product, Profile,
    ProfileChanges, Recipe, RecipeDraft, RecipeSource, SignUp, StoreError,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    token: String,
    user: Identity,
    expires_at: DateTime<Utc>,
}

impl From<SessionBody> for AuthSession {
    fn from(body: SessionBody) -> Self {
        AuthSession {
            access_token: body.token,
            user: body.user,
            expires_at: body.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecipesBody {
    recipes: Vec<Recipe>,
}

#[derive(Debug, Deserialize)]
struct CategoriesBody {
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct ProductsBody {
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct FavoriteBody {
    favorite: bool,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PingBody {
    message: String,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct AddItemBody {
    product_id: Uuid,
}

/// Map an error status and its message onto the data-access error.
pub fn status_error(status: StatusCode, message: String) -> DataError {
    match status {
        StatusCode::BAD_REQUEST => DataError::Validation(message),
        StatusCode::UNAUTHORIZED => DataError::Unauthenticated,
        StatusCode::FORBIDDEN => DataError::Unauthorized,
        StatusCode::NOT_FOUND => DataError::NotFound,
        StatusCode::CONFLICT => DataError::Conflict(message),
        other => DataError::Store(StoreError::Unavailable(format!("{}: {}", other, message))),
    }
}

fn transport(e: reqwest::Error) -> DataError {
    DataError::Store(StoreError::Unavailable(e.to_string()))
}

/// Auth endpoints answer 401/409 for credential problems; keep those typed.
fn auth_error(e: DataError) -> AuthError {
    match e {
        DataError::Unauthenticated => AuthError::InvalidCredentials,
        DataError::Conflict(_) => AuthError::EmailTaken,
        DataError::Auth(e) => e,
        other => AuthError::Provider(other.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// A copy of this client that sends the given bearer token.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, DataError> {
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(status_error(status, message))
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, DataError> {
        self.send(builder).await?.json().await.map_err(transport)
    }

    pub async fn ping(&self) -> Result<String, DataError> {
        let body: PingBody = self
            .json(self.request(Method::GET, "/api/test/unauthed-ping"))
            .await?;
        Ok(body.message)
    }

    pub async fn sign_up(&self, request: &SignUp) -> Result<AuthSession, AuthError> {
        let body: SessionBody = self
            .json(self.request(Method::POST, "/api/auth/signup").json(request))
            .await
            .map_err(auth_error)?;
        Ok(body.into())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let body: SessionBody = self
            .json(
                self.request(Method::POST, "/api/auth/login")
                    .json(&LoginBody { email, password }),
            )
            .await
            .map_err(auth_error)?;
        Ok(body.into())
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match self
            .send(self.request(Method::POST, "/api/auth/logout"))
            .await
        {
            // Already gone on the server side.
            Ok(_) | Err(DataError::Unauthenticated) => Ok(()),
            Err(e) => Err(auth_error(e)),
        }
    }

    /// The user behind this client's token, or `None` when the server rejects it.
    pub async fn session_user(&self) -> Result<Option<Identity>, AuthError> {
        match self
            .json(self.request(Method::GET, "/api/auth/session"))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(DataError::Unauthenticated) => Ok(None),
            Err(e) => Err(auth_error(e)),
        }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, DataError> {
        let body: CategoriesBody = self
            .json(self.request(Method::GET, "/api/categories"))
            .await?;
        Ok(body.categories)
    }

    pub async fn recipes(&self) -> Result<Vec<Recipe>, DataError> {
        let body: RecipesBody = self
            .json(self.request(Method::GET, "/api/recipes"))
            .await?;
        Ok(body.recipes)
    }

    pub async fn my_recipes(&self) -> Result<Vec<Recipe>, DataError> {
        let body: RecipesBody = self
            .json(self.request(Method::GET, "/api/me/recipes"))
            .await?;
        Ok(body.recipes)
    }

    pub async fn recipe(&self, id: Uuid) -> Result<Recipe, DataError> {
        self.json(self.request(Method::GET, &format!("/api/recipes/{}", id)))
            .await
    }

    pub async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, DataError> {
        self.json(self.request(Method::POST, "/api/recipes").json(draft))
            .await
    }

    pub async fn update_recipe(&self, id: Uuid, draft: &RecipeDraft) -> Result<Recipe, DataError> {
        self.json(
            self.request(Method::PUT, &format!("/api/recipes/{}", id))
                .json(draft),
        )
        .await
    }

    pub async fn delete_recipe(&self, id: Uuid) -> Result<(), DataError> {
        self.send(self.request(Method::DELETE, &format!("/api/recipes/{}", id)))
            .await?;
        Ok(())
    }

    pub async fn favorites(&self) -> Result<Vec<Recipe>, DataError> {
        let body: RecipesBody = self
            .json(self.request(Method::GET, "/api/favorites"))
            .await?;
        Ok(body.recipes)
    }

    pub async fn is_favorite(&self, recipe_id: Uuid) -> Result<bool, DataError> {
        let body: FavoriteBody = self
            .json(self.request(Method::GET, &format!("/api/favorites/{}", recipe_id)))
            .await?;
        Ok(body.favorite)
    }

    pub async fn add_favorite(&self, recipe_id: Uuid) -> Result<(), DataError> {
        self.send(self.request(Method::PUT, &format!("/api/favorites/{}", recipe_id)))
            .await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, recipe_id: Uuid) -> Result<(), DataError> {
        self.send(self.request(Method::DELETE, &format!("/api/favorites/{}", recipe_id)))
            .await?;
        Ok(())
    }

    pub async fn profile(&self) -> Result<Profile, DataError> {
        self.json(self.request(Method::GET, "/api/profile")).await
    }

    pub async fn update_profile(&self, changes: &ProfileChanges) -> Result<Profile, DataError> {
        self.json(self.request(Method::PATCH, "/api/profile").json(changes))
            .await
    }

    fn file_form(file_name: &str, data: Vec<u8>) -> Form {
        Form::new().part("file", Part::bytes(data).file_name(file_name.to_string()))
    }

    pub async fn upload_profile_photo(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Profile, DataError> {
        self.json(
            self.request(Method::POST, "/api/profile/photo")
                .multipart(Self::file_form(file_name, data)),
        )
        .await
    }

    /// Store a recipe image and return its signed URL.
    pub async fn upload_recipe_image(
        &self,
        recipe_id: Option<Uuid>,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<String, DataError> {
        let mut form = Self::file_form(file_name, data);
        if let Some(id) = recipe_id {
            form = form.text("recipe_id", id.to_string());
        }
        let body: UploadBody = self
            .json(
                self.request(Method::POST, "/api/photos/recipe")
                    .multipart(form),
            )
            .await?;
        Ok(body.url)
    }

    pub async fn products(&self, search: Option<&str>) -> Result<Vec<Product>, DataError> {
        let mut builder = self.request(Method::GET, "/api/products");
        if let Some(q) = search {
            builder = builder.query(&[("q", q)]);
        }
        let body: ProductsBody = self.json(builder).await?;
        Ok(body.products)
    }

    pub async fn cart(&self) -> Result<CartView, DataError> {
        self.json(self.request(Method::GET, "/api/cart")).await
    }

    pub async fn add_to_cart(&self, product_id: Uuid) -> Result<CartView, DataError> {
        self.json(
            self.request(Method::POST, "/api/cart/items")
                .json(&AddItemBody { product_id }),
        )
        .await
    }

    pub async fn remove_cart_item(&self, item_id: Uuid) -> Result<CartView, DataError> {
        self.json(self.request(Method::DELETE, &format!("/api/cart/items/{}", item_id)))
            .await
    }
}

#[async_trait]
impl RecipeSource for ApiClient {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, DataError> {
        self.recipes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, "Name is required".into()),
            DataError::Validation("Name is required".into())
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            DataError::Unauthorized
        );
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            DataError::Unauthenticated
        );
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "down".into()),
            DataError::Store(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            auth_error(DataError::Unauthenticated),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth_error(DataError::Conflict("taken".into())),
            AuthError::EmailTaken
        );
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
