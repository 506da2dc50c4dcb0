pub mod backend;
pub mod cart;
pub mod error;
pub mod favorites;
pub mod forms;
pub mod image;
pub mod kitchen;
pub mod profile;
pub mod recipes;
pub mod routes;
pub mod session;
pub mod signing;
pub mod types;
pub mod uploads;

pub use backend::{
    AuthEvent, AuthSession, AuthSubscription, IdentityProvider, LocalSessionClient, MemoryBackend,
    MemoryIdentity, MemoryStorage, MemoryStore, ObjectStorage, SessionClient, SignUp, Store,
    StoredObject, UploadOptions,
};
pub use error::{AuthError, DataError, StorageError, StoreError};
pub use kitchen::Kitchen;
pub use routes::{Access, Route};
pub use session::{AppSnapshot, AppStore, RecipeSource, SessionHolder, SessionState};
pub use signing::UrlSigner;
pub use types::{
    CartLine, CartView, Category, CreatorSummary, FavoriteItem, FavoritesList, Identity,
    Ingredient, IngredientDraft, Product, Profile, ProfileChanges, Recipe, RecipeDraft,
};
