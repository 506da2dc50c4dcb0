//! Ports to the hosted collaborators: identity provider, relational store
//! and object storage.
//!
//! Each port is an async trait so the data-access layer can run against the
//! Postgres/filesystem implementations in the server or against the
//! in-memory implementations in [`memory`].

mod identity;
pub mod memory;
mod storage;
mod store;

pub use identity::{
    AuthEvent, AuthSession, AuthSubscription, IdentityProvider, LocalSessionClient, SessionClient,
    SignUp,
};
pub use memory::{MemoryBackend, MemoryIdentity, MemoryStorage, MemoryStore};
pub use storage::{validate_object_path, ObjectStorage, StoredObject, UploadOptions};
pub use store::{Cart, CartItem, RecipeRow, Store};
