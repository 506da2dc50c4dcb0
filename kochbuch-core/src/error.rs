use thiserror::Error;

/// Failure reported by a relational store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Query failed: {0}")]
    Query(String),
}

/// Failure reported by an object storage implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{path}")]
    NotFound { bucket: String, path: String },

    #[error("Object already exists: {bucket}/{path}")]
    AlreadyExists { bucket: String, path: String },

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),
}

/// Failure reported by an identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Session expired or unknown")]
    InvalidSession,

    #[error("Identity provider failed: {0}")]
    Provider(String),
}

/// Result type of every data-access function.
///
/// Not-found, ownership and transport failures are distinct variants so that
/// callers can react to each one instead of receiving an empty sentinel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("Not the owner of this resource")]
    Unauthorized,

    #[error("Login required")]
    Unauthenticated,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl DataError {
    pub fn validation(message: impl Into<String>) -> Self {
        DataError::Validation(message.into())
    }
}
