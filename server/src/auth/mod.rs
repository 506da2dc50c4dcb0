mod crypto;
mod db;
mod extractor;
mod middleware;
mod provider;

pub use extractor::{bearer_token, AuthRejection, AuthUser};
pub use middleware::require_auth;
pub use provider::PgIdentity;
