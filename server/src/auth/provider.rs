//! Identity provider backed by the `accounts`, `sessions` and `profiles`
//! tables.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use kochbuch_core::{AuthError, AuthSession, Identity, IdentityProvider, Profile, SignUp};
use uuid::Uuid;

use super::crypto::{hash_password, verify_password};
use super::db::{account_for_token, create_session, delete_session, find_account};
use crate::db::DbPool;
use crate::models::{NewAccount, NewProfile, ProfileRow};
use crate::schema::{accounts, profiles};

pub struct PgIdentity {
    pool: Arc<DbPool>,
    session_ttl: Duration,
}

impl PgIdentity {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            pool,
            session_ttl: Duration::days(30),
        }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, AuthError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let span = tracing::info_span!("db.query");
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let mut conn = pool
                .get()
                .map_err(|e| AuthError::Provider(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AuthError::Provider(e.to_string()))?
    }
}

fn provider_error(e: DieselError) -> AuthError {
    AuthError::Provider(e.to_string())
}

fn load_identity(conn: &mut PgConnection, id: Uuid) -> Result<Identity, AuthError> {
    let row: ProfileRow = profiles::table
        .find(id)
        .select(ProfileRow::as_select())
        .first(conn)
        .map_err(provider_error)?;
    Ok(Profile::from(row).identity())
}

#[async_trait]
impl IdentityProvider for PgIdentity {
    async fn sign_up(&self, request: SignUp) -> Result<AuthSession, AuthError> {
        let ttl = self.session_ttl;
        self.run(move |conn| {
            let password_hash = hash_password(&request.password).map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                AuthError::Provider("Failed to hash password".to_string())
            })?;

            // Account and profile row are created together.
            let result = conn.transaction(|conn| {
                let account_id: Uuid = diesel::insert_into(accounts::table)
                    .values(&NewAccount {
                        email: &request.email,
                        password_hash: &password_hash,
                    })
                    .returning(accounts::id)
                    .get_result(conn)?;

                diesel::insert_into(profiles::table)
                    .values(&NewProfile {
                        id: account_id,
                        username: &request.username,
                        first_name: &request.first_name,
                        last_name: &request.last_name,
                        email: &request.email,
                    })
                    .execute(conn)?;

                let (token, expires_at) = create_session(conn, account_id, ttl)?;
                Ok::<_, DieselError>((account_id, token, expires_at))
            });

            let (account_id, access_token, expires_at) = match result {
                Ok(created) => created,
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    return Err(AuthError::EmailTaken)
                }
                Err(e) => return Err(provider_error(e)),
            };

            tracing::info!(user_id = %account_id, "Account created");
            Ok(AuthSession {
                access_token,
                user: load_identity(conn, account_id)?,
                expires_at,
            })
        })
        .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.to_string();
        let password = password.to_string();
        let ttl = self.session_ttl;
        self.run(move |conn| {
            let account = find_account(conn, &email)
                .map_err(provider_error)?
                .ok_or(AuthError::InvalidCredentials)?;

            if !verify_password(&password, &account.password_hash) {
                return Err(AuthError::InvalidCredentials);
            }

            let (access_token, expires_at) =
                create_session(conn, account.id, ttl).map_err(provider_error)?;
            Ok(AuthSession {
                access_token,
                user: load_identity(conn, account.id)?,
                expires_at,
            })
        })
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let token = access_token.to_string();
        self.run(move |conn| {
            delete_session(conn, &token).map_err(provider_error)?;
            Ok(())
        })
        .await
    }

    async fn user(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
        let token = access_token.to_string();
        self.run(move |conn| {
            match account_for_token(conn, &token).map_err(provider_error)? {
                Some(id) => Ok(Some(load_identity(conn, id)?)),
                None => Ok(None),
            }
        })
        .await
    }
}
