use crate::models::{Account, NewSession};
use crate::schema::{accounts, sessions};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::crypto::{generate_token, hash_token};

pub fn create_session(
    conn: &mut PgConnection,
    account_id: Uuid,
    ttl: Duration,
) -> Result<(String, DateTime<Utc>), diesel::result::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + ttl;

    diesel::insert_into(sessions::table)
        .values(&NewSession {
            account_id,
            token_hash: &token_hash,
            expires_at,
        })
        .execute(conn)?;

    Ok((token, expires_at))
}

/// Account behind an unexpired session token.
pub fn account_for_token(
    conn: &mut PgConnection,
    token: &str,
) -> Result<Option<Uuid>, diesel::result::Error> {
    sessions::table
        .filter(sessions::token_hash.eq(hash_token(token)))
        .filter(sessions::expires_at.gt(Utc::now()))
        .select(sessions::account_id)
        .first(conn)
        .optional()
}

pub fn delete_session(
    conn: &mut PgConnection,
    token: &str,
) -> Result<usize, diesel::result::Error> {
    diesel::delete(sessions::table.filter(sessions::token_hash.eq(hash_token(token))))
        .execute(conn)
}

pub fn find_account(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<Account>, diesel::result::Error> {
    accounts::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(email) = LOWER(")
                .bind::<diesel::sql_types::Text, _>(email)
                .sql(")"),
        )
        .select(Account::as_select())
        .first(conn)
        .optional()
}
