//! Signed, time-limited object URLs.
//!
//! A signed URL has the shape
//! `<base>/storage/<bucket>/<path>?expires=<unix seconds>&token=<hex HMAC>`
//! where the HMAC-SHA256 covers bucket, path and expiry.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signed URL expired")]
    Expired,

    #[error("Invalid signature")]
    Invalid,
}

#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: String,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            secret: secret.as_ref().to_vec(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn mac(&self, bucket: &str, path: &str, expires: i64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(bucket.as_bytes());
        mac.update(b"\n");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    pub fn token(&self, bucket: &str, path: &str, expires: i64) -> String {
        hex::encode(self.mac(bucket, path, expires).finalize().into_bytes())
    }

    pub fn sign(&self, bucket: &str, path: &str, ttl: Duration, now: DateTime<Utc>) -> String {
        let expires = (now + ttl).timestamp();
        format!(
            "{}/storage/{}/{}?expires={}&token={}",
            self.base_url,
            bucket,
            path,
            expires,
            self.token(bucket, path, expires)
        )
    }

    pub fn verify(
        &self,
        bucket: &str,
        path: &str,
        expires: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let provided = hex::decode(token).map_err(|_| SignatureError::Invalid)?;
        self.mac(bucket, path, expires)
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        if now.timestamp() >= expires {
            return Err(SignatureError::Expired);
        }

        Ok(())
    }
}
