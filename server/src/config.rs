use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use kochbuch_core::image::MAX_FILE_SIZE;
use tracing::{info, warn};

const DEV_SIGNING_SECRET: &str = "kochbuch-dev-signing-secret";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind: SocketAddr,
    /// Base of the signed URLs handed out for stored images.
    pub public_url: String,
    pub storage_dir: PathBuf,
    pub signing_secret: String,
    /// Request body limit for multipart uploads.
    pub max_upload_bytes: usize,
    pub track_query_count: bool,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let bind: SocketAddr = try_load(&lookup, "KOCHBUCH_BIND", "0.0.0.0:3000")?;
        let public_url: String =
            try_load(&lookup, "KOCHBUCH_PUBLIC_URL", &format!("http://localhost:{}", bind.port()))?;
        let storage_dir: PathBuf = try_load(&lookup, "KOCHBUCH_STORAGE_DIR", "./data/storage")?;
        let max_upload_bytes: usize = try_load(
            &lookup,
            "KOCHBUCH_MAX_UPLOAD_BYTES",
            &(MAX_FILE_SIZE + 1024 * 1024).to_string(),
        )?;

        let track_query_count = lookup("TRACK_DB_QUERY_COUNT")
            .map(|v| flag_enabled(&v))
            .unwrap_or(false);

        let signing_secret = lookup("KOCHBUCH_SIGNING_SECRET").unwrap_or_else(|| {
            warn!("KOCHBUCH_SIGNING_SECRET not set, using the development secret");
            DEV_SIGNING_SECRET.to_string()
        });

        Ok(Self {
            database_url,
            bind,
            public_url: public_url.trim_end_matches('/').to_string(),
            storage_dir,
            signing_secret,
            max_upload_bytes,
            track_query_count,
        })
    }
}

/// `1` or `true` (any case) switch a flag on; anything else leaves it off.
fn flag_enabled(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(config.bind, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.public_url, "http://localhost:3000");
        assert_eq!(config.signing_secret, DEV_SIGNING_SECRET);
        assert_eq!(config.max_upload_bytes, MAX_FILE_SIZE + 1024 * 1024);
        assert!(!config.track_query_count);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("KOCHBUCH_BIND", "127.0.0.1:8080"),
            ("KOCHBUCH_PUBLIC_URL", "https://kochbuch.example/"),
            ("KOCHBUCH_SIGNING_SECRET", "s3cret"),
            ("TRACK_DB_QUERY_COUNT", "1"),
        ]))
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.public_url, "https://kochbuch.example");
        assert_eq!(config.signing_secret, "s3cret");
        assert!(config.track_query_count);
    }

    #[test]
    fn test_query_count_flag_values() {
        for (value, expected) in [
            ("1", true),
            ("TRUE", true),
            ("true", true),
            ("0", false),
            ("no", false),
        ] {
            let config = Config::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://x"),
                ("TRACK_DB_QUERY_COUNT", value),
            ]))
            .unwrap();
            assert_eq!(config.track_query_count, expected, "value {value}");
        }
    }

    #[test]
    fn test_missing_and_invalid() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("KOCHBUCH_BIND", "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "KOCHBUCH_BIND", .. }));
    }
}
