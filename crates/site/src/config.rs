//! Environment-driven server configuration.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Port bound when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// Lifetime of signed blob URLs.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `PORT` is not a valid port number.
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),
    /// A configured secret is empty.
    #[error("{0} must not be empty when set")]
    EmptySecret(&'static str),
}

/// Settings read once at startup.
#[derive(Clone)]
pub struct ServerConfig {
    /// Listen port on `0.0.0.0`.
    pub port: u16,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory holding uploaded blobs.
    pub blob_root: PathBuf,
    /// Admin password; admin routes answer 503 when unset.
    pub admin_password: Option<String>,
    /// HMAC key for signed blob URLs.
    pub signing_key: Vec<u8>,
    /// Lifetime of signed blob URLs.
    pub signed_url_ttl: Duration,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("blob_root", &self.blob_root)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<set>"))
            .field("signed_url_ttl", &self.signed_url_ttl)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Reads `PORT`, `SITE_DATABASE_PATH`, `SITE_BLOB_ROOT`, `SITE_ADMIN_PASSWORD`, and
    /// `SITE_SIGNING_KEY` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let admin_password = match lookup("SITE_ADMIN_PASSWORD") {
            Some(password) if password.is_empty() => {
                return Err(ConfigError::EmptySecret("SITE_ADMIN_PASSWORD"))
            }
            other => other,
        };

        let signing_key = match lookup("SITE_SIGNING_KEY") {
            Some(key) if key.is_empty() => return Err(ConfigError::EmptySecret("SITE_SIGNING_KEY")),
            Some(key) => key.into_bytes(),
            None => rand::random::<[u8; 32]>().to_vec(),
        };

        Ok(Self {
            port,
            database_path: lookup("SITE_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("site.db")),
            blob_root: lookup("SITE_BLOB_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("blobs")),
            admin_password,
            signing_key,
            signed_url_ttl: SIGNED_URL_TTL,
        })
    }
}
