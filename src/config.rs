//! Configuration management for the Spotify session controller.
//!
//! This module handles loading configuration values from environment
//! variables and `.env` files and turns them into a typed [`Config`] that is
//! constructed once at startup and handed to every component that needs it.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, net::SocketAddr, path::PathBuf};

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_SCOPE: &str =
    "user-read-playback-state user-modify-playback-state user-top-read";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

const APP_DIR: &str = "sporlplay";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid URL: {message}")]
    InvalidUrl { name: &'static str, message: String },
    #[error("SERVER_ADDRESS is not a valid socket address: {0}")]
    InvalidServerAddress(String),
    #[error("cannot prepare data directory: {0}")]
    DataDir(String),
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory structure if it doesn't exist. The file is looked
/// up at:
/// - Linux: `~/.local/share/sporlplay/.env`
/// - macOS: `~/Library/Application Support/sporlplay/.env`
/// - Windows: `%LOCALAPPDATA%/sporlplay/.env`
///
/// A missing `.env` file is not an error; the process environment may carry
/// everything on its own.
pub async fn load_env() -> Result<(), ConfigError> {
    let mut path = data_dir();
    path.push(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::DataDir(e.to_string()))?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    }
    Ok(())
}

/// Returns the application's local data directory.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Typed runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: Url,
    pub server_address: SocketAddr,
    pub scope: String,
    pub auth_url: Url,
    pub token_url: Url,
    pub api_url: Url,
    pub token_path: PathBuf,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// `SPOTIFY_API_AUTH_CLIENT_ID` and `SPOTIFY_API_REDIRECT_URI` are
    /// required, everything else falls back to the Spotify defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = required("SPOTIFY_API_AUTH_CLIENT_ID")?;
        let redirect_uri = parse_url(
            "SPOTIFY_API_REDIRECT_URI",
            &required("SPOTIFY_API_REDIRECT_URI")?,
        )?;

        let server_address = optional("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS);
        let server_address = server_address
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidServerAddress(server_address))?;

        let mut token_path = data_dir();
        token_path.push("cache/token.json");

        Ok(Self {
            client_id,
            redirect_uri,
            server_address,
            scope: optional("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
            auth_url: parse_url(
                "SPOTIFY_API_AUTH_URL",
                &optional("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            )?,
            token_url: parse_url(
                "SPOTIFY_API_TOKEN_URL",
                &optional("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            )?,
            api_url: parse_url(
                "SPOTIFY_API_URL",
                &optional("SPOTIFY_API_URL", DEFAULT_API_URL),
            )?,
            token_path,
        })
    }

    /// The registered callback URL. Its scheme and origin are what incoming
    /// redirects are validated against.
    pub fn callback_url(&self) -> &Url {
        &self.redirect_uri
    }

    /// Joins an API path onto the configured Web API base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{base}/{path}",
            base = self.api_url.as_str().trim_end_matches('/'),
            path = path.trim_start_matches('/')
        )
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        name,
        message: e.to_string(),
    })
}
