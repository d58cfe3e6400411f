use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;
use reqwest::Client;

use crate::{
    config::Config,
    spotify::{self, ApiError},
    types::Token,
};

/// Seconds before the nominal expiry at which a token is already treated as
/// expired.
pub const REFRESH_MARGIN_SECS: u64 = 240;

/// Owns the OAuth token and its on-disk copy.
pub struct TokenManager {
    token: Token,
    path: PathBuf,
}

impl TokenManager {
    pub fn new(token: Token, path: impl Into<PathBuf>) -> Self {
        TokenManager {
            token,
            path: path.into(),
        }
    }

    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token, path })
    }

    pub async fn persist(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Removes the cached token file. A file that is already gone is fine.
    pub async fn clear(path: &Path) -> Result<(), String> {
        match async_fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Returns an access token that is valid for at least the refresh
    /// margin, refreshing and persisting it first when needed.
    pub async fn get_valid_token(
        &mut self,
        http: &Client,
        config: &Config,
    ) -> Result<String, ApiError> {
        if self.is_expired() {
            let refreshed =
                spotify::auth::refresh_token(http, config, &self.token.refresh_token).await?;
            self.token = refreshed;
            self.persist().await.map_err(ApiError::Storage)?;
        }

        Ok(self.token.access_token.clone())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp() as u64)
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        let expires_at = self.token.obtained_at + self.token.expires_in;
        now >= expires_at.saturating_sub(REFRESH_MARGIN_SECS)
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
