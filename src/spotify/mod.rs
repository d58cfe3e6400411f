//! # Spotify Integration Module
//!
//! This module is the boundary between the session core and the Spotify Web
//! API. The core never talks HTTP itself: it drives the operations of the
//! [`SpotifyApi`] trait, and [`SpotifyClient`] implements them on top of
//! `reqwest`.
//!
//! ## Architecture
//!
//! ```text
//! Session Core (login flow, device resolver, playback, top tracks)
//!          ↓
//! SpotifyApi trait
//!          ↓
//! SpotifyClient
//!     ├── Authentication (authorization code + PKCE, CSRF state check)
//!     ├── Player (devices, start playback)
//!     └── Tracks (current user's top tracks)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Error Types
//!
//! - [`ApiError`] for every regular Web API call
//! - [`AuthorizationError`] for the code exchange, which distinguishes a user
//!   who declined from every other failure
//!
//! ## Rate Limiting
//!
//! Read requests retry on `502 Bad Gateway` and honour `Retry-After` on
//! `429 Too Many Requests` up to two minutes. Playback commands are never
//! retried; their failure goes straight back to the caller.

use std::{future::Future, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::{sync::Mutex, time::sleep};

use crate::{
    config::Config,
    management::TokenManager,
    types::{Device, Page, PlaybackRequest, TimeRange, Track},
    utils, warning,
};

pub mod auth;
pub mod player;
pub mod tracks;

const BAD_GATEWAY_PAUSE: Duration = Duration::from_secs(10);
const MAX_READ_ATTEMPTS: u32 = 3;
const MAX_RETRY_AFTER_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Spotify responded with {status}: {message}")]
    Service { status: u16, message: String },
    #[error("not logged in, run `sporlplay auth` first")]
    NotAuthorized,
    #[error("cannot store token: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("the authorization request was denied")]
    AccessDenied,
    #[error("{0}")]
    TokenExchangeFailed(String),
}

/// The Web API operations the session core depends on.
///
/// Implementations own transport, token storage and refresh.
/// `request_access_and_refresh_tokens` must reject a redirect whose `state`
/// differs from `expected_state`, or any redirect when no state was issued,
/// and must not persist tokens in that case.
pub trait SpotifyApi: Send + Sync {
    /// Sends the user to the authorization page with `state` attached.
    fn authorize(&self, state: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn request_access_and_refresh_tokens(
        &self,
        redirect: &Url,
        expected_state: Option<&str>,
    ) -> impl Future<Output = Result<(), AuthorizationError>> + Send;

    /// Forgets all tokens. Calling it without tokens is a no-op.
    fn deauthorize(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn is_authorized(&self) -> impl Future<Output = bool> + Send;

    fn available_devices(&self) -> impl Future<Output = Result<Vec<Device>, ApiError>> + Send;

    fn play(
        &self,
        request: &PlaybackRequest,
        device_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn current_user_top_tracks(
        &self,
        time_range: TimeRange,
        offset: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Page<Track>, ApiError>> + Send;
}

/// `reqwest` backed [`SpotifyApi`].
pub struct SpotifyClient {
    http: Client,
    config: Config,
    token: Mutex<Option<TokenManager>>,
    code_verifier: Mutex<Option<String>>,
}

impl SpotifyClient {
    /// Creates a client without tokens.
    pub fn new(config: Config) -> Self {
        Self {
            http: Client::new(),
            config,
            token: Mutex::new(None),
            code_verifier: Mutex::new(None),
        }
    }

    /// Creates a client and picks up the token cached by a previous login,
    /// if there is a readable one.
    pub async fn restore(config: Config) -> Self {
        let token = TokenManager::load(config.token_path.clone()).await.ok();
        Self {
            token: Mutex::new(token),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Expiry of the held token as a unix timestamp.
    pub async fn token_expires_at(&self) -> Option<u64> {
        self.token.lock().await.as_ref().map(|manager| {
            let token = manager.current_token();
            token.obtained_at + token.expires_in
        })
    }

    async fn access_token(&self) -> Result<String, ApiError> {
        let mut lock = self.token.lock().await;
        match lock.as_mut() {
            Some(manager) => manager.get_valid_token(&self.http, &self.config).await,
            None => Err(ApiError::NotAuthorized),
        }
    }

    /// GETs `path` and decodes the JSON body, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let token = self.access_token().await?;
            let response = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(token)
                .send()
                .await?;

            if attempt < MAX_READ_ATTEMPTS {
                if response.status() == StatusCode::BAD_GATEWAY {
                    sleep(BAD_GATEWAY_PAUSE).await;
                    continue;
                }

                if response.status() == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = retry_after_secs(&response);
                    if retry_after <= MAX_RETRY_AFTER_SECS {
                        sleep(Duration::from_secs(retry_after)).await;
                        continue;
                    }
                    warning!(
                        "Retry after has reached an abnormal high of {} seconds. Try again later.",
                        retry_after
                    );
                }
            }

            let response = check_status(response).await?;
            return Ok(response.json::<T>().await?);
        }
    }

    /// Sends an authorized request once, without retries.
    async fn send_once(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        check_status(response).await
    }
}

impl SpotifyApi for SpotifyClient {
    async fn authorize(&self, state: &str) -> Result<(), ApiError> {
        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);
        *self.code_verifier.lock().await = Some(code_verifier);

        let auth_url = auth::authorize_url(&self.config, state, &code_challenge);
        if webbrowser::open(auth_url.as_str()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            );
        }
        Ok(())
    }

    async fn request_access_and_refresh_tokens(
        &self,
        redirect: &Url,
        expected_state: Option<&str>,
    ) -> Result<(), AuthorizationError> {
        let code = auth::parse_redirect(redirect, expected_state)?;

        let verifier = self.code_verifier.lock().await.take().ok_or_else(|| {
            AuthorizationError::TokenExchangeFailed(
                "no code verifier for this authorization request".to_string(),
            )
        })?;

        let token = auth::exchange_code_pkce(&self.http, &self.config, &code, &verifier)
            .await
            .map_err(|e| AuthorizationError::TokenExchangeFailed(e.to_string()))?;

        let manager = TokenManager::new(token, self.config.token_path.clone());
        manager
            .persist()
            .await
            .map_err(AuthorizationError::TokenExchangeFailed)?;
        *self.token.lock().await = Some(manager);

        Ok(())
    }

    async fn deauthorize(&self) -> Result<(), ApiError> {
        self.token.lock().await.take();
        self.code_verifier.lock().await.take();
        TokenManager::clear(&self.config.token_path)
            .await
            .map_err(ApiError::Storage)
    }

    async fn is_authorized(&self) -> bool {
        self.token.lock().await.is_some()
    }

    async fn available_devices(&self) -> Result<Vec<Device>, ApiError> {
        player::get_devices(self).await
    }

    async fn play(&self, request: &PlaybackRequest, device_id: &str) -> Result<(), ApiError> {
        player::start_playback(self, request, device_id).await
    }

    async fn current_user_top_tracks(
        &self,
        time_range: TimeRange,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Track>, ApiError> {
        tracks::get_top_tracks(self, time_range, offset, limit).await
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Turns a non-success response into [`ApiError::Service`], keeping
/// Spotify's own error message when the body carries one.
pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Service {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        }),
    })
}

/// Extracts the message from either error shape Spotify uses:
/// `{"error": {"status", "message"}}` on the Web API and
/// `{"error", "error_description"}` on the accounts service.
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match &json["error"] {
        Value::Object(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::String(error) => Some(
            json["error_description"]
                .as_str()
                .unwrap_or(error)
                .to_string(),
        ),
        _ => None,
    }
}
