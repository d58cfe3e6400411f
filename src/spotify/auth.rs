use std::collections::HashMap;

use chrono::Utc;
use reqwest::{Client, Url};

use crate::{
    config::Config,
    spotify::{ApiError, AuthorizationError, check_status},
    types::{Token, TokenResponse},
};

/// Builds the URL of Spotify's authorization page for one login attempt.
///
/// `state` is echoed back on the redirect and checked by [`parse_redirect`];
/// `code_challenge` is the S256 PKCE challenge for the verifier that will be
/// sent with the code exchange.
pub fn authorize_url(config: &Config, state: &str, code_challenge: &str) -> Url {
    let mut url = config.auth_url.clone();
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", config.redirect_uri.as_str())
        .append_pair("code_challenge_method", "S256")
        .append_pair("code_challenge", code_challenge)
        .append_pair("scope", &config.scope)
        .append_pair("state", state);
    url
}

/// Validates an authorization redirect and returns its `code`.
///
/// The `state` query parameter must equal `expected_state`; a redirect is
/// rejected outright when no state was issued. Only after that check is an
/// `error` parameter interpreted: `access_denied` means the user declined,
/// anything else is reported with Spotify's description.
pub fn parse_redirect(
    redirect: &Url,
    expected_state: Option<&str>,
) -> Result<String, AuthorizationError> {
    let params: HashMap<String, String> = redirect.query_pairs().into_owned().collect();

    let Some(expected_state) = expected_state else {
        return Err(AuthorizationError::TokenExchangeFailed(
            "no authorization request is outstanding".to_string(),
        ));
    };

    match params.get("state") {
        Some(state) if state == expected_state => {}
        Some(_) => {
            return Err(AuthorizationError::TokenExchangeFailed(
                "the state parameter does not match the authorization request".to_string(),
            ));
        }
        None => {
            return Err(AuthorizationError::TokenExchangeFailed(
                "the redirect carries no state parameter".to_string(),
            ));
        }
    }

    if let Some(error) = params.get("error") {
        if error == "access_denied" {
            return Err(AuthorizationError::AccessDenied);
        }
        let description = params.get("error_description").unwrap_or(error);
        return Err(AuthorizationError::TokenExchangeFailed(description.clone()));
    }

    params.get("code").cloned().ok_or_else(|| {
        AuthorizationError::TokenExchangeFailed(
            "the redirect carries no authorization code".to_string(),
        )
    })
}

/// Exchanges an authorization code for an access token using PKCE.
///
/// The verifier must belong to the challenge sent with the authorization
/// request. Authorization codes are single use and expire after a few
/// minutes, so this runs right after the redirect arrives.
pub async fn exchange_code_pkce(
    http: &Client,
    config: &Config,
    code: &str,
    verifier: &str,
) -> Result<Token, ApiError> {
    let response = http
        .post(config.token_url.clone())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let json: TokenResponse = check_status(response).await?.json().await?;
    Ok(into_token(json, None))
}

/// Refreshes an expired access token using a refresh token.
///
/// Spotify may or may not rotate the refresh token; when the response
/// carries none, the current one stays valid and is kept.
pub async fn refresh_token(
    http: &Client,
    config: &Config,
    refresh_token: &str,
) -> Result<Token, ApiError> {
    let response = http
        .post(config.token_url.clone())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await?;

    let json: TokenResponse = check_status(response).await?.json().await?;
    Ok(into_token(json, Some(refresh_token)))
}

fn into_token(response: TokenResponse, previous_refresh_token: Option<&str>) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh_token.map(str::to_string))
            .unwrap_or_default(),
        scope: response.scope,
        expires_in: response.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(refresh_token: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "access".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            scope: "user-top-read".to_string(),
            expires_in: 3600,
        }
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let token = into_token(response(None), Some("old"));
        assert_eq!(token.refresh_token, "old");
        assert_eq!(token.access_token, "access");
    }

    #[test]
    fn test_refresh_takes_rotated_refresh_token() {
        let token = into_token(response(Some("new")), Some("old"));
        assert_eq!(token.refresh_token, "new");
    }
}
