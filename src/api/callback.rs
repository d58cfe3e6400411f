use std::sync::Arc;

use axum::{Extension, extract::OriginalUri, response::Html};

use crate::{
    session::{SessionController, SessionError},
    spotify::{AuthorizationError, SpotifyApi},
};

/// Receives Spotify's redirect and completes the login.
///
/// The full redirect URL is rebuilt from the registered callback URL and
/// the request's query string before it goes through the authorization
/// flow.
pub async fn callback<A: SpotifyApi + 'static>(
    OriginalUri(uri): OriginalUri,
    Extension(controller): Extension<Arc<SessionController<A>>>,
) -> Html<&'static str> {
    let mut redirect = controller.callback_url().clone();
    redirect.set_query(uri.query());

    match controller.handle_redirect(&redirect).await {
        Ok(()) => Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>"),
        Err(SessionError::Authorization(AuthorizationError::AccessDenied)) => {
            Html("<h4>Authorization request denied.</h4>")
        }
        Err(SessionError::TokenRetrievalInProgress) => {
            Html("<h4>Login already in progress.</h4>")
        }
        Err(SessionError::LogoutInProgress) => Html("<h4>Logout in progress, try again.</h4>"),
        Err(_) => Html("<h4>Login failed.</h4>"),
    }
}
