use std::sync::Arc;

use reqwest::Url;

use crate::{
    info,
    session::{Alerts, Session, SessionError, SessionState},
    spotify::SpotifyApi,
    success,
    types::AuthorizationStatus,
    utils, warning,
};

/// Drives login and logout:
///
/// ```text
/// unauthenticated --begin_login--> authorizing --handle_redirect ok--> authorized
///        ^                                                                 |
///        +------------------------------ logout ---------------------------+
/// ```
///
/// A failed redirect leaves the status where it was. Login, redirect
/// handling and logout never overlap: while tokens are being retrieved or a
/// logout is pending, the others are rejected with
/// [`SessionError::TokenRetrievalInProgress`] or
/// [`SessionError::LogoutInProgress`]. An authorized session has to log out
/// before it can log in again.
pub struct AuthorizationFlow<A> {
    api: Arc<A>,
    session: Arc<Session>,
    alerts: Alerts,
    callback_url: Url,
}

impl<A: SpotifyApi> AuthorizationFlow<A> {
    /// # Arguments
    ///
    /// * `api` - performs the authorization, exchange and de-authorization
    /// * `session` - the shared state this flow is the only writer of
    /// * `alerts` - where failures are published
    /// * `callback_url` - redirects must match its scheme, and its host and
    ///   port when it has a host
    pub fn new(api: Arc<A>, session: Arc<Session>, alerts: Alerts, callback_url: Url) -> Self {
        Self {
            api,
            session,
            alerts,
            callback_url,
        }
    }

    /// The registered redirect URI.
    pub fn callback_url(&self) -> &Url {
        &self.callback_url
    }

    /// Marks the session authorized when the API client still holds tokens
    /// from an earlier run.
    pub async fn restore(&self) -> AuthorizationStatus {
        if self.api.is_authorized().await {
            self.session.update(|s| {
                if s.authorization_status == AuthorizationStatus::Unauthenticated {
                    s.authorization_status = AuthorizationStatus::Authorized;
                }
            });
        }
        self.session.authorization_status()
    }

    /// Starts a login attempt with a fresh CSRF state and hands the user to
    /// Spotify's authorization page.
    ///
    /// Rejected with [`SessionError::AlreadyAuthorized`] when the session is
    /// already authorized, which keeps the status in line with the tokens the
    /// API client holds.
    pub async fn begin_login(&self) -> Result<(), SessionError> {
        let state = utils::generate_csrf_state();

        let previous = self.session.update(|s| -> Result<_, SessionError> {
            s.ensure_idle()?;
            if s.authorization_status == AuthorizationStatus::Authorized {
                return Err(SessionError::AlreadyAuthorized);
            }
            let previous = s.authorization_status;
            s.csrf_state = Some(state.clone());
            s.authorization_status = AuthorizationStatus::Authorizing;
            Ok(previous)
        });
        let previous = match previous {
            Ok(previous) => previous,
            Err(e) => return self.alerts.raise(e),
        };

        if let Err(e) = self.api.authorize(&state).await {
            self.session.update(|s| {
                // Only roll back if no later attempt replaced this one.
                if s.csrf_state.as_deref() == Some(state.as_str()) {
                    s.csrf_state = None;
                    s.authorization_status = previous;
                }
            });
            return self.alerts.raise(SessionError::request_failed("log in")(e));
        }

        Ok(())
    }

    /// Completes a login attempt from the redirect Spotify sent the user to.
    ///
    /// The stored CSRF state is consumed and replaced with a new one before
    /// the exchange starts, whatever its outcome, so a captured redirect
    /// cannot be replayed.
    pub async fn handle_redirect(&self, redirect: &Url) -> Result<(), SessionError> {
        if !self.is_expected_redirect(redirect) {
            warning!(
                "not handling URL: unexpected scheme or origin: '{}'",
                without_query(redirect)
            );
            return self
                .alerts
                .raise(SessionError::InvalidRedirect(without_query(redirect)));
        }

        info!(
            "received redirect from Spotify: '{}'",
            without_query(redirect)
        );

        let expected_state = self.session.update(|s| -> Result<_, SessionError> {
            s.ensure_idle()?;
            s.is_retrieving_tokens = true;
            let consumed = s.csrf_state.take();
            s.csrf_state = Some(utils::generate_csrf_state());
            Ok(consumed)
        });
        let expected_state = match expected_state {
            Ok(state) => state,
            Err(e) => return self.alerts.raise(e),
        };

        let retrieval = InFlight::new(&self.session, |s| s.is_retrieving_tokens = false);
        let result = self
            .api
            .request_access_and_refresh_tokens(redirect, expected_state.as_deref())
            .await;
        let authorized = result.is_ok();
        retrieval.finish(|s| {
            if authorized {
                s.authorization_status = AuthorizationStatus::Authorized;
            }
        });

        match result {
            Ok(()) => {
                success!("Authorized with Spotify.");
                Ok(())
            }
            Err(e) => {
                warning!("couldn't retrieve access and refresh tokens: {}", e);
                self.alerts.raise(SessionError::Authorization(e))
            }
        }
    }

    /// Forgets the user's tokens and returns to `unauthenticated`.
    ///
    /// Does nothing, not even the API call, when already unauthenticated.
    /// While the de-authorization is pending, `begin_login` and
    /// `handle_redirect` are rejected with [`SessionError::LogoutInProgress`],
    /// so no login can complete only to be wiped when the logout resumes.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let status = self.session.update(|s| -> Result<_, SessionError> {
            s.ensure_idle()?;
            if s.authorization_status != AuthorizationStatus::Unauthenticated {
                s.is_logging_out = true;
            }
            Ok(s.authorization_status)
        });
        match status {
            Ok(AuthorizationStatus::Unauthenticated) => return Ok(()),
            Ok(_) => {}
            Err(e) => return self.alerts.raise(e),
        }

        let logging_out = InFlight::new(&self.session, |s| s.is_logging_out = false);
        let result = self.api.deauthorize().await;
        logging_out.finish(|s| {
            s.authorization_status = AuthorizationStatus::Unauthenticated;
            s.csrf_state = None;
        });

        result.or_else(|e| self.alerts.raise(SessionError::request_failed("log out")(e)))
    }

    fn is_expected_redirect(&self, redirect: &Url) -> bool {
        let expected = &self.callback_url;
        if redirect.scheme() != expected.scheme() {
            return false;
        }

        match expected.host() {
            Some(host) => {
                redirect.host() == Some(host)
                    && redirect.port_or_known_default() == expected.port_or_known_default()
            }
            None => true,
        }
    }
}

/// Clears an in-flight flag when the operation ends, including when the
/// task running it is cancelled mid-flight.
struct InFlight<'a> {
    session: &'a Session,
    clear: fn(&mut SessionState),
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a Session, clear: fn(&mut SessionState)) -> Self {
        Self {
            session,
            clear,
            finished: false,
        }
    }

    /// Applies `outcome` and clears the flag in one critical section.
    fn finish(mut self, outcome: impl FnOnce(&mut SessionState)) {
        self.finished = true;
        let clear = self.clear;
        self.session.update(|s| {
            clear(s);
            outcome(s);
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.session.update(self.clear);
        }
    }
}

// The query carries the authorization code; keep it out of the console.
fn without_query(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
