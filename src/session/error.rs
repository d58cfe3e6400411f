use thiserror::Error;

use crate::{
    spotify::{ApiError, AuthorizationError},
    types::Alert,
};

pub const NO_DEVICE_MESSAGE: &str = "There are no devices available to play content on. \
     Try opening the Spotify app on one of your devices.";

/// Every way a session operation can fail. None of them is fatal: each
/// leaves the session in the state it had before the operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot handle redirect to unexpected URL '{0}'")]
    InvalidRedirect(String),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error("the track has no Spotify URI")]
    MissingTrackReference,
    #[error("no active or available devices")]
    NoAvailableDevice,
    #[error("couldn't {context}: {source}")]
    RequestFailed {
        context: &'static str,
        #[source]
        source: ApiError,
    },
    #[error("access and refresh tokens are already being retrieved")]
    TokenRetrievalInProgress,
    #[error("a logout is in progress")]
    LogoutInProgress,
    #[error("already logged in")]
    AlreadyAuthorized,
    #[error("superseded by a newer request")]
    Superseded,
}

impl SessionError {
    /// Wraps an [`ApiError`] with what was being attempted, for use with
    /// `map_err`.
    ///
    /// # Arguments
    ///
    /// * `context` - lower-case verb phrase, e.g. `"retrieve devices"`. It is
    ///   title-cased into the alert title.
    pub fn request_failed(context: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| SessionError::RequestFailed { context, source }
    }

    /// The notification shown to the user, if any. Superseded requests are
    /// dropped silently.
    ///
    /// # Example
    ///
    /// ```
    /// let alert = SessionError::NoAvailableDevice.alert().unwrap();
    /// assert_eq!(alert.title, "Couldn't Play Track");
    /// ```
    pub fn alert(&self) -> Option<Alert> {
        let alert = match self {
            SessionError::InvalidRedirect(_) => {
                Alert::new("Cannot Handle Redirect", "Unexpected URL")
            }
            SessionError::Authorization(AuthorizationError::AccessDenied) => {
                Alert::new("You Denied The Authorization Request :(", "")
            }
            SessionError::Authorization(AuthorizationError::TokenExchangeFailed(message)) => {
                Alert::new("Couldn't Authorize With Your Account", message.as_str())
            }
            SessionError::MissingTrackReference => Alert::new(
                "Couldn't Play Track",
                "This track has no Spotify URI and cannot be played.",
            ),
            SessionError::NoAvailableDevice => Alert::new("Couldn't Play Track", NO_DEVICE_MESSAGE),
            SessionError::RequestFailed { context, source } => {
                Alert::new(format!("Couldn't {}", title_case(context)), source.to_string())
            }
            SessionError::TokenRetrievalInProgress => Alert::new(
                "Already Logging In",
                "Wait for the current login to finish and try again.",
            ),
            SessionError::LogoutInProgress => Alert::new(
                "Logging Out",
                "Wait for the logout to finish and try again.",
            ),
            SessionError::AlreadyAuthorized => Alert::new(
                "Already Logged In",
                "Log out first to switch accounts.",
            ),
            SessionError::Superseded => return None,
        };
        Some(alert)
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
