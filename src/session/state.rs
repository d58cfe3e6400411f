use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{session::SessionError, types::AuthorizationStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub authorization_status: AuthorizationStatus,
    /// A redirect is being exchanged for tokens.
    pub is_retrieving_tokens: bool,
    /// A logout is waiting for de-authorization to finish.
    pub is_logging_out: bool,
    /// `state` value of the outstanding authorization request.
    pub csrf_state: Option<String>,
}

impl SessionState {
    /// Fails when another login, redirect or logout is still in flight.
    pub(crate) fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_retrieving_tokens {
            return Err(SessionError::TokenRetrievalInProgress);
        }
        if self.is_logging_out {
            return Err(SessionError::LogoutInProgress);
        }
        Ok(())
    }
}

/// Process-wide session state.
///
/// Readable by everyone, written only by the authorization flow. Every write
/// happens inside one short critical section, so no two login or redirect
/// operations interleave their updates. The lock is never held across an
/// `.await`.
///
/// # Example
///
/// ```
/// let session = Session::new();
/// assert_eq!(session.authorization_status(), AuthorizationStatus::Unauthenticated);
/// assert!(session.csrf_state().is_none());
/// ```
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    /// Creates an unauthenticated session with no outstanding login.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.lock().authorization_status
    }

    /// Shorthand for `authorization_status() == Authorized`.
    pub fn is_authorized(&self) -> bool {
        self.authorization_status() == AuthorizationStatus::Authorized
    }

    /// Whether a redirect is currently being exchanged for tokens. Front ends
    /// use this to disable their login controls.
    pub fn is_retrieving_tokens(&self) -> bool {
        self.lock().is_retrieving_tokens
    }

    /// Whether a logout is waiting for de-authorization to finish.
    pub fn is_logging_out(&self) -> bool {
        self.lock().is_logging_out
    }

    /// The `state` value the next redirect has to carry, if a login was
    /// started.
    pub fn csrf_state(&self) -> Option<String> {
        self.lock().csrf_state.clone()
    }

    /// Copies the whole state out in one read.
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Runs `f` on the state inside one critical section and returns its
    /// result.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Every writer leaves the state consistent, so a poisoned lock is safe to reuse.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_state_allows_operations() {
        assert!(SessionState::default().ensure_idle().is_ok());
    }

    #[test]
    fn test_in_flight_operations_are_reported() {
        let retrieving = SessionState {
            is_retrieving_tokens: true,
            ..SessionState::default()
        };
        assert!(matches!(
            retrieving.ensure_idle(),
            Err(SessionError::TokenRetrievalInProgress)
        ));

        let logging_out = SessionState {
            is_logging_out: true,
            ..SessionState::default()
        };
        assert!(matches!(
            logging_out.ensure_idle(),
            Err(SessionError::LogoutInProgress)
        ));
    }
}
