//! Session-scoped state: the auth token and the current patient context.
//!
//! A `SessionContext` belongs to exactly one user session and is passed by
//! reference into every clinical operation. The token lives only in memory.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::{OncohubError, Result};

/// Bearer token issued by the clinical system's token endpoint.
#[derive(Debug)]
pub struct AuthToken {
    value: SecretString,
    /// Principal the token was issued for.
    pub issued_for: String,
    pub issued_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(value: impl Into<String>, issued_for: impl Into<String>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            issued_for: issued_for.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value.expose_secret())
    }

    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

#[derive(Debug)]
pub struct SessionContext {
    state: AuthState,
    token: Option<AuthToken>,
    patient_id: Option<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self { state: AuthState::Unauthenticated, token: None, patient_id: None }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated && self.token.is_some()
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    /// Token for an authenticated request, or `Authentication("not authenticated")`.
    pub fn require_token(&self) -> Result<&AuthToken> {
        match (&self.state, &self.token) {
            (AuthState::Authenticated, Some(token)) => Ok(token),
            _ => Err(OncohubError::not_authenticated()),
        }
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn set_patient(&mut self, patient_id: impl Into<String>) {
        self.patient_id = Some(patient_id.into());
    }

    /// Enter `Authenticating`. Any previous token is dropped so a failed
    /// attempt can never leave a stale one behind.
    pub fn begin_authentication(&mut self) {
        self.token = None;
        self.state = AuthState::Authenticating;
    }

    pub fn complete_authentication(&mut self, token: AuthToken) {
        debug!(principal = %token.issued_for, "Session authenticated");
        self.token = Some(token);
        self.state = AuthState::Authenticated;
    }

    pub fn fail_authentication(&mut self) {
        self.token = None;
        self.state = AuthState::Unauthenticated;
    }

    /// Drop the token after the clinical system rejected it. Patient context is kept.
    pub fn invalidate_token(&mut self) {
        if self.token.take().is_some() {
            debug!("Session token invalidated");
        }
        self.state = AuthState::Unauthenticated;
    }

    /// End of session: token and patient context are both torn down.
    pub fn logout(&mut self) {
        self.invalidate_token();
        self.patient_id = None;
    }
}
