use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::client::ApiError;
use crate::models::{LoginRequest, TokenResponse, User};

use super::store::{CredentialStore, StoreError};

/// Errors surfaced by supervisor operations.
///
/// API failures during validation are resolved into state transitions and
/// never surface here; only `login` reports its API error (the caller shows
/// it to the user), and storage IO can fail anywhere.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The session state machine.
///
/// The profile lives inside `Authenticated`, so a user can only ever be
/// observed together with the validated token that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    Validating,
    Authenticated(User),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// The external authentication provider.
///
/// Implemented over HTTP by [`crate::client::ApiClient`]; tests script it.
/// Callers never spawn these futures, so no Send bound is required.
#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse, ApiError>;
    async fn whoami(&self, token: &str) -> Result<User, ApiError>;
}

/// Orchestrates the session lifecycle over a [`CredentialStore`].
///
/// The store is the only shared mutable resource and is mutated exclusively
/// here. Operations interleave only at provider await points; every check of
/// the store against a pre-request snapshot therefore observes any `login` or
/// `logout` that completed before the provider call resolved.
pub struct SessionSupervisor<P> {
    provider: P,
    store: CredentialStore,
    state: Arc<Mutex<SessionState>>,
}

impl<P: AuthProvider> SessionSupervisor<P> {
    /// Create a supervisor. Initial state depends on stored-token presence:
    /// a stored token awaits validation, otherwise we start signed out.
    pub fn new(provider: P, store: CredentialStore) -> Self {
        let initial = if store.get().is_some() {
            SessionState::Validating
        } else {
            SessionState::Unauthenticated
        };
        Self {
            provider,
            store,
            state: Arc::new(Mutex::new(initial)),
        }
    }

    /// The current session state.
    pub fn state(&self) -> SessionState {
        self.state.lock().expect("session state lock poisoned").clone()
    }

    /// The validated profile, if authenticated.
    pub fn current_user(&self) -> Option<User> {
        match self.state() {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// The credential store this supervisor owns.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.state.lock().expect("session state lock poisoned");
        tracing::debug!(from = ?*state, to = ?next, "session transition");
        *state = next;
    }

    /// Validate the stored token against the provider.
    ///
    /// The token identity is snapshotted before the request. A successful
    /// validation always authenticates. A failed one clears the session only
    /// if the store still holds the snapshotted token; if a concurrent
    /// `login` replaced it while the request was in flight, the failure
    /// belongs to the old token and is discarded.
    pub async fn validate_session(&self) -> Result<SessionState, StoreError> {
        let Some(token_at_start) = self.store.get() else {
            self.set_state(SessionState::Unauthenticated);
            return Ok(self.state());
        };
        self.set_state(SessionState::Validating);

        match self.provider.whoami(&token_at_start).await {
            Ok(profile) => {
                // A successful validation is never stale.
                self.set_state(SessionState::Authenticated(profile));
            }
            Err(err) => {
                // Unauthorized, network and malformed-response failures all
                // follow the same staleness-checked clear; none is retried.
                tracing::warn!("session validation failed: {}", err);
                self.invalidate_if_current(&token_at_start)?;
            }
        }
        Ok(self.state())
    }

    /// Sign in. On success the new token supersedes any in-flight validation
    /// of an older one. On failure the existing session, possibly still
    /// valid, is left exactly as it was.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, SessionError> {
        let response = self.provider.login(credentials).await?;
        let TokenResponse {
            access_token, user, ..
        } = response;
        let token = access_token.trim();
        if token.is_empty() {
            return Err(ApiError::Malformed("login response carried an empty token".to_string()).into());
        }
        self.store.set(token)?;
        self.set_state(SessionState::Authenticated(user.clone()));
        tracing::debug!(user = %user.display_name(), "login succeeded");
        Ok(user)
    }

    /// Sign out. An explicit user action, never subject to the staleness
    /// check: the store and state are cleared unconditionally.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        self.set_state(SessionState::Unauthenticated);
        Ok(())
    }

    /// Staleness-checked session clear.
    ///
    /// Used by the failure path of `validate_session` and by callers whose
    /// data request came back unauthorized: the session is dropped only if
    /// the store still holds the token that request was issued with. Returns
    /// whether the session was cleared.
    pub fn invalidate_if_current(&self, token_at_start: &str) -> Result<bool, StoreError> {
        if self.store.get().as_deref() == Some(token_at_start) {
            self.store.clear()?;
            self.set_state(SessionState::Unauthenticated);
            Ok(true)
        } else {
            tracing::debug!("discarding stale failure; token was replaced mid-flight");
            Ok(false)
        }
    }
}
