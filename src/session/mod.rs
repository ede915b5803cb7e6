//! Session and credential lifecycle.
//!
//! [`CredentialStore`] holds the current bearer token, backed by durable
//! storage. [`SessionSupervisor`] owns the session state machine and is the
//! only component that mutates the store. The central guarantee is that a
//! failed validation of an old token can never evict a session established by
//! a newer login; see [`SessionSupervisor::validate_session`].

mod store;
mod supervisor;

pub use store::{CredentialStore, FileTokenStorage, StoreError, TokenStorage};
pub use supervisor::{AuthProvider, SessionError, SessionState, SessionSupervisor};
