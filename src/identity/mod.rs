//! Identity provider abstraction.
//!
//! Signup, login, token resolution, and logout are all delegated to an
//! external hosted identity provider. The [`IdentityProvider`] trait is
//! the seam: the production implementation talks to a Cognito user pool
//! ([`cognito::CognitoIdentityProvider`]), integration tests substitute
//! an in-memory mock.
//!
//! Handlers never trust caller-supplied identity fields; the
//! [`AuthenticatedUser`] resolved from the bearer token is the only
//! source of the appointment owner.

mod cognito;

pub use cognito::CognitoIdentityProvider;

use async_trait::async_trait;

use crate::error::IdentityError;

/// The identity resolved from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Stable username at the identity provider (the account email).
    pub email: String,
}

/// A successful login: the access token plus the account it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub email: String,
}

/// External identity provider operations used by the backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account. The password has already passed the
    /// local minimum-length check; the provider applies its own policy
    /// on top.
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), IdentityError>;

    /// Exchange credentials for an access token.
    async fn log_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Resolve a bearer token to the account it authenticates.
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, IdentityError>;

    /// Invalidate every session of the account behind this token.
    async fn log_out(&self, token: &str) -> Result<(), IdentityError>;
}
