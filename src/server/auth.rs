//! Bearer-token authentication for protected routes.
//!
//! Protected routes sit behind [`auth_middleware`]: it pulls the
//! credential out of the `Authorization` header, resolves it through
//! the identity provider, and stores the resulting
//! [`AuthenticatedUser`] (plus the raw [`BearerToken`], which the
//! logout handler needs) in request extensions. Handlers read the
//! identity from there and never from the request body.
//!
//! The header may carry either a bare access token or the conventional
//! `Bearer <token>` form; both are accepted.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use tracing::{debug, error, warn};

use crate::error::IdentityError;
use crate::identity::IdentityProvider;

use super::handlers::ErrorResponse;

// =============================================================================
// Types
// =============================================================================

/// The raw bearer credential, kept around for logout.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Authentication gate state: the identity provider used to resolve
/// tokens.
pub struct AuthGate<I> {
    identity: Arc<I>,
}

impl<I> AuthGate<I> {
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }
}

impl<I> Clone for AuthGate<I> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
        }
    }
}

/// Authentication failures raised by the gate.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header on the request
    MissingHeader,

    /// The header value is not valid UTF-8 or is empty
    MalformedHeader,

    /// The identity provider rejected the credential (or was unreachable)
    Unauthenticated(IdentityError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "No authorization header"),
            AuthError::MalformedHeader => write!(f, "Malformed authorization header"),
            AuthError::Unauthenticated(_) => write!(f, "Invalid token"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "missing_authorization",
                self.to_string(),
            ),
            AuthError::MalformedHeader => (
                StatusCode::UNAUTHORIZED,
                "malformed_authorization",
                self.to_string(),
            ),
            AuthError::Unauthenticated(identity_error) => match identity_error {
                IdentityError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "upstream_timeout",
                    "Identity provider timed out, please retry".to_string(),
                ),
                IdentityError::Upstream(detail) => {
                    // Raw detail goes to the log, never to the client
                    error!(error_type = "upstream_error", "identity provider failure: {}", detail);
                    (
                        StatusCode::BAD_GATEWAY,
                        "upstream_error",
                        "Identity provider unavailable".to_string(),
                    )
                }
                _ => (StatusCode::UNAUTHORIZED, "invalid_token", self.to_string()),
            },
        };

        // Missing headers are routine; rejected tokens may indicate probing
        match &self {
            AuthError::Unauthenticated(IdentityError::InvalidToken) => {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
            _ => {
                debug!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Resolve the bearer credential and forward the request with the
/// authenticated user attached, or reject with 401.
pub async fn auth_middleware<I: IdentityProvider>(
    State(gate): State<AuthGate<I>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())?;

    let user = gate
        .identity
        .resolve(&token)
        .await
        .map_err(AuthError::Unauthenticated)?;

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

/// Extract the credential from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let raw = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token.to_string())
}

// =============================================================================
// Tests
// =============================================================================
