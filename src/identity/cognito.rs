//! Cognito-backed implementation of [`IdentityProvider`].
//!
//! Uses the user pool's `USER_PASSWORD_AUTH` flow: the backend proxies
//! email/password credentials and hands the resulting access token back
//! to the client, which presents it as a bearer credential on protected
//! routes.

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::ProvideErrorMetadata;
use aws_sdk_cognitoidentityprovider::error::SdkError;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client;
use tracing::{debug, warn};

use crate::error::IdentityError;

use super::{AuthenticatedUser, IdentityProvider, Session};

/// Identity provider backed by a Cognito user pool app client.
#[derive(Clone)]
pub struct CognitoIdentityProvider {
    client: Client,
    user_pool_id: String,
    app_client_id: String,
    auto_confirm: bool,
}

impl CognitoIdentityProvider {
    /// Create a provider for the given pool and app client.
    ///
    /// With `auto_confirm` set, every signup is admin-confirmed
    /// immediately, skipping email verification. Intended for demo and
    /// test environments; confirmed-by-default accounts never hit the
    /// 403 unverified-login path.
    pub fn new(
        client: Client,
        user_pool_id: impl Into<String>,
        app_client_id: impl Into<String>,
        auto_confirm: bool,
    ) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
            app_client_id: app_client_id.into(),
            auto_confirm,
        }
    }

    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    pub fn app_client_id(&self) -> &str {
        &self.app_client_id
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), IdentityError> {
        let email_attribute = AttributeType::builder()
            .name("email")
            .value(email)
            .build()
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        self.client
            .sign_up()
            .client_id(&self.app_client_id)
            .username(email)
            .password(password)
            .user_attributes(email_attribute)
            .send()
            .await
            .map_err(|e| {
                let message = service_message(&e);
                if let Some(service_error) = e.as_service_error() {
                    if service_error.is_username_exists_exception() {
                        return IdentityError::UserExists;
                    }
                    if service_error.is_invalid_password_exception() {
                        return IdentityError::WeakPassword(message);
                    }
                    if service_error.is_invalid_parameter_exception() {
                        return IdentityError::InvalidParameter(message);
                    }
                }
                classify_transport(e)
            })?;

        if self.auto_confirm {
            self.client
                .admin_confirm_sign_up()
                .user_pool_id(&self.user_pool_id)
                .username(email)
                .send()
                .await
                .map_err(|e| {
                    warn!("auto-confirm failed for new account: {}", service_message(&e));
                    classify_transport(e)
                })?;
        }

        Ok(())
    }

    async fn log_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response = self
            .client
            .initiate_auth()
            .client_id(&self.app_client_id)
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password)
            .send()
            .await
            .map_err(|e| {
                if let Some(service_error) = e.as_service_error() {
                    if service_error.is_user_not_found_exception() {
                        return IdentityError::UserNotFound;
                    }
                    if service_error.is_not_authorized_exception() {
                        return IdentityError::NotAuthorized;
                    }
                    if service_error.is_user_not_confirmed_exception() {
                        return IdentityError::UserNotConfirmed;
                    }
                }
                classify_transport(e)
            })?;

        let token = response
            .authentication_result()
            .and_then(|result| result.access_token())
            .ok_or_else(|| {
                // A challenge response (MFA, NEW_PASSWORD_REQUIRED) has no
                // token; the pool is provisioned without challenges, so
                // treat it as a provider misconfiguration.
                IdentityError::Upstream("authentication returned no access token".to_string())
            })?;

        Ok(Session {
            token: token.to_string(),
            email: email.to_string(),
        })
    }

    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let response = self
            .client
            .get_user()
            .access_token(token)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some() {
                    debug!("token resolution rejected: {}", service_message(&e));
                    return IdentityError::InvalidToken;
                }
                classify_transport(e)
            })?;

        Ok(AuthenticatedUser {
            email: response.username().to_string(),
        })
    }

    async fn log_out(&self, token: &str) -> Result<(), IdentityError> {
        self.client
            .global_sign_out()
            .access_token(token)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some() {
                    debug!("sign-out rejected: {}", service_message(&e));
                    return IdentityError::InvalidToken;
                }
                classify_transport(e)
            })?;

        Ok(())
    }
}

/// Best-effort human-readable message from a service error.
fn service_message<E: ProvideErrorMetadata, R>(err: &SdkError<E, R>) -> String {
    err.as_service_error()
        .and_then(|service_error| service_error.message())
        .unwrap_or("no detail from identity provider")
        .to_string()
}

/// Classify a non-service failure: timeouts become `Timeout`,
/// everything else `Upstream` with the raw detail for the logs.
fn classify_transport<E, R>(err: SdkError<E, R>) -> IdentityError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) => IdentityError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => IdentityError::Timeout,
        _ => IdentityError::Upstream(format!("{:?}", err)),
    }
}
