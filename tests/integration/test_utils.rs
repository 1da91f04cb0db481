//! Test utilities for integration tests.
//!
//! Provides in-memory mock implementations of the three collaborator
//! seams plus helpers for building routers and requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use serde_json::Value;
use tokio::sync::RwLock;

use autoshop_booking::appointment::{SlotPolicy, SlotValidator};
use autoshop_booking::error::{IdentityError, StoreError, UploadError};
use autoshop_booking::identity::{AuthenticatedUser, IdentityProvider, Session};
use autoshop_booking::server::{create_router, AppState, RouterConfig};
use autoshop_booking::store::AppointmentStore;
use autoshop_booking::upload::{UploadIssuer, UploadTicket};
use autoshop_booking::Appointment;

// =============================================================================
// Mock Identity Provider
// =============================================================================

#[derive(Clone)]
struct MockAccount {
    password: String,
    confirmed: bool,
}

/// In-memory identity provider with account and token tracking.
pub struct MockIdentityProvider {
    accounts: Arc<RwLock<HashMap<String, MockAccount>>>,
    tokens: Arc<RwLock<HashMap<String, String>>>,
    token_counter: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            tokens: Arc::new(RwLock::new(HashMap::new())),
            token_counter: AtomicUsize::new(0),
        }
    }

    /// Pre-register a confirmed account.
    pub async fn with_account(self, email: &str, password: &str) -> Self {
        self.accounts.write().await.insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                confirmed: true,
            },
        );
        self
    }

    /// Pre-register an account that never verified its email.
    pub async fn with_unconfirmed_account(self, email: &str, password: &str) -> Self {
        self.accounts.write().await.insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                confirmed: false,
            },
        );
        self
    }

    /// Pre-issue a token for an account, bypassing login.
    pub async fn with_token(self, token: &str, email: &str) -> Self {
        self.tokens
            .write()
            .await
            .insert(token.to_string(), email.to_string());
        self
    }

    pub async fn has_account(&self, email: &str) -> bool {
        self.accounts.read().await.contains_key(email)
    }

    pub async fn token_is_live(&self, token: &str) -> bool {
        self.tokens.read().await.contains_key(token)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(IdentityError::UserExists);
        }
        // The pool's own policy, beyond the handler's length floor
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(IdentityError::WeakPassword(
                "Password must contain a number".to_string(),
            ));
        }
        accounts.insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                confirmed: true,
            },
        );
        Ok(())
    }

    async fn log_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let accounts = self.accounts.read().await;
        let account = accounts.get(email).ok_or(IdentityError::UserNotFound)?;

        if account.password != password {
            return Err(IdentityError::NotAuthorized);
        }
        if !account.confirmed {
            return Err(IdentityError::UserNotConfirmed);
        }

        let token = format!(
            "mock-token-{}",
            self.token_counter.fetch_add(1, Ordering::SeqCst)
        );
        self.tokens
            .write()
            .await
            .insert(token.clone(), email.to_string());

        Ok(Session {
            token,
            email: email.to_string(),
        })
    }

    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let tokens = self.tokens.read().await;
        let email = tokens.get(token).ok_or(IdentityError::InvalidToken)?;
        Ok(AuthenticatedUser {
            email: email.clone(),
        })
    }

    async fn log_out(&self, token: &str) -> Result<(), IdentityError> {
        let mut tokens = self.tokens.write().await;
        tokens.remove(token).ok_or(IdentityError::InvalidToken)?;
        Ok(())
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Mock Appointment Store
// =============================================================================

/// In-memory appointment store enforcing the slot-uniqueness invariant
/// the way the real conditional write does.
pub struct MockAppointmentStore {
    records: Arc<RwLock<Vec<Appointment>>>,
}

impl MockAppointmentStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn records(&self) -> Vec<Appointment> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AppointmentStore for MockAppointmentStore {
    async fn create(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        // Same atomicity as the transactional conditional write: the
        // check and the insert happen under one lock
        let collision = records
            .iter()
            .any(|existing| existing.date == appointment.date && existing.time == appointment.time);
        if collision {
            return Err(StoreError::SlotTaken {
                date: appointment.date.clone(),
                time: appointment.time.clone(),
            });
        }

        records.push(appointment.clone());
        Ok(())
    }

    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.owner_email == owner_email)
            .cloned()
            .collect())
    }

    async fn slot_is_booked(&self, date: &str, time: &str) -> Result<bool, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .any(|record| record.date == date && record.time == time))
    }
}

impl Default for MockAppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Mock Upload Issuer
// =============================================================================

/// Deterministic upload issuer with request tracking.
pub struct MockUploadIssuer {
    issued: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockUploadIssuer {
    pub fn new() -> Self {
        Self {
            issued: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn issued(&self) -> Vec<(String, String)> {
        self.issued.read().await.clone()
    }
}

#[async_trait]
impl UploadIssuer for MockUploadIssuer {
    async fn issue(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadTicket, UploadError> {
        self.issued
            .write()
            .await
            .push((file_name.to_string(), content_type.to_string()));

        let key = format!("mock-prefix-{}", file_name);
        Ok(UploadTicket {
            upload_url: format!("https://uploads.mock/{}?signature=abc", key),
            public_url: format!("https://images.mock/{}", key),
            key,
        })
    }
}

impl Default for MockUploadIssuer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builders
// =============================================================================

pub type MockState = AppState<MockIdentityProvider, MockAppointmentStore, MockUploadIssuer>;

/// State with all mocks, discrete validation.
pub fn mock_state(identity: MockIdentityProvider) -> MockState {
    AppState::new(
        identity,
        MockAppointmentStore::new(),
        MockUploadIssuer::new(),
        SlotValidator::new(SlotPolicy::Discrete),
    )
}

/// State with all mocks, strict validation.
pub fn strict_mock_state(identity: MockIdentityProvider) -> MockState {
    AppState::new(
        identity,
        MockAppointmentStore::new(),
        MockUploadIssuer::new(),
        SlotValidator::new(SlotPolicy::Strict),
    )
}

/// Router over the given state, tracing off to keep test output quiet.
pub fn test_router(state: &MockState) -> Router {
    create_router(state.clone(), RouterConfig::new().with_tracing(false))
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Build a JSON POST request.
pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a JSON POST request with a bearer token.
pub fn post_json_authed(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request with a bearer token.
pub fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A booking body with every required field present.
pub fn valid_booking() -> Value {
    serde_json::json!({
        "carMake": "Toyota",
        "carModel": "Corolla",
        "carYear": "2019",
        "serviceType": "oil-change",
        "date": "2099-01-01",
        "time": "09:00"
    })
}
