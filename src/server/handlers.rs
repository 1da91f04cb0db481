//! HTTP request handlers for the booking API.
//!
//! # Endpoints
//!
//! - `POST /api/auth/signup` - Register an account
//! - `POST /api/auth/login` - Exchange credentials for a token
//! - `POST /api/auth/logout` - Invalidate the caller's sessions
//! - `POST /api/upload-url` - Issue a pre-signed image upload URL
//! - `GET /api/appointments` - List the caller's appointments
//! - `POST /api/appointments` - Book an appointment
//! - `GET /health` - Health check

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::appointment::{Appointment, ServiceType, SlotCandidate, SlotValidator, Vehicle};
use crate::error::{IdentityError, StoreError, UploadError};
use crate::identity::{AuthenticatedUser, IdentityProvider};
use crate::store::AppointmentStore;
use crate::upload::UploadIssuer;

use super::auth::BearerToken;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state handed to every handler.
///
/// Built once at startup from the provisioned resources; immutable
/// afterwards. The three collaborators sit behind their seam traits so
/// tests can swap in mocks.
pub struct AppState<I, S, U> {
    /// External identity provider (signup/login/token resolution)
    pub identity: Arc<I>,

    /// Appointment document store
    pub store: Arc<S>,

    /// Pre-signed upload URL issuer
    pub uploader: Arc<U>,

    /// Slot validation rules
    pub validator: SlotValidator,
}

impl<I, S, U> AppState<I, S, U> {
    pub fn new(identity: I, store: S, uploader: U, validator: SlotValidator) -> Self {
        Self {
            identity: Arc::new(identity),
            store: Arc::new(store),
            uploader: Arc::new(uploader),
            validator,
        }
    }
}

impl<I, S, U> Clone for AppState<I, S, U> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            store: Arc::clone(&self.store),
            uploader: Arc::clone(&self.uploader),
            validator: self.validator,
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Body of the signup and login endpoints.
///
/// Fields are optional so missing ones produce a 400 with a
/// field-specific message instead of a generic deserialization error.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Body of the upload-url endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    #[serde(default)]
    pub file_name: Option<String>,

    #[serde(default)]
    pub file_type: Option<String>,
}

/// Body of the booking endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub car_make: Option<String>,

    #[serde(default)]
    pub car_model: Option<String>,

    #[serde(default)]
    pub car_year: Option<String>,

    /// Service type as a raw string; unknown values are a validation
    /// failure, not a parse error
    #[serde(default)]
    pub service_type: Option<String>,

    /// Calendar date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,

    /// Slot start, `HH:MM`
    #[serde(default)]
    pub time: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "invalid_request", "slot_taken")
    pub error: String,

    /// Human-readable, client-safe message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Simple confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Successful login: the bearer token plus the account it maps to.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
}

/// Response of the upload-url endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    /// Pre-signed PUT URL, valid for about an hour
    pub upload_url: String,

    /// Public URL the image will be readable at after the upload
    pub image_url: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Unified handler error, mapped onto the HTTP error taxonomy.
///
/// Upstream raw detail is logged here and replaced with a client-safe
/// message; clients only ever see the `error`/`message` pair.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input field; message names the field
    BadRequest(String),

    /// A booking rule rejected the candidate slot
    Validation(String),

    Identity(IdentityError),
    Store(StoreError),
    Upload(UploadError),
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        ApiError::Identity(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError::Upload(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "invalid_request", message.clone())
            }

            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                "invalid_appointment",
                message.clone(),
            ),

            ApiError::Identity(identity_error) => match identity_error {
                IdentityError::UserExists => (
                    StatusCode::BAD_REQUEST,
                    "user_exists",
                    "User already exists".to_string(),
                ),
                IdentityError::WeakPassword(detail) => {
                    (StatusCode::BAD_REQUEST, "weak_password", detail.clone())
                }
                IdentityError::InvalidParameter(detail) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_parameter",
                    detail.clone(),
                ),
                IdentityError::UserNotFound => (
                    StatusCode::NOT_FOUND,
                    "user_not_found",
                    "User not found. Please sign up first.".to_string(),
                ),
                IdentityError::NotAuthorized => (
                    StatusCode::UNAUTHORIZED,
                    "not_authorized",
                    "Incorrect username or password".to_string(),
                ),
                IdentityError::UserNotConfirmed => (
                    StatusCode::FORBIDDEN,
                    "user_not_confirmed",
                    "Please verify your email before logging in".to_string(),
                ),
                IdentityError::InvalidToken => (
                    StatusCode::UNAUTHORIZED,
                    "invalid_token",
                    "Invalid token".to_string(),
                ),
                IdentityError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "upstream_timeout",
                    "Identity provider timed out, please retry".to_string(),
                ),
                IdentityError::Upstream(detail) => {
                    error!(
                        error_type = "upstream_error",
                        "identity provider failure: {}", detail
                    );
                    (
                        StatusCode::BAD_GATEWAY,
                        "upstream_error",
                        "Identity provider unavailable".to_string(),
                    )
                }
            },

            ApiError::Store(store_error) => match store_error {
                StoreError::SlotTaken { .. } => (
                    StatusCode::CONFLICT,
                    "slot_taken",
                    "This time slot is already booked".to_string(),
                ),
                StoreError::MalformedRecord(detail) => {
                    error!(error_type = "internal_error", "malformed record: {}", detail);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "Internal error".to_string(),
                    )
                }
                StoreError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "upstream_timeout",
                    "Document store timed out, please retry".to_string(),
                ),
                StoreError::Upstream(detail) => {
                    error!(error_type = "upstream_error", "store failure: {}", detail);
                    (
                        StatusCode::BAD_GATEWAY,
                        "upstream_error",
                        "Document store unavailable".to_string(),
                    )
                }
            },

            ApiError::Upload(upload_error) => match upload_error {
                UploadError::Presign(detail) => {
                    error!(error_type = "internal_error", "presign failure: {}", detail);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "Internal error".to_string(),
                    )
                }
                UploadError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "upstream_timeout",
                    "Object store timed out, please retry".to_string(),
                ),
                UploadError::Upstream(detail) => {
                    error!(error_type = "upstream_error", "object store failure: {}", detail);
                    (
                        StatusCode::BAD_GATEWAY,
                        "upstream_error",
                        "Object store unavailable".to_string(),
                    )
                }
            },
        };

        // 4xx are routine client mistakes; 5xx were already logged with
        // their raw detail above
        if status.is_client_error() {
            if status == StatusCode::CONFLICT {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Booking conflict: {}",
                    message
                );
            } else {
                debug!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Client error: {}",
                    message
                );
            }
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

/// Presence check: unwrap the field or reject with "<label> is required".
fn required(field: Option<String>, label: &str) -> Result<String, ApiError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(format!("{} is required", label))),
    }
}

// =============================================================================
// Auth Handlers
// =============================================================================

/// Handle account registration.
///
/// # Endpoint
///
/// `POST /api/auth/signup`
///
/// # Response
///
/// - `201 Created`: account registered
/// - `400 Bad Request`: missing field, short password, user exists, or
///   the pool's password policy rejected the password
pub async fn signup_handler<I, S, U>(
    State(state): State<AppState<I, S, U>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError>
where
    I: IdentityProvider,
    S: AppointmentStore,
    U: UploadIssuer,
{
    let email = required(body.email, "Email")?;
    let password = required(body.password, "Password")?;

    // Local floor before delegating; the pool enforces the full policy
    if password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    state.identity.sign_up(&email, &password).await?;

    info!("registered account for {}", email);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Handle login.
///
/// # Endpoint
///
/// `POST /api/auth/login`
///
/// # Response
///
/// - `200 OK`: `{token, user: {email}}`
/// - `401 Unauthorized`: wrong credentials
/// - `403 Forbidden`: account not confirmed
/// - `404 Not Found`: no such account
pub async fn login_handler<I, S, U>(
    State(state): State<AppState<I, S, U>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError>
where
    I: IdentityProvider,
    S: AppointmentStore,
    U: UploadIssuer,
{
    if body.email.is_none() || body.password.is_none() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    let email = required(body.email, "Email")?;
    let password = required(body.password, "Password")?;

    let session = state.identity.log_in(&email, &password).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        user: UserResponse {
            email: session.email,
        },
    }))
}

/// Handle logout.
///
/// # Endpoint
///
/// `POST /api/auth/logout` (protected)
///
/// # Response
///
/// - `200 OK`: all sessions invalidated
pub async fn logout_handler<I, S, U>(
    State(state): State<AppState<I, S, U>>,
    Extension(token): Extension<BearerToken>,
) -> Result<Json<MessageResponse>, ApiError>
where
    I: IdentityProvider,
    S: AppointmentStore,
    U: UploadIssuer,
{
    state.identity.log_out(&token.0).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

// =============================================================================
// Upload Handler
// =============================================================================

/// Issue a pre-signed upload URL.
///
/// # Endpoint
///
/// `POST /api/upload-url` (protected)
///
/// # Response
///
/// - `200 OK`: `{uploadUrl, imageUrl}`
/// - `400 Bad Request`: missing file name or type
pub async fn upload_url_handler<I, S, U>(
    State(state): State<AppState<I, S, U>>,
    Json(body): Json<UploadUrlRequest>,
) -> Result<Json<UploadUrlResponse>, ApiError>
where
    I: IdentityProvider,
    S: AppointmentStore,
    U: UploadIssuer,
{
    let file_name = required(body.file_name, "fileName")?;
    let file_type = required(body.file_type, "fileType")?;

    let ticket = state.uploader.issue(&file_name, &file_type).await?;

    Ok(Json(UploadUrlResponse {
        upload_url: ticket.upload_url,
        image_url: ticket.public_url,
    }))
}

// =============================================================================
// Appointment Handlers
// =============================================================================

/// List the caller's appointments.
///
/// # Endpoint
///
/// `GET /api/appointments` (protected)
///
/// # Response
///
/// - `200 OK`: array of appointment records owned by the caller
pub async fn list_appointments_handler<I, S, U>(
    State(state): State<AppState<I, S, U>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Appointment>>, ApiError>
where
    I: IdentityProvider,
    S: AppointmentStore,
    U: UploadIssuer,
{
    let appointments = state.store.list_by_owner(&user.email).await?;
    Ok(Json(appointments))
}

/// Book an appointment.
///
/// # Endpoint
///
/// `POST /api/appointments` (protected)
///
/// # Response
///
/// - `201 Created`: the stored record, status `Pending`
/// - `400 Bad Request`: missing field or rejected by a booking rule
/// - `409 Conflict`: the slot was claimed by a concurrent booking
pub async fn create_appointment_handler<I, S, U>(
    State(state): State<AppState<I, S, U>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError>
where
    I: IdentityProvider,
    S: AppointmentStore,
    U: UploadIssuer,
{
    let car_make = required(body.car_make, "carMake")?;
    let car_model = required(body.car_model, "carModel")?;
    let car_year = required(body.car_year, "carYear")?;
    let service_type_raw = required(body.service_type, "serviceType")?;
    let date = required(body.date, "date")?;
    let time = required(body.time, "time")?;

    let candidate = SlotCandidate {
        date: date.clone(),
        time: time.clone(),
        service_type: service_type_raw.clone(),
    };

    let verdict = state.validator.validate(&candidate);
    if !verdict.is_valid {
        return Err(ApiError::Validation(
            verdict
                .message
                .unwrap_or_else(|| "Invalid appointment".to_string()),
        ));
    }

    if state.validator.is_strict() {
        // Courtesy pre-check; the conditional write below is the
        // authoritative guard
        if state.store.slot_is_booked(&date, &time).await? {
            return Err(ApiError::Validation(
                "This time slot is already booked".to_string(),
            ));
        }

        let fit = state.validator.validate_duration(&candidate);
        if !fit.is_valid {
            return Err(ApiError::Validation(
                fit.message.unwrap_or_else(|| "Invalid appointment".to_string()),
            ));
        }
    }

    // validate() guarantees the service type parses
    let service_type = ServiceType::parse(&service_type_raw)
        .ok_or_else(|| ApiError::Validation("Invalid service type".to_string()))?;

    let appointment = Appointment::new(
        user.email,
        Vehicle {
            make: car_make,
            model: car_model,
            year: car_year,
        },
        service_type,
        date,
        time,
        body.description.unwrap_or_default(),
        body.image_url,
    );

    state.store.create(&appointment).await?;

    info!(
        "booked {} on {} {} for {}",
        appointment.service_type, appointment.date, appointment.time, appointment.owner_email
    );

    Ok((StatusCode::CREATED, Json(appointment)))
}

// =============================================================================
// Health Handler
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
