//! HTTP server layer for the booking API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        POST /api/appointments, GET /api/appointments, ...       │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │  handlers   │  │     auth     │  │        routes          │  │
//! │  │ (requests)  │  │ (bearer gate)│  │   (router config)      │  │
//! │  └─────────────┘  └──────────────┘  └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{auth_middleware, AuthError, AuthGate, BearerToken};
pub use handlers::{
    create_appointment_handler, health_handler, list_appointments_handler, login_handler,
    logout_handler, signup_handler, upload_url_handler, ApiError, AppState,
    CreateAppointmentRequest, CredentialsRequest, ErrorResponse, HealthResponse, LoginResponse,
    MessageResponse, UploadUrlRequest, UploadUrlResponse, UserResponse,
};
pub use routes::{create_router, RouterConfig};
