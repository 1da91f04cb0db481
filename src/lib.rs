//! # AutoShop Booking
//!
//! Appointment booking backend for an auto-service shop.
//!
//! The backend is a thin orchestration layer over three managed AWS
//! services: Cognito owns the accounts, S3 holds uploaded vehicle
//! images (written directly by clients through pre-signed URLs), and
//! DynamoDB stores appointment records. The one piece of real domain
//! logic is the appointment-slot validator.
//!
//! ## Features
//!
//! - **Delegated identity**: signup, login, and bearer-token auth
//!   proxied to a Cognito user pool
//! - **Direct-to-storage uploads**: short-lived pre-signed PUT URLs,
//!   no image bytes pass through the service
//! - **Race-free booking**: a conditional transactional write makes
//!   the store the arbiter of slot ownership, so two concurrent
//!   bookings of the same slot cannot both commit
//! - **Idempotent provisioning**: ensure-or-create bootstrap for the
//!   bucket, user pool, app client, and table
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`appointment`] - Domain types and the slot validator
//! - [`identity`] - Identity provider seam and Cognito adapter
//! - [`store`] - Appointment store seam and DynamoDB adapter
//! - [`upload`] - Upload URL issuer seam and S3 adapter
//! - [`provision`] - Ensure-or-create resource bootstrap
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`aws`] - Shared AWS SDK client construction

pub mod appointment;
pub mod aws;
pub mod config;
pub mod error;
pub mod identity;
pub mod provision;
pub mod server;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use appointment::{
    Appointment, AppointmentStatus, ServiceType, SlotCandidate, SlotPolicy, SlotValidator,
    Validation, Vehicle, BOOKABLE_SLOTS,
};
pub use aws::AwsClients;
pub use config::{AwsTargets, CheckConfig, Cli, Command, ProvisionConfig, ServeConfig};
pub use error::{IdentityError, ProvisionError, StoreError, UploadError};
pub use identity::{AuthenticatedUser, CognitoIdentityProvider, IdentityProvider, Session};
pub use provision::{ProvisionSpec, ProvisionedResources, Provisioner};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use store::{AppointmentStore, DynamoAppointmentStore};
pub use upload::{S3UploadIssuer, UploadIssuer, UploadTicket};
