use thiserror::Error;

/// Errors from the external identity provider (Cognito).
///
/// Variants map one-to-one onto the HTTP outcomes the auth endpoints
/// return. `Upstream` and `Timeout` carry raw detail for logging only;
/// the HTTP layer never forwards it to clients.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// An account with this email already exists
    #[error("user already exists")]
    UserExists,

    /// Password was rejected by the pool's password policy
    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// Signup parameters were rejected (e.g. malformed email)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No account with this email
    #[error("user not found")]
    UserNotFound,

    /// Wrong email/password combination
    #[error("incorrect username or password")]
    NotAuthorized,

    /// Account exists but the email was never verified
    #[error("account not confirmed")]
    UserNotConfirmed,

    /// Bearer token is invalid, expired, or revoked
    #[error("invalid or expired token")]
    InvalidToken,

    /// The identity provider did not answer within the operation timeout
    #[error("identity provider timed out")]
    Timeout,

    /// Any other identity provider failure
    #[error("identity provider error: {0}")]
    Upstream(String),
}

/// Errors from the appointment document store (DynamoDB).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The date+time slot is already held by another appointment.
    ///
    /// Raised by the conditional write, which is the authoritative
    /// guard against double-booking.
    #[error("slot {date} {time} is already booked")]
    SlotTaken { date: String, time: String },

    /// A stored item could not be read back into an Appointment
    #[error("malformed appointment record: {0}")]
    MalformedRecord(String),

    /// The store did not answer within the operation timeout
    #[error("document store timed out")]
    Timeout,

    /// Any other store failure
    #[error("document store error: {0}")]
    Upstream(String),
}

/// Errors from the upload URL issuer (S3 pre-signing).
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// The pre-signing configuration could not be built
    #[error("failed to build pre-signed request: {0}")]
    Presign(String),

    /// The object store did not answer within the operation timeout
    #[error("object store timed out")]
    Timeout,

    /// Any other object store failure
    #[error("object store error: {0}")]
    Upstream(String),
}

/// Errors from the provisioning bootstrap.
///
/// Each variant names the resource that failed so a partially
/// provisioned environment points at the exact next step.
#[derive(Debug, Clone, Error)]
pub enum ProvisionError {
    #[error("bucket '{name}': {detail}")]
    Bucket { name: String, detail: String },

    #[error("user pool '{name}': {detail}")]
    UserPool { name: String, detail: String },

    #[error("app client '{name}': {detail}")]
    AppClient { name: String, detail: String },

    #[error("table '{name}': {detail}")]
    Table { name: String, detail: String },

    /// The table was created but never reached ACTIVE within the poll budget
    #[error("table '{name}' did not become active after {attempts} checks")]
    TableNotActive { name: String, attempts: u32 },
}
