//! Configuration management for the booking backend.
//!
//! Supports command-line arguments via clap, environment variables with
//! an `AUTOSHOP_` prefix, and sensible defaults for everything except
//! nothing: the whole configuration has defaults, so `autoshop-booking`
//! with valid AWS credentials starts out of the box.
//!
//! # Environment Variables
//!
//! - `AUTOSHOP_HOST` - Server bind address (default: 0.0.0.0)
//! - `AUTOSHOP_PORT` - Server port (default: 5555)
//! - `AUTOSHOP_AWS_REGION` - AWS region (default: us-east-1)
//! - `AUTOSHOP_AWS_ENDPOINT` - Custom endpoint for LocalStack/MinIO
//! - `AUTOSHOP_BUCKET` - Image bucket name (default: autoshop-images)
//! - `AUTOSHOP_USER_POOL` - User pool name (default: AutoShopUserPool)
//! - `AUTOSHOP_APP_CLIENT` - App client name (default: autoshop-web-client)
//! - `AUTOSHOP_TABLE` - Appointments table name (default: Appointments)
//! - `AUTOSHOP_ASSETS_DIR` - Static front-end directory (default: frontend)
//! - `AUTOSHOP_STRICT_VALIDATION` - Enable the strict booking rule set
//! - `AUTOSHOP_AUTO_CONFIRM` - Auto-confirm signups (demo environments)
//! - `AUTOSHOP_UPLOAD_URL_TTL` - Upload URL lifetime in seconds
//! - `AUTOSHOP_OPERATION_TIMEOUT` - Per-call AWS timeout in seconds
//! - `AUTOSHOP_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::appointment::{SlotPolicy, SlotValidator};
use crate::provision::ProvisionSpec;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5555;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default image bucket name.
pub const DEFAULT_BUCKET: &str = "autoshop-images";

/// Default Cognito user pool name.
pub const DEFAULT_USER_POOL: &str = "AutoShopUserPool";

/// Default Cognito app client name.
pub const DEFAULT_APP_CLIENT: &str = "autoshop-web-client";

/// Default appointments table name.
pub const DEFAULT_TABLE: &str = "Appointments";

/// Default static assets directory.
pub const DEFAULT_ASSETS_DIR: &str = "frontend";

/// Default upload URL lifetime in seconds (1 hour).
pub const DEFAULT_UPLOAD_URL_TTL: u64 = 3600;

/// Default per-operation AWS call timeout in seconds.
pub const DEFAULT_OPERATION_TIMEOUT: u64 = 10;

// =============================================================================
// CLI
// =============================================================================

/// Appointment booking backend for an auto-service shop.
///
/// Serves the booking API backed by Cognito (accounts), S3 (image
/// uploads via pre-signed URLs), and DynamoDB (appointment records).
#[derive(Parser, Debug)]
#[command(name = "autoshop-booking")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeConfig,
}

impl Cli {
    /// Resolve the subcommand, defaulting to `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision the backing resources (idempotent) and serve the API
    Serve(ServeConfig),

    /// Ensure the backing AWS resources exist, print their ids, and exit
    Provision(ProvisionConfig),

    /// Verify credentials and resource reachability without serving
    Check(CheckConfig),
}

// =============================================================================
// Shared AWS Targets
// =============================================================================

/// Names of the AWS resources the backend works against.
#[derive(Args, Debug, Clone)]
pub struct AwsTargets {
    /// AWS region.
    #[arg(long, default_value = DEFAULT_REGION, env = "AUTOSHOP_AWS_REGION")]
    pub aws_region: String,

    /// Custom AWS endpoint URL for local stacks (LocalStack, MinIO).
    ///
    /// If not specified, each service's default endpoint is used.
    #[arg(long, env = "AUTOSHOP_AWS_ENDPOINT")]
    pub aws_endpoint: Option<String>,

    /// S3 bucket holding uploaded vehicle images.
    #[arg(long, default_value = DEFAULT_BUCKET, env = "AUTOSHOP_BUCKET")]
    pub bucket: String,

    /// Cognito user pool name.
    #[arg(long, default_value = DEFAULT_USER_POOL, env = "AUTOSHOP_USER_POOL")]
    pub user_pool: String,

    /// Cognito app client name.
    #[arg(long, default_value = DEFAULT_APP_CLIENT, env = "AUTOSHOP_APP_CLIENT")]
    pub app_client: String,

    /// DynamoDB appointments table name.
    #[arg(long, default_value = DEFAULT_TABLE, env = "AUTOSHOP_TABLE")]
    pub table: String,
}

impl AwsTargets {
    /// The provisioning view of these targets.
    pub fn provision_spec(&self) -> ProvisionSpec {
        ProvisionSpec {
            bucket: self.bucket.clone(),
            user_pool_name: self.user_pool.clone(),
            app_client_name: self.app_client.clone(),
            table: self.table.clone(),
            region: self.aws_region.clone(),
        }
    }
}

// =============================================================================
// Serve Configuration
// =============================================================================

/// Configuration for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "AUTOSHOP_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "AUTOSHOP_PORT")]
    pub port: u16,

    #[command(flatten)]
    pub aws: AwsTargets,

    // =========================================================================
    // Behavior Configuration
    // =========================================================================
    /// Enable the strict booking rule set (timestamp-granularity past
    /// check, weekday-only, duration fit, collision pre-check).
    #[arg(long, default_value_t = false, env = "AUTOSHOP_STRICT_VALIDATION")]
    pub strict_validation: bool,

    /// Auto-confirm new accounts at signup, skipping email
    /// verification. Demo/test environments only.
    #[arg(long, default_value_t = false, env = "AUTOSHOP_AUTO_CONFIRM")]
    pub auto_confirm_users: bool,

    /// Skip the provisioning bootstrap (resources must already exist).
    #[arg(long, default_value_t = false)]
    pub skip_provision: bool,

    /// Upload URL lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_UPLOAD_URL_TTL, env = "AUTOSHOP_UPLOAD_URL_TTL")]
    pub upload_url_ttl: u64,

    /// Per-operation AWS call timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_OPERATION_TIMEOUT, env = "AUTOSHOP_OPERATION_TIMEOUT")]
    pub operation_timeout: u64,

    // =========================================================================
    // Front-end Configuration
    // =========================================================================
    /// Directory of static front-end assets served as the fallback
    /// route. Pass an empty string to disable.
    #[arg(long, default_value = DEFAULT_ASSETS_DIR, env = "AUTOSHOP_ASSETS_DIR")]
    pub assets_dir: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "AUTOSHOP_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.aws.bucket.is_empty() {
            return Err("bucket name is required. Set --bucket or AUTOSHOP_BUCKET".to_string());
        }
        if self.aws.user_pool.is_empty() {
            return Err(
                "user pool name is required. Set --user-pool or AUTOSHOP_USER_POOL".to_string(),
            );
        }
        if self.aws.app_client.is_empty() {
            return Err(
                "app client name is required. Set --app-client or AUTOSHOP_APP_CLIENT".to_string(),
            );
        }
        if self.aws.table.is_empty() {
            return Err("table name is required. Set --table or AUTOSHOP_TABLE".to_string());
        }
        if self.upload_url_ttl == 0 {
            return Err("upload_url_ttl must be greater than 0".to_string());
        }
        if self.operation_timeout == 0 {
            return Err("operation_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The slot validator implied by this configuration.
    pub fn slot_validator(&self) -> SlotValidator {
        if self.strict_validation {
            SlotValidator::new(SlotPolicy::Strict)
        } else {
            SlotValidator::new(SlotPolicy::Discrete)
        }
    }

    /// Upload URL lifetime as a duration.
    pub fn upload_ttl(&self) -> Duration {
        Duration::from_secs(self.upload_url_ttl)
    }

    /// Per-operation AWS timeout as a duration.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout)
    }

    /// The assets directory, if serving static assets is enabled.
    pub fn assets_dir(&self) -> Option<&str> {
        if self.assets_dir.is_empty() {
            None
        } else {
            Some(&self.assets_dir)
        }
    }
}

// =============================================================================
// Provision / Check Configuration
// =============================================================================

/// Configuration for the `provision` command.
#[derive(Args, Debug, Clone)]
pub struct ProvisionConfig {
    #[command(flatten)]
    pub aws: AwsTargets,

    /// Per-operation AWS call timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_OPERATION_TIMEOUT, env = "AUTOSHOP_OPERATION_TIMEOUT")]
    pub operation_timeout: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ProvisionConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout)
    }
}

/// Configuration for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub aws: AwsTargets,

    /// Per-operation AWS call timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_OPERATION_TIMEOUT, env = "AUTOSHOP_OPERATION_TIMEOUT")]
    pub operation_timeout: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout)
    }
}

// =============================================================================
// Tests
// =============================================================================
