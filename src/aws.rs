//! AWS SDK client construction.
//!
//! All three service clients share one resolved SDK configuration:
//! region, optional custom endpoint (LocalStack, MinIO), and a
//! per-operation timeout so a stalled upstream call surfaces as a
//! retryable error instead of hanging the request handler.

use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// The service clients the backend talks to.
#[derive(Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub dynamodb: aws_sdk_dynamodb::Client,
    pub cognito: aws_sdk_cognitoidentityprovider::Client,
}

impl AwsClients {
    /// Resolve credentials and build all clients.
    ///
    /// Use a custom endpoint for local stacks:
    /// ```ignore
    /// let clients = AwsClients::connect("us-east-1", Some("http://localhost:4566"), Duration::from_secs(10)).await;
    /// ```
    ///
    /// For real AWS, pass `None` to use each service's default endpoint.
    pub async fn connect(
        region: &str,
        endpoint_url: Option<&str>,
        operation_timeout: Duration,
    ) -> Self {
        let sdk_config = load_sdk_config(region, endpoint_url, operation_timeout).await;

        // S3-compatible endpoints generally require path-style addressing
        let s3_config = if endpoint_url.is_some() {
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build()
        } else {
            aws_sdk_s3::config::Builder::from(&sdk_config).build()
        };

        Self {
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            dynamodb: aws_sdk_dynamodb::Client::new(&sdk_config),
            cognito: aws_sdk_cognitoidentityprovider::Client::new(&sdk_config),
        }
    }
}

/// Load the shared SDK configuration.
async fn load_sdk_config(
    region: &str,
    endpoint_url: Option<&str>,
    operation_timeout: Duration,
) -> SdkConfig {
    let timeouts = TimeoutConfig::builder()
        .operation_timeout(operation_timeout)
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .timeout_config(timeouts);

    if let Some(endpoint) = endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}
