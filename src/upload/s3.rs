//! S3-backed implementation of [`UploadIssuer`].

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use uuid::Uuid;

use crate::error::UploadError;

use super::{UploadIssuer, UploadTicket};

/// Default lifetime of an issued upload URL.
pub const DEFAULT_UPLOAD_URL_TTL: Duration = Duration::from_secs(3600);

/// Issues pre-signed `PutObject` URLs for a single bucket.
#[derive(Clone)]
pub struct S3UploadIssuer {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
    ttl: Duration,
}

impl S3UploadIssuer {
    /// Create an issuer for the given bucket.
    ///
    /// `endpoint_url` switches the public read URL to path-style for
    /// S3-compatible endpoints (LocalStack, MinIO); with `None` the
    /// virtual-hosted AWS form is used.
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint_url: Option<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
            endpoint_url,
            ttl,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public read URL for an object key in this bucket.
    fn public_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

#[async_trait]
impl UploadIssuer for S3UploadIssuer {
    async fn issue(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadTicket, UploadError> {
        let key = object_key(file_name);

        let presigning = PresigningConfig::expires_in(self.ttl)
            .map_err(|e| UploadError::Presign(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(classify_sdk_error)?;

        Ok(UploadTicket {
            upload_url: presigned.uri().to_string(),
            public_url: self.public_url(&key),
            key,
        })
    }
}

/// Build a collision-free object key from a client-supplied file name.
///
/// The random prefix guarantees uniqueness; the sanitized name keeps
/// objects recognizable in the bucket. Path separators are stripped so
/// a name like `../../x` cannot nest keys.
fn object_key(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\'))
        .collect();
    format!("{}-{}", Uuid::new_v4(), sanitized)
}

/// Classify a generic SDK failure: timeouts become `Timeout`,
/// everything else `Upstream` with the raw detail for the logs.
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> UploadError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) => UploadError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => UploadError::Timeout,
        _ => UploadError::Upstream(format!("{:?}", err)),
    }
}

// =============================================================================
// Tests
// =============================================================================
