//! Upload URL issuing.
//!
//! Clients upload vehicle photos straight to object storage: the
//! backend only hands out a short-lived pre-signed PUT URL bound to a
//! server-generated object key, plus the public URL the object will be
//! readable at afterwards. The upload itself never passes through this
//! service.

mod s3;

pub use s3::S3UploadIssuer;

use async_trait::async_trait;

use crate::error::UploadError;

/// A granted upload: where to PUT, and where the object will live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    /// Pre-signed, write-capable URL, valid for the configured TTL.
    pub upload_url: String,

    /// Public read URL of the object once uploaded.
    pub public_url: String,

    /// The generated object key both URLs are bound to.
    pub key: String,
}

/// Issues time-limited write credentials for client-side uploads.
#[async_trait]
pub trait UploadIssuer: Send + Sync {
    /// Grant an upload slot for a file with the given name and type.
    ///
    /// The object key is generated server-side and collision-free; the
    /// client-supplied name only contributes a recognizable suffix.
    async fn issue(&self, file_name: &str, content_type: &str)
        -> Result<UploadTicket, UploadError>;
}
