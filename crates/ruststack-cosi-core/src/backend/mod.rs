//! Object storage backends.
//!
//! The provider never talks to storage directly; it drives an
//! [`ObjectStorageBackend`] that knows how to create buckets and mint
//! credentials on one storage platform.

pub mod memory;
pub mod s3;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use ruststack_cosi_model::{CredentialDetails, Parameters, Protocol};

pub use memory::{MemoryBackend, Platform};
pub use s3::{S3Backend, S3BackendConfig};

/// Errors raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The bucket does not exist on the backend.
    #[error("backend bucket not found: {0}")]
    BucketNotFound(String),
    /// A bucket parameter could not be interpreted.
    #[error("invalid bucket parameter {key}: {reason}")]
    InvalidParameter {
        /// Parameter key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The backend call itself failed.
    #[error("{operation} failed: {message}")]
    Request {
        /// Backend operation name.
        operation: &'static str,
        /// Backend error description.
        message: String,
    },
}

/// A backend user holding credentials for one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketUser {
    /// The account name the user was created for.
    pub name: String,
    /// Storage platform the credentials are valid on, e.g. `s3`.
    pub platform: String,
    /// Named secrets, e.g. `accessKeyId` and `accessSecretKey`.
    pub credentials: HashMap<String, String>,
}

impl BucketUser {
    /// Credentials in wire form, keyed by platform.
    #[must_use]
    pub fn into_credential_map(self) -> HashMap<String, CredentialDetails> {
        HashMap::from([(
            self.platform,
            CredentialDetails {
                secrets: self.credentials,
            },
        )])
    }
}

/// Capability surface of a storage backend.
///
/// Bucket names passed here are the caller-supplied names; registry
/// identifiers never reach the backend. Deleting an absent bucket or an
/// absent grant must succeed.
#[async_trait]
pub trait ObjectStorageBackend: Send + Sync + fmt::Debug {
    /// Short backend name used in logs.
    fn kind(&self) -> &'static str;

    /// Whether the bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError>;

    /// Whether an existing bucket matches the requested parameters.
    async fn is_bucket_equal(
        &self,
        bucket: &str,
        parameters: &Parameters,
    ) -> Result<bool, BackendError>;

    /// Create the bucket. Creating a bucket this backend already owns succeeds.
    async fn create_bucket(&self, bucket: &str, parameters: &Parameters)
    -> Result<(), BackendError>;

    /// Delete the bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError>;

    /// Issue credentials for `account` on `bucket`.
    async fn create_bucket_access(
        &self,
        bucket: &str,
        account: &str,
    ) -> Result<BucketUser, BackendError>;

    /// Withdraw the credentials of `account` on `bucket`.
    async fn delete_bucket_access(&self, bucket: &str, account: &str)
    -> Result<(), BackendError>;

    /// The protocol buckets on this backend are served over.
    fn protocol_info(&self) -> Protocol;
}
