//! In-memory backend that fakes an S3 or Azure Blob store.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use rand::RngExt;

use ruststack_cosi_model::{Parameters, Protocol};

use super::{BackendError, BucketUser, ObjectStorageBackend};

const KEY_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Storage platform emulated by [`MemoryBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// S3: `accessKeyId` / `accessSecretKey` credentials.
    #[default]
    S3,
    /// Azure Blob: an `accessToken` credential.
    Azure,
}

impl Platform {
    /// Returns the platform name used as the credentials key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Azure => "azure",
        }
    }

    fn protocol(self) -> Protocol {
        match self {
            Self::S3 => Protocol::s3("fake"),
            Self::Azure => Protocol::azure_blob("fake"),
        }
    }

    fn credentials(self) -> HashMap<String, String> {
        let (key_id, secret) = (random_key::<20>(), random_key::<40>());
        match self {
            Self::S3 => HashMap::from([
                ("accessKeyId".to_owned(), key_id),
                ("accessSecretKey".to_owned(), secret),
            ]),
            Self::Azure => HashMap::from([("accessToken".to_owned(), secret)]),
        }
    }
}

/// Generate an alphanumeric key of length `N`.
fn random_key<const N: usize>() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; N];
    rng.fill(&mut buf);
    buf.iter()
        .map(|b| char::from(KEY_CHARSET[usize::from(*b) % KEY_CHARSET.len()]))
        .collect()
}

#[derive(Debug, Default)]
struct MemoryBucket {
    parameters: Parameters,
    users: HashMap<String, BucketUser>,
}

/// Backend keeping buckets and issued credentials in process memory.
///
/// Credentials are remembered per (bucket, account), so a retried grant
/// returns the keys issued the first time.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    platform: Platform,
    buckets: DashMap<String, MemoryBucket>,
}

impl MemoryBackend {
    /// Create an empty backend for `platform`.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            buckets: DashMap::new(),
        }
    }

    /// Number of buckets currently stored.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Whether `account` currently holds credentials on `bucket`.
    #[must_use]
    pub fn has_access(&self, bucket: &str, account: &str) -> bool {
        self.buckets
            .get(bucket)
            .is_some_and(|b| b.users.contains_key(account))
    }
}

#[async_trait]
impl ObjectStorageBackend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        Ok(self.buckets.contains_key(bucket))
    }

    async fn is_bucket_equal(
        &self,
        bucket: &str,
        parameters: &Parameters,
    ) -> Result<bool, BackendError> {
        self.buckets
            .get(bucket)
            .map(|b| b.parameters == *parameters)
            .ok_or_else(|| BackendError::BucketNotFound(bucket.to_owned()))
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        parameters: &Parameters,
    ) -> Result<(), BackendError> {
        self.buckets
            .entry(bucket.to_owned())
            .or_insert_with(|| MemoryBucket {
                parameters: parameters.clone(),
                users: HashMap::new(),
            });
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.buckets.remove(bucket);
        Ok(())
    }

    async fn create_bucket_access(
        &self,
        bucket: &str,
        account: &str,
    ) -> Result<BucketUser, BackendError> {
        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| BackendError::BucketNotFound(bucket.to_owned()))?;
        let platform = self.platform;
        let user = entry
            .users
            .entry(account.to_owned())
            .or_insert_with(|| BucketUser {
                name: account.to_owned(),
                platform: platform.as_str().to_owned(),
                credentials: platform.credentials(),
            });
        Ok(user.clone())
    }

    async fn delete_bucket_access(&self, bucket: &str, account: &str) -> Result<(), BackendError> {
        if let Some(mut entry) = self.buckets.get_mut(bucket) {
            entry.users.remove(account);
        }
        Ok(())
    }

    fn protocol_info(&self) -> Protocol {
        self.platform.protocol()
    }
}
