//! Backend driving an S3-compatible object store through `aws-sdk-s3`.
//!
//! Buckets are created with the admin credentials. Grants hand out one fixed
//! set of user credentials; minting per-account IAM users is left to the
//! store's own tooling, so revoking a grant is a no-op here.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use serde::{Deserialize, Serialize};

use ruststack_cosi_model::{Parameters, Protocol};

use super::{BackendError, BucketUser, ObjectStorageBackend};

/// Bucket parameter selecting the bucket region.
pub const REGION_PARAMETER: &str = "region";

/// Bucket parameter enabling S3 object locking (`true` / `false`).
pub const OBJECT_LOCKING_PARAMETER: &str = "objectLocking";

/// A static access key pair.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Credentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub access_secret_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_secret_key", &"***")
            .finish()
    }
}

/// Connection settings for [`S3Backend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3BackendConfig {
    /// Store endpoint, with or without a scheme.
    pub endpoint: String,
    /// Region reported in the protocol info and used for signing.
    pub region: String,
    /// Whether to use TLS when the endpoint has no scheme.
    pub ssl: bool,
    /// Credentials used to manage buckets.
    pub admin: S3Credentials,
    /// Credentials handed out to every grant.
    pub user: S3Credentials,
}

impl Default for S3BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: String::new(),
            ssl: true,
            admin: S3Credentials::default(),
            user: S3Credentials::default(),
        }
    }
}

impl S3BackendConfig {
    /// The endpoint as a URL, adding a scheme when missing.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.ssl {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

/// S3-compatible backend.
#[derive(Debug)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    region: String,
    user: S3Credentials,
}

impl S3Backend {
    /// Build a backend and its SDK client from `config`.
    #[must_use]
    pub fn new(config: &S3BackendConfig) -> Self {
        let creds = Credentials::new(
            &config.admin.access_key_id,
            &config.admin.access_secret_key,
            None,
            None,
            "ruststack-cosi",
        );
        let region = if config.region.is_empty() {
            "us-east-1".to_owned()
        } else {
            config.region.clone()
        };

        let sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .credentials_provider(creds)
            .endpoint_url(config.endpoint_url())
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config),
            region,
            user: config.user.clone(),
        }
    }
}

/// Read the object-locking flag from bucket parameters.
fn object_locking(parameters: &Parameters) -> Result<bool, BackendError> {
    match parameters.get(OBJECT_LOCKING_PARAMETER).map(String::as_str) {
        None | Some("") => Ok(false),
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") || v == "t" || v == "T" => Ok(true),
        Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v == "f" || v == "F" => Ok(false),
        Some(v) => Err(BackendError::InvalidParameter {
            key: OBJECT_LOCKING_PARAMETER.to_owned(),
            reason: format!("expected a boolean, got {v:?}"),
        }),
    }
}

fn request_error(operation: &'static str, e: &impl std::error::Error) -> BackendError {
    BackendError::Request {
        operation,
        message: DisplayErrorContext(e).to_string(),
    }
}

#[async_trait]
impl ObjectStorageBackend for S3Backend {
    fn kind(&self) -> &'static str {
        "s3"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e)
                if e.as_service_error().is_some_and(|se| se.is_not_found())
                    || e.raw_response().is_some_and(|r| r.status().as_u16() == 404) =>
            {
                Ok(false)
            }
            Err(e) => Err(request_error("HeadBucket", &e)),
        }
    }

    async fn is_bucket_equal(
        &self,
        _bucket: &str,
        _parameters: &Parameters,
    ) -> Result<bool, BackendError> {
        // S3 exposes no stable view of creation parameters to compare against.
        Ok(true)
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        parameters: &Parameters,
    ) -> Result<(), BackendError> {
        let locking = object_locking(parameters)?;
        let mut request = self
            .client
            .create_bucket()
            .bucket(bucket)
            .object_lock_enabled_for_bucket(locking);

        // us-east-1 must not be sent as a location constraint.
        if let Some(region) = parameters
            .get(REGION_PARAMETER)
            .filter(|r| !r.is_empty() && r.as_str() != "us-east-1")
        {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                tracing::info!(bucket, object_locking = locking, "created S3 bucket");
                Ok(())
            }
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_bucket_already_owned_by_you()) =>
            {
                Ok(())
            }
            Err(e) => Err(request_error("CreateBucket", &e)),
        }
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        match self.client.delete_bucket().bucket(bucket).send().await {
            Ok(_) => {
                tracing::info!(bucket, "deleted S3 bucket");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.code() == Some("NoSuchBucket"))
                    || e.raw_response().is_some_and(|r| r.status().as_u16() == 404) =>
            {
                Ok(())
            }
            Err(e) => Err(request_error("DeleteBucket", &e)),
        }
    }

    async fn create_bucket_access(
        &self,
        _bucket: &str,
        account: &str,
    ) -> Result<BucketUser, BackendError> {
        Ok(BucketUser {
            name: account.to_owned(),
            platform: "s3".to_owned(),
            credentials: HashMap::from([
                ("accessKeyId".to_owned(), self.user.access_key_id.clone()),
                (
                    "accessSecretKey".to_owned(),
                    self.user.access_secret_key.clone(),
                ),
            ]),
        })
    }

    async fn delete_bucket_access(&self, _bucket: &str, _account: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn protocol_info(&self) -> Protocol {
        Protocol::s3(self.region.clone())
    }
}
