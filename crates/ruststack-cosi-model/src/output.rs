//! COSI output types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{CredentialDetails, Protocol};

/// Output for the `DriverGetInfo` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverGetInfoOutput {
    /// The driver name, e.g. `sample.objectstorage.k8s.io`.
    pub name: String,
}

/// Output for the `DriverCreateBucket` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverCreateBucketOutput {
    /// Stable identifier of the bucket.
    pub bucket_id: String,

    /// Protocol details reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_info: Option<Protocol>,
}

/// Output for the `DriverDeleteBucket` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverDeleteBucketOutput {}

/// Output for the `DriverGrantBucketAccess` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverGrantBucketAccessOutput {
    /// Stable identifier of the grant.
    pub account_id: String,

    /// Credentials keyed by storage platform, e.g. `s3`.
    #[serde(default)]
    pub credentials: HashMap<String, CredentialDetails>,
}

/// Output for the `DriverRevokeBucketAccess` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverRevokeBucketAccessOutput {}
