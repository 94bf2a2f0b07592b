//! COSI input types.
//!
//! All input structs use `camelCase` JSON field naming, matching the protobuf
//! JSON mapping of the COSI protobuf messages. Missing maps deserialize as empty.

use serde::{Deserialize, Serialize};

use crate::types::{Parameters, Protocol};

/// Input for the `DriverGetInfo` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverGetInfoInput {}

/// Input for the `DriverCreateBucket` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverCreateBucketInput {
    /// Caller-chosen bucket name, unique among live buckets.
    #[serde(default)]
    pub name: String,

    /// Protocol the bucket must be served over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,

    /// Opaque bucket parameters, passed through to the backend.
    #[serde(default)]
    pub parameters: Parameters,
}

/// Input for the `DriverDeleteBucket` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDeleteBucketInput {
    /// Identifier returned by `DriverCreateBucket`.
    #[serde(default)]
    pub bucket_id: String,
}

/// Input for the `DriverGrantBucketAccess` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverGrantBucketAccessInput {
    /// Identifier returned by `DriverCreateBucket`.
    #[serde(default)]
    pub bucket_id: String,

    /// Account name, unique among the bucket's live grants.
    #[serde(default, rename = "name", alias = "accountName")]
    pub account_name: String,

    /// Opaque access-policy descriptor.
    #[serde(default)]
    pub access_policy: String,

    /// Opaque grant parameters.
    #[serde(default)]
    pub parameters: Parameters,
}

/// Input for the `DriverRevokeBucketAccess` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRevokeBucketAccessInput {
    /// Identifier returned by `DriverCreateBucket`.
    #[serde(default)]
    pub bucket_id: String,

    /// Identifier returned by `DriverGrantBucketAccess`.
    #[serde(default)]
    pub account_id: String,
}
