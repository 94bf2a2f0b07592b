//! Shared COSI types: parameter maps, protocol descriptors and credentials.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, order-irrelevant string parameters attached to buckets and grants.
///
/// Two parameter sets are equal when they hold the same keys with the same
/// values, which is exactly `HashMap`'s `PartialEq`.
pub type Parameters = HashMap<String, String>;

/// The storage protocol a bucket is served over.
///
/// Serialized externally tagged, e.g. `{"s3": {"region": "us-east-1"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Protocol {
    /// Amazon S3 compatible storage.
    S3(S3Protocol),
    /// Azure Blob storage.
    AzureBlob(AzureBlobProtocol),
    /// Google Cloud Storage.
    Gcs(GcsProtocol),
}

impl Protocol {
    /// The protocol family, ignoring any details.
    #[must_use]
    pub fn kind(&self) -> ProtocolKind {
        match self {
            Self::S3(_) => ProtocolKind::S3,
            Self::AzureBlob(_) => ProtocolKind::AzureBlob,
            Self::Gcs(_) => ProtocolKind::Gcs,
        }
    }

    /// An S3 protocol descriptor for `region` using SigV4.
    #[must_use]
    pub fn s3(region: impl Into<String>) -> Self {
        Self::S3(S3Protocol {
            region: region.into(),
            signature_version: S3SignatureVersion::S3V4,
        })
    }

    /// An Azure Blob protocol descriptor for `storage_account`.
    #[must_use]
    pub fn azure_blob(storage_account: impl Into<String>) -> Self {
        Self::AzureBlob(AzureBlobProtocol {
            storage_account: storage_account.into(),
        })
    }
}

/// The protocol family without its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    /// Amazon S3 compatible storage.
    S3,
    /// Azure Blob storage.
    AzureBlob,
    /// Google Cloud Storage.
    Gcs,
}

impl ProtocolKind {
    /// Returns the wire name of the protocol family.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::AzureBlob => "azureBlob",
            Self::Gcs => "gcs",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// S3 protocol details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Protocol {
    /// Region the bucket lives in.
    #[serde(default)]
    pub region: String,
    /// Signature version clients must use.
    #[serde(default)]
    pub signature_version: S3SignatureVersion,
}

/// S3 request signature version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum S3SignatureVersion {
    /// Not specified.
    #[serde(rename = "UnknownSignature")]
    Unknown,
    /// AWS Signature Version 2.
    S3V2,
    /// AWS Signature Version 4.
    #[default]
    S3V4,
}

/// Azure Blob protocol details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureBlobProtocol {
    /// Storage account holding the container.
    #[serde(default)]
    pub storage_account: String,
}

/// Google Cloud Storage protocol details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsProtocol {
    /// Name of the private key.
    #[serde(default)]
    pub private_key_name: String,
    /// Project the bucket belongs to.
    #[serde(default)]
    pub project_id: String,
    /// Service account used for access.
    #[serde(default)]
    pub service_account: String,
}

/// Named secrets issued for one storage platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDetails {
    /// Secret name to secret value, e.g. `accessKeyId` → `AKIA…`.
    #[serde(default)]
    pub secrets: HashMap<String, String>,
}
