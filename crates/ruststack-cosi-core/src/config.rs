//! COSI driver configuration.
//!
//! Provides [`CosiConfig`]. Process settings come from environment
//! variables; the optional JSON file named by `X_COSI_CONFIG` selects the
//! backend mode and declares injected errors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typed_builder::TypedBuilder;

use ruststack_cosi_model::error::{CosiError, CosiErrorCode};
use ruststack_cosi_model::operations::CosiOperation;

use crate::backend::s3::{S3BackendConfig, S3Credentials};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("unable to open config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid JSON for [`ConfigFile`].
    #[error("unable to read config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The mode string names no known backend.
    #[error("unsupported mode: {0:?}")]
    UnsupportedMode(String),
}

/// Which backend the driver runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverMode {
    /// A real Azure Blob store. Not available in this driver.
    AzureImpl,
    /// In-memory Azure Blob fake.
    AzureFake,
    /// A real S3-compatible store.
    S3Impl,
    /// In-memory S3 fake.
    #[default]
    S3Fake,
}

impl DriverMode {
    /// Returns the mode string, e.g. `s3:fake`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureImpl => "azure:impl",
            Self::AzureFake => "azure:fake",
            Self::S3Impl => "s3:impl",
            Self::S3Fake => "s3:fake",
        }
    }
}

impl fmt::Display for DriverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "azure:impl" => Ok(Self::AzureImpl),
            "azure:fake" => Ok(Self::AzureFake),
            "s3:impl" => Ok(Self::S3Impl),
            "s3:fake" => Ok(Self::S3Fake),
            other => Err(ConfigError::UnsupportedMode(other.to_owned())),
        }
    }
}

impl Serialize for DriverMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DriverMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An error the driver returns instead of executing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedError {
    /// Message returned to the caller.
    #[serde(default)]
    pub message: String,
    /// Status code, by name (`"Unavailable"`) or gRPC number (`14`). OK is rejected.
    #[serde(deserialize_with = "deserialize_code")]
    pub code: CosiErrorCode,
}

impl InjectedError {
    /// The COSI error this injection produces.
    #[must_use]
    pub fn to_cosi_error(&self) -> CosiError {
        CosiError::with_message(self.code, self.message.clone())
    }
}

fn deserialize_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CosiErrorCode, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CodeRepr {
        Name(CosiErrorCode),
        Number(u32),
    }

    match CodeRepr::deserialize(deserializer)? {
        CodeRepr::Name(code) => Ok(code),
        CodeRepr::Number(n) => CosiErrorCode::from_grpc_code(n)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported status code {n}"))),
    }
}

/// Per-operation injected errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultConfig {
    /// Error for `DriverGetInfo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_info: Option<InjectedError>,
    /// Error for `DriverCreateBucket`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_bucket: Option<InjectedError>,
    /// Error for `DriverDeleteBucket`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_bucket: Option<InjectedError>,
    /// Error for `DriverGrantBucketAccess`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_bucket_access: Option<InjectedError>,
    /// Error for `DriverRevokeBucketAccess`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoke_bucket_access: Option<InjectedError>,
}

impl FaultConfig {
    /// The error injected for `op`, if any.
    #[must_use]
    pub fn for_operation(&self, op: CosiOperation) -> Option<&InjectedError> {
        match op {
            CosiOperation::DriverGetInfo => self.get_info.as_ref(),
            CosiOperation::DriverCreateBucket => self.create_bucket.as_ref(),
            CosiOperation::DriverDeleteBucket => self.delete_bucket.as_ref(),
            CosiOperation::DriverGrantBucketAccess => self.grant_bucket_access.as_ref(),
            CosiOperation::DriverRevokeBucketAccess => self.revoke_bucket_access.as_ref(),
        }
    }
}

/// Contents of the JSON config file.
///
/// ```json
/// { "mode": "s3:fake", "errors": { "createBucket": { "message": "boom", "code": 13 } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Backend mode; overrides `COSI_MODE`.
    #[serde(default)]
    pub mode: Option<DriverMode>,
    /// Injected errors.
    #[serde(default)]
    pub errors: FaultConfig,
}

impl ConfigFile {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// COSI driver configuration.
///
/// # Examples
///
/// ```
/// use ruststack_cosi_core::config::{CosiConfig, DriverMode};
///
/// let config = CosiConfig::default();
/// assert_eq!(config.driver_name, "sample.objectstorage.k8s.io");
/// assert_eq!(config.mode, DriverMode::S3Fake);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CosiConfig {
    /// Listen endpoint, `unix:///path` or `tcp://host:port`.
    #[builder(default = String::from(DEFAULT_ENDPOINT))]
    pub endpoint: String,

    /// Name reported by `DriverGetInfo`.
    #[builder(default = String::from(DEFAULT_DRIVER_NAME))]
    pub driver_name: String,

    /// Optional JSON config file.
    #[builder(default)]
    pub config_path: Option<PathBuf>,

    /// Backend mode.
    #[builder(default)]
    pub mode: DriverMode,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// S3 connection settings, used in `s3:impl` mode.
    #[builder(default)]
    pub s3: S3BackendConfig,

    /// Injected errors.
    #[builder(default)]
    pub errors: FaultConfig,
}

/// Default listen endpoint.
pub const DEFAULT_ENDPOINT: &str = "unix:///var/lib/cosi/cosi.sock";

/// Default driver name.
pub const DEFAULT_DRIVER_NAME: &str = "sample.objectstorage.k8s.io";

impl Default for CosiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            driver_name: String::from(DEFAULT_DRIVER_NAME),
            config_path: None,
            mode: DriverMode::default(),
            log_level: String::from("info"),
            s3: S3BackendConfig::default(),
            errors: FaultConfig::default(),
        }
    }
}

impl CosiConfig {
    /// Load configuration from environment variables.
    ///
    /// Empty values count as unset. Reads (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `COSI_ENDPOINT` | `unix:///var/lib/cosi/cosi.sock` |
    /// | `X_COSI_DRIVER_NAME` | `sample.objectstorage.k8s.io` |
    /// | `X_COSI_CONFIG` | unset |
    /// | `COSI_MODE` | `s3:fake` |
    /// | `LOG_LEVEL` | `info` |
    /// | `S3_ENDPOINT` | empty |
    /// | `S3_REGION` | empty |
    /// | `S3_SSL` | `true` |
    /// | `S3_ADMIN_ACCESS_KEY_ID` / `S3_ADMIN_ACCESS_SECRET_KEY` | empty |
    /// | `S3_USER_ACCESS_KEY_ID` / `S3_USER_ACCESS_SECRET_KEY` | empty |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(v) = var("COSI_ENDPOINT") {
            config.endpoint = v;
        }
        if let Some(v) = var("X_COSI_DRIVER_NAME") {
            config.driver_name = v;
        }
        if let Some(v) = var("X_COSI_CONFIG") {
            config.config_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("COSI_MODE") {
            config.mode = v.parse()?;
        }
        if let Some(v) = var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = var("S3_ENDPOINT") {
            config.s3.endpoint = v;
        }
        if let Some(v) = var("S3_REGION") {
            config.s3.region = v;
        }
        if let Some(v) = var("S3_SSL") {
            config.s3.ssl = parse_bool(&v);
        }
        config.s3.admin = S3Credentials {
            access_key_id: var("S3_ADMIN_ACCESS_KEY_ID").unwrap_or_default(),
            access_secret_key: var("S3_ADMIN_ACCESS_SECRET_KEY").unwrap_or_default(),
        };
        config.s3.user = S3Credentials {
            access_key_id: var("S3_USER_ACCESS_KEY_ID").unwrap_or_default(),
            access_secret_key: var("S3_USER_ACCESS_SECRET_KEY").unwrap_or_default(),
        };

        Ok(config)
    }

    /// Merge the config file named by `config_path`, if any.
    pub fn load_file(mut self) -> Result<Self, ConfigError> {
        if let Some(path) = &self.config_path {
            let file = ConfigFile::load(path)?;
            if let Some(mode) = file.mode {
                self.mode = mode;
            }
            self.errors = file.errors;
        }
        Ok(self)
    }
}

/// Parse a string as a boolean, accepting `"1"`, `"t"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("t") || value.eq_ignore_ascii_case("true")
}
