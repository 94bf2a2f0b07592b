//! COSI operation enum.

use std::fmt;

/// All supported COSI driver operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CosiOperation {
    // Identity
    /// Report the driver name.
    DriverGetInfo,

    // Provisioner
    /// Create (or idempotently confirm) a bucket.
    DriverCreateBucket,
    /// Delete a bucket.
    DriverDeleteBucket,
    /// Grant an account access to a bucket.
    DriverGrantBucketAccess,
    /// Revoke an account's access to a bucket.
    DriverRevokeBucketAccess,
}

impl CosiOperation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::DriverGetInfo,
        Self::DriverCreateBucket,
        Self::DriverDeleteBucket,
        Self::DriverGrantBucketAccess,
        Self::DriverRevokeBucketAccess,
    ];

    /// Returns the operation name string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DriverGetInfo => "DriverGetInfo",
            Self::DriverCreateBucket => "DriverCreateBucket",
            Self::DriverDeleteBucket => "DriverDeleteBucket",
            Self::DriverGrantBucketAccess => "DriverGrantBucketAccess",
            Self::DriverRevokeBucketAccess => "DriverRevokeBucketAccess",
        }
    }

    /// Returns the COSI service that owns this operation.
    #[must_use]
    pub fn service(&self) -> &'static str {
        match self {
            Self::DriverGetInfo => "Identity",
            _ => "Provisioner",
        }
    }

    /// Returns the fully-qualified target, e.g.
    /// `cosi.v1alpha1.Provisioner.DriverCreateBucket`.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}{}.{}", TARGET_PREFIX, self.service(), self.as_str())
    }

    /// Parse a `Service.Operation` string into a `CosiOperation`.
    ///
    /// The service segment must match the operation's owning service.
    #[must_use]
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        let (service, op) = name.split_once('.')?;
        let op = Self::from_name(op)?;
        (op.service() == service).then_some(op)
    }

    /// Parse an operation name string into a `CosiOperation`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DriverGetInfo" => Some(Self::DriverGetInfo),
            "DriverCreateBucket" => Some(Self::DriverCreateBucket),
            "DriverDeleteBucket" => Some(Self::DriverDeleteBucket),
            "DriverGrantBucketAccess" => Some(Self::DriverGrantBucketAccess),
            "DriverRevokeBucketAccess" => Some(Self::DriverRevokeBucketAccess),
            _ => None,
        }
    }
}

/// The package prefix shared by every operation target.
pub const TARGET_PREFIX: &str = "cosi.v1alpha1.";

impl fmt::Display for CosiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
