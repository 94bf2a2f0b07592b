//! Core error types and their mapping onto COSI status codes.

use ruststack_cosi_model::error::{CosiError, CosiErrorCode};

use crate::backend::BackendError;
use crate::registry::BucketId;

/// Errors raised by the resource registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A live bucket with this name has different parameters.
    #[error("bucket {name} already exists with different parameters")]
    BucketConflict {
        /// Bucket name.
        name: String,
    },
    /// The bucket id does not refer to a live bucket.
    #[error("bucket not found: {0}")]
    BucketNotFound(BucketId),
    /// A live grant for this account has different parameters.
    #[error("account {name} already exists with different parameters")]
    AccountParametersConflict {
        /// Account name.
        name: String,
    },
    /// A live grant for this account has a different access policy.
    #[error("account {name} already exists with different access policy")]
    AccountPolicyConflict {
        /// Account name.
        name: String,
    },
}

impl From<RegistryError> for CosiError {
    fn from(e: RegistryError) -> Self {
        let code = match e {
            RegistryError::BucketNotFound(_) => CosiErrorCode::NotFound,
            RegistryError::BucketConflict { .. }
            | RegistryError::AccountParametersConflict { .. }
            | RegistryError::AccountPolicyConflict { .. } => CosiErrorCode::AlreadyExists,
        };
        CosiError::with_message(code, e.to_string())
    }
}

/// Convert a backend failure into a COSI error.
///
/// Takes `e` by value because this is used as a closure argument to `.map_err()`.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn backend_error_to_cosi(e: BackendError) -> CosiError {
    let code = match &e {
        BackendError::InvalidParameter { .. } => CosiErrorCode::InvalidArgument,
        BackendError::BucketNotFound(_) | BackendError::Request { .. } => CosiErrorCode::Internal,
    };
    CosiError::with_message(code, e.to_string())
}
