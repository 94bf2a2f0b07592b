//! COSI request router.
//!
//! Every operation is a `POST /` whose target is named in a header, in the
//! same spirit as the `awsJson` protocols:
//!
//! ```text
//! X-Cosi-Target: cosi.v1alpha1.Provisioner.DriverCreateBucket
//! ```

use ruststack_cosi_model::error::CosiError;
use ruststack_cosi_model::operations::{CosiOperation, TARGET_PREFIX};

/// Header naming the operation.
pub const TARGET_HEADER: &str = "x-cosi-target";

/// Resolve a COSI operation from request headers.
pub fn resolve_operation(headers: &http::HeaderMap) -> Result<CosiOperation, CosiError> {
    let target = headers
        .get(TARGET_HEADER)
        .ok_or_else(CosiError::missing_target)?
        .to_str()
        .map_err(|_| CosiError::missing_target())?;

    target
        .strip_prefix(TARGET_PREFIX)
        .and_then(CosiOperation::from_qualified_name)
        .ok_or_else(|| CosiError::unknown_operation(target))
}
