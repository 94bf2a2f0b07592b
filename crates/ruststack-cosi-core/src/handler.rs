//! COSI handler implementation bridging HTTP to the provider.

use std::sync::Arc;

use bytes::Bytes;

use ruststack_cosi_http::body::CosiResponseBody;
use ruststack_cosi_http::dispatch::{CosiHandler, HandlerFuture};
use ruststack_cosi_http::response::json_response;
use ruststack_cosi_model::error::CosiError;
use ruststack_cosi_model::operations::CosiOperation;

use crate::provider::RustStackCosi;

/// Handler that bridges the HTTP layer to the COSI provider.
#[derive(Debug)]
pub struct RustStackCosiHandler {
    provider: Arc<RustStackCosi>,
}

impl RustStackCosiHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<RustStackCosi>) -> Self {
        Self { provider }
    }
}

impl CosiHandler for RustStackCosiHandler {
    fn handle_operation(&self, op: CosiOperation, body: Bytes, request_id: String) -> HandlerFuture {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move { dispatch(provider.as_ref(), op, &body, &request_id).await })
    }
}

/// Dispatch a COSI operation to the matching provider method.
async fn dispatch(
    provider: &RustStackCosi,
    op: CosiOperation,
    body: &[u8],
    request_id: &str,
) -> Result<http::Response<CosiResponseBody>, CosiError> {
    match op {
        CosiOperation::DriverGetInfo => {
            let output = provider.handle_get_info(deserialize(body)?)?;
            serialize(&output, request_id)
        }
        CosiOperation::DriverCreateBucket => {
            let output = provider.handle_create_bucket(deserialize(body)?).await?;
            serialize(&output, request_id)
        }
        CosiOperation::DriverDeleteBucket => {
            let output = provider.handle_delete_bucket(deserialize(body)?).await?;
            serialize(&output, request_id)
        }
        CosiOperation::DriverGrantBucketAccess => {
            let output = provider
                .handle_grant_bucket_access(deserialize(body)?)
                .await?;
            serialize(&output, request_id)
        }
        CosiOperation::DriverRevokeBucketAccess => {
            let output = provider
                .handle_revoke_bucket_access(deserialize(body)?)
                .await?;
            serialize(&output, request_id)
        }
    }
}

/// Deserialize a JSON request body; an empty body reads as `{}`.
fn deserialize<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, CosiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| {
        CosiError::invalid_argument(format!("Failed to deserialize request body: {e}"))
    })
}

/// Serialize an output type into a JSON HTTP response.
fn serialize<T: serde::Serialize>(
    output: &T,
    request_id: &str,
) -> Result<http::Response<CosiResponseBody>, CosiError> {
    let json = serde_json::to_vec(output)
        .map_err(|e| CosiError::internal_error(format!("Failed to serialize response: {e}")))?;
    Ok(json_response(json, request_id))
}
