//! COSI handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use ruststack_cosi_model::error::CosiError;
use ruststack_cosi_model::operations::CosiOperation;

use crate::body::CosiResponseBody;

/// Boxed future returned by [`CosiHandler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<CosiResponseBody>, CosiError>> + Send>>;

/// Trait that the COSI driver implementation must provide.
///
/// The handler receives the resolved operation, the raw JSON body and the
/// request id assigned by the service, and returns a complete HTTP response.
/// This is the boundary between the transport and the provisioning logic.
pub trait CosiHandler: Send + Sync + 'static {
    /// Handle a COSI operation and produce an HTTP response.
    fn handle_operation(&self, op: CosiOperation, body: Bytes, request_id: String)
    -> HandlerFuture;
}

/// Dispatch a COSI operation to the handler.
pub async fn dispatch_operation<H: CosiHandler>(
    handler: &H,
    op: CosiOperation,
    body: Bytes,
    request_id: &str,
) -> Result<http::Response<CosiResponseBody>, CosiError> {
    tracing::debug!(operation = %op, request_id, "dispatching COSI operation");
    handler
        .handle_operation(op, body, request_id.to_owned())
        .await
}
