//! COSI HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Limited, LengthLimitError};
use hyper::body::Incoming;
use tracing::Instrument;

use ruststack_cosi_model::error::{CosiError, CosiErrorCode};

use crate::body::CosiResponseBody;
use crate::dispatch::{CosiHandler, dispatch_operation};
use crate::response::{CONTENT_TYPE, REQUEST_ID_HEADER, error_to_response, health_response};
use crate::router::resolve_operation;

/// Path answered by the liveness probe.
pub const HEALTH_PATH: &str = "/_cosi/health";

/// Default upper bound on request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration for the COSI HTTP service.
#[derive(Debug, Clone)]
pub struct CosiHttpConfig {
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
    /// Value of the `server` response header.
    pub server_name: String,
}

impl Default for CosiHttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            server_name: "RustStack".to_owned(),
        }
    }
}

/// Hyper `Service` implementation for the COSI driver protocol.
///
/// Wraps a [`CosiHandler`] and routes each request to the operation named
/// by its `X-Cosi-Target` header.
#[derive(Debug)]
pub struct CosiHttpService<H: CosiHandler> {
    handler: Arc<H>,
    config: Arc<CosiHttpConfig>,
}

impl<H: CosiHandler> CosiHttpService<H> {
    /// Create a new `CosiHttpService`.
    pub fn new(handler: Arc<H>, config: CosiHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }
}

impl<H: CosiHandler> Clone for CosiHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: CosiHandler> hyper::service::Service<http::Request<Incoming>> for CosiHttpService<H> {
    type Response = http::Response<CosiResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("cosi_request", request_id = %request_id);

        Box::pin(
            async move {
                let response =
                    process_request(req, handler.as_ref(), &config, &request_id).await;
                Ok(add_common_headers(response, &request_id, &config))
            }
            .instrument(span),
        )
    }
}

/// Run one request through routing, body collection and dispatch.
///
/// Generic over the body so it can be driven without a live connection.
pub async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    config: &CosiHttpConfig,
    request_id: &str,
) -> http::Response<CosiResponseBody>
where
    H: CosiHandler,
    B: http_body::Body<Data = Bytes> + Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let (parts, incoming) = req.into_parts();

    if parts.method == http::Method::GET && parts.uri.path() == HEALTH_PATH {
        return health_response();
    }

    if parts.method != http::Method::POST {
        let err = CosiError::invalid_argument(format!(
            "COSI requires POST method, got {}",
            parts.method,
        ))
        .with_status(http::StatusCode::METHOD_NOT_ALLOWED);
        return error_to_response(&err, request_id);
    }

    let op = match resolve_operation(&parts.headers) {
        Ok(op) => op,
        Err(err) => {
            tracing::debug!(error = %err, "failed to resolve COSI target");
            return error_to_response(&err, request_id);
        }
    };

    let body = match collect_body(incoming, config.max_body_bytes).await {
        Ok(body) => body,
        Err(err) => return error_to_response(&err, request_id),
    };

    match dispatch_operation(handler, op, body, request_id).await {
        Ok(response) => response,
        Err(err) => {
            if err.code == CosiErrorCode::Internal {
                tracing::warn!(operation = %op, error = %err, "COSI operation failed");
            } else {
                tracing::debug!(operation = %op, error = %err, "COSI operation rejected");
            }
            error_to_response(&err, request_id)
        }
    }
}

/// Collect the request body, refusing anything larger than `limit`.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, CosiError>
where
    B: http_body::Body<Data = Bytes> + Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                CosiError::invalid_argument(format!("Request body exceeds {limit} bytes"))
                    .with_status(http::StatusCode::PAYLOAD_TOO_LARGE)
            } else {
                CosiError::internal_error(format!("Failed to read request body: {e}"))
            }
        })
}

/// Add headers shared by every COSI response.
fn add_common_headers(
    mut response: http::Response<CosiResponseBody>,
    request_id: &str,
    config: &CosiHttpConfig,
) -> http::Response<CosiResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    if let Ok(hv) = http::HeaderValue::from_str(&config.server_name) {
        headers.insert("server", hv);
    }

    response
}
