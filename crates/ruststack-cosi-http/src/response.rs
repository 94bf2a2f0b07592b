//! COSI response serialization and error formatting.

use ruststack_cosi_model::error::CosiError;

use crate::body::CosiResponseBody;

/// Content type for COSI JSON responses.
pub const CONTENT_TYPE: &str = "application/json";

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-cosi-request-id";

/// Header carrying the numeric gRPC status of the reply (`0` on success).
pub const STATUS_HEADER: &str = "x-cosi-status";

/// Serialize a COSI error into a JSON response body.
///
/// ```json
/// { "code": 5, "__type": "NotFound", "message": "bucket not found: …" }
/// ```
#[must_use]
pub fn error_to_json(error: &CosiError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "code": error.code.grpc_code(),
        "__type": error.code.as_str(),
        "message": error.message,
    }))
    .expect("JSON serialization of error cannot fail")
}

/// Convert a `CosiError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &CosiError, request_id: &str) -> http::Response<CosiResponseBody> {
    let body = CosiResponseBody::from_json(error_to_json(error));

    http::Response::builder()
        .status(error.status_code)
        .header("content-type", CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .header(STATUS_HEADER, error.code.grpc_code())
        .body(body)
        .expect("valid error response")
}

/// Build a success response from JSON bytes.
#[must_use]
pub fn json_response(json: Vec<u8>, request_id: &str) -> http::Response<CosiResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .header(STATUS_HEADER, 0)
        .body(CosiResponseBody::from_json(json))
        .expect("valid JSON response")
}

/// Reply to the liveness probe.
#[must_use]
pub fn health_response() -> http::Response<CosiResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .body(CosiResponseBody::from_static(r#"{"status":"running"}"#))
        .expect("static health response should be valid")
}
