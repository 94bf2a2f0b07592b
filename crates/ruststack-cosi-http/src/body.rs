//! COSI HTTP response body type.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Response body for COSI HTTP responses.
///
/// Every COSI reply is a small JSON document, so the body is always fully
/// buffered; `Empty` only backs `HEAD`-style probes and `Default`.
#[derive(Debug, Default)]
pub enum CosiResponseBody {
    /// A buffered JSON document.
    Json(Full<Bytes>),
    /// No payload.
    #[default]
    Empty,
}

impl CosiResponseBody {
    /// Wrap serialized JSON bytes.
    #[must_use]
    pub fn from_json(json: impl Into<Bytes>) -> Self {
        Self::Json(Full::new(json.into()))
    }

    /// Wrap a static JSON document, e.g. the health probe reply.
    #[must_use]
    pub fn from_static(json: &'static str) -> Self {
        Self::Json(Full::new(Bytes::from_static(json.as_bytes())))
    }

    /// Create an empty response body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for CosiResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Json(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Json(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Json(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
