//! COSI HTTP service layer for RustStack.
//!
//! This crate carries the COSI driver calls over a JSON-over-HTTP transport,
//! providing:
//!
//! - **Router**: Extracts the operation from the `X-Cosi-Target` header
//! - **Handler trait**: Defines the boundary between HTTP and provisioning logic
//! - **Service**: Hyper `Service` implementation, including the health probe
//! - **Response helpers**: JSON success/error response formatting

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::CosiResponseBody;
pub use dispatch::{CosiHandler, HandlerFuture};
pub use service::{CosiHttpConfig, CosiHttpService};
