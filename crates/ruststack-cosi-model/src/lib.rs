//! COSI provisioner model types for RustStack.
//!
//! This crate provides the wire types for the Container Object Storage
//! Interface (COSI) driver: the identity call, the four provisioner calls,
//! the protocol descriptors reported by a storage backend, and the error
//! taxonomy shared by the HTTP and core layers. The types are hand-written;
//! the JSON protocol makes serde derives trivial.
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use error::{CosiError, CosiErrorCode};
pub use operations::CosiOperation;
pub use types::{CredentialDetails, Parameters, Protocol, ProtocolKind};
