//! COSI provisioning logic for RustStack.
//!
//! The [`registry`] maps caller-chosen bucket and account names to stable
//! identifiers and makes concurrent duplicate requests converge. The
//! [`provider`] drives the registry and a [`backend::ObjectStorageBackend`]
//! for each COSI call, and [`handler`] exposes it to the HTTP layer.
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod handler;
pub mod provider;
pub mod registry;

pub use config::CosiConfig;
pub use handler::RustStackCosiHandler;
pub use provider::RustStackCosi;
pub use registry::ResourceRegistry;
