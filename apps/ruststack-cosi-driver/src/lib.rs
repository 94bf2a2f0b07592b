//! RustStack COSI driver server.
//!
//! Wires configuration, the storage backend and the HTTP service together,
//! and serves them on a TCP or Unix socket endpoint.

pub mod endpoint;
pub mod server;

use std::sync::Arc;

use anyhow::{Result, bail};

use ruststack_cosi_core::backend::{MemoryBackend, ObjectStorageBackend, Platform, S3Backend};
use ruststack_cosi_core::config::DriverMode;
use ruststack_cosi_core::{CosiConfig, RustStackCosi, RustStackCosiHandler};
use ruststack_cosi_http::service::{CosiHttpConfig, CosiHttpService};

/// Instantiate the backend selected by `config.mode`.
pub fn build_backend(config: &CosiConfig) -> Result<Arc<dyn ObjectStorageBackend>> {
    let backend: Arc<dyn ObjectStorageBackend> = match config.mode {
        DriverMode::S3Fake => Arc::new(MemoryBackend::new(Platform::S3)),
        DriverMode::AzureFake => Arc::new(MemoryBackend::new(Platform::Azure)),
        DriverMode::S3Impl => {
            if config.s3.endpoint.is_empty() {
                bail!("S3_ENDPOINT is required in {} mode", config.mode);
            }
            Arc::new(S3Backend::new(&config.s3))
        }
        DriverMode::AzureImpl => bail!("{} mode is not supported", config.mode),
    };
    Ok(backend)
}

/// Build the HTTP service for `config`, with a fresh registry.
pub fn build_service(config: CosiConfig) -> Result<CosiHttpService<RustStackCosiHandler>> {
    let backend = build_backend(&config)?;
    let provider = RustStackCosi::new(config, backend);
    let handler = RustStackCosiHandler::new(Arc::new(provider));
    Ok(CosiHttpService::new(
        Arc::new(handler),
        CosiHttpConfig::default(),
    ))
}
