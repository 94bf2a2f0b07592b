//! RustStack COSI driver - object storage provisioning over COSI.
//!
//! Serves the COSI identity and provisioner calls as JSON over HTTP on a
//! Unix socket (the default, for use as a Kubernetes sidecar) or a TCP
//! address.
//!
//! # Usage
//!
//! ```text
//! COSI_ENDPOINT=tcp://0.0.0.0:9000 COSI_MODE=s3:fake ruststack-cosi-driver
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `COSI_ENDPOINT` | `unix:///var/lib/cosi/cosi.sock` | Listen endpoint |
//! | `X_COSI_DRIVER_NAME` | `sample.objectstorage.k8s.io` | Name reported by `DriverGetInfo` |
//! | `X_COSI_CONFIG` | *(unset)* | JSON file with `mode` and injected `errors` |
//! | `COSI_MODE` | `s3:fake` | `s3:fake`, `azure:fake` or `s3:impl` |
//! | `S3_ENDPOINT`, `S3_REGION`, `S3_SSL` | | S3 store used in `s3:impl` mode |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ruststack_cosi_core::CosiConfig;
use ruststack_cosi_driver::endpoint::{Endpoint, bind_unix, probe_health};
use ruststack_cosi_driver::server::{serve, shutdown_signal};
use ruststack_cosi_driver::build_service;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for container liveness probes.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = match CosiConfig::from_env() {
            Ok(config) => match config.endpoint.parse::<Endpoint>() {
                Ok(endpoint) => probe_health(&endpoint).await.is_ok(),
                Err(_) => false,
            },
            Err(_) => false,
        };
        std::process::exit(i32::from(!healthy));
    }

    let config = CosiConfig::from_env()
        .context("invalid environment")?
        .load_file()
        .context("unable to load config file")?;

    init_tracing(&config.log_level)?;

    info!(
        endpoint = %config.endpoint,
        driver_name = %config.driver_name,
        mode = %config.mode,
        version = VERSION,
        "starting RustStack COSI driver",
    );

    let endpoint: Endpoint = config.endpoint.parse()?;
    let service = build_service(config).context("failed to build backend")?;

    match endpoint {
        Endpoint::Tcp(addr) => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind to {addr}"))?;
            info!(%addr, "listening for connections");
            serve(listener, service, shutdown_signal()).await;
        }
        Endpoint::Unix(path) => {
            let (listener, _cleanup) = bind_unix(&path)?;
            info!(path = %path.display(), "listening for connections");
            serve(listener, service, shutdown_signal()).await;
        }
    }

    Ok(())
}
