//! Integration tests for the RustStack COSI driver.
//!
//! Each test starts its own driver on an ephemeral TCP port inside the test
//! process and talks to it over HTTP, so no external server is needed.
//!
//! ```text
//! cargo test -p ruststack-cosi-integration
//! ```

use std::sync::Once;

use anyhow::Result;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use ruststack_cosi_core::CosiConfig;
use ruststack_cosi_driver::build_service;
use ruststack_cosi_driver::server::serve;
use ruststack_cosi_model::operations::CosiOperation;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Header carrying the COSI status code on every response.
pub const STATUS_HEADER: &str = "x-cosi-status";

/// A driver response: HTTP status, COSI status code and JSON body.
#[derive(Debug)]
pub struct CosiReply {
    /// HTTP status code.
    pub http_status: u16,
    /// COSI (gRPC) status code, 0 on success.
    pub cosi_status: u32,
    /// Decoded JSON body.
    pub body: Value,
}

impl CosiReply {
    /// Whether the call succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.cosi_status == 0
    }

    /// The error name (`__type`) of an error body.
    #[must_use]
    pub fn error_code(&self) -> &str {
        self.body["__type"].as_str().unwrap_or_default()
    }

    /// A string field of the body.
    #[must_use]
    pub fn str(&self, field: &str) -> String {
        self.body[field].as_str().unwrap_or_default().to_owned()
    }
}

/// A driver running in the test process.
#[derive(Debug)]
pub struct TestServer {
    base_url: String,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a driver with the default (`s3:fake`) configuration.
    pub async fn start() -> Self {
        Self::start_with(CosiConfig::default()).await
    }

    /// Start a driver with `config`, listening on an ephemeral port.
    pub async fn start_with(config: CosiConfig) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("listener has no address");
        let service = build_service(config).expect("failed to build driver");
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(serve(listener, service, async {
            rx.await.ok();
        }));

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// Base URL of the driver.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared HTTP client.
    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Invoke `op` with a JSON body.
    pub async fn call(&self, op: CosiOperation, body: &Value) -> Result<CosiReply> {
        self.call_target(&op.target(), body).await
    }

    /// Invoke an arbitrary target string.
    pub async fn call_target(&self, target: &str, body: &Value) -> Result<CosiReply> {
        let response = self
            .client
            .post(&self.base_url)
            .header("x-cosi-target", target)
            .json(body)
            .send()
            .await?;
        reply(response).await
    }

    /// Create a bucket served over S3.
    pub async fn create_bucket(&self, name: &str, parameters: &Value) -> Result<CosiReply> {
        self.call(
            CosiOperation::DriverCreateBucket,
            &json!({ "name": name, "protocol": { "s3": {} }, "parameters": parameters }),
        )
        .await
    }

    /// Delete a bucket by id.
    pub async fn delete_bucket(&self, bucket_id: &str) -> Result<CosiReply> {
        self.call(
            CosiOperation::DriverDeleteBucket,
            &json!({ "bucketId": bucket_id }),
        )
        .await
    }

    /// Grant `account` access to a bucket.
    pub async fn grant(&self, bucket_id: &str, account: &str, policy: &str) -> Result<CosiReply> {
        self.call(
            CosiOperation::DriverGrantBucketAccess,
            &json!({ "bucketId": bucket_id, "name": account, "accessPolicy": policy }),
        )
        .await
    }

    /// Revoke a grant.
    pub async fn revoke(&self, bucket_id: &str, account_id: &str) -> Result<CosiReply> {
        self.call(
            CosiOperation::DriverRevokeBucketAccess,
            &json!({ "bucketId": bucket_id, "accountId": account_id }),
        )
        .await
    }

    /// Stop accepting connections and wait for the server to drain.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        if let Some(task) = self.task.take() {
            task.await.ok();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn reply(response: reqwest::Response) -> Result<CosiReply> {
    let http_status = response.status().as_u16();
    let cosi_status = response
        .headers()
        .get(STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(u32::MAX);
    let body = response.json::<Value>().await?;
    Ok(CosiReply {
        http_status,
        cosi_status,
        body,
    })
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

mod test_access;
mod test_bucket;
mod test_error;
mod test_fault;
mod test_server;
