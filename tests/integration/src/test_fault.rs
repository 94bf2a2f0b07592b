//! Injected error and mode integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use ruststack_cosi_core::CosiConfig;
    use ruststack_cosi_core::config::{DriverMode, FaultConfig, InjectedError};
    use ruststack_cosi_model::error::CosiErrorCode;
    use ruststack_cosi_model::operations::CosiOperation;

    use crate::{TestServer, test_bucket_name};

    #[tokio::test]
    async fn test_should_return_injected_error() {
        let config = CosiConfig::builder()
            .errors(FaultConfig {
                create_bucket: Some(InjectedError {
                    message: "quota exceeded".to_owned(),
                    code: CosiErrorCode::Internal,
                }),
                ..FaultConfig::default()
            })
            .build();
        let server = TestServer::start_with(config).await;

        let reply = server
            .create_bucket(&test_bucket_name("fault"), &json!({}))
            .await
            .unwrap();
        assert_eq!(reply.cosi_status, 13);
        assert_eq!(reply.str("message"), "quota exceeded");

        // Other operations are unaffected.
        let info = server
            .call(CosiOperation::DriverGetInfo, &json!({}))
            .await
            .unwrap();
        assert!(info.is_ok());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_return_retryable_injected_error() {
        let config = CosiConfig::builder()
            .errors(FaultConfig {
                grant_bucket_access: Some(InjectedError {
                    message: "backend unavailable".to_owned(),
                    code: CosiErrorCode::Unavailable,
                }),
                ..FaultConfig::default()
            })
            .build();
        let server = TestServer::start_with(config).await;

        let bucket = server
            .create_bucket(&test_bucket_name("retry"), &json!({}))
            .await
            .unwrap();
        assert!(bucket.is_ok());

        let reply = server
            .grant(&bucket.str("bucketId"), "alice", "p1")
            .await
            .unwrap();
        assert_eq!(reply.cosi_status, 14);
        assert_eq!(reply.http_status, 503);
        assert_eq!(reply.error_code(), "Unavailable");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_serve_azure_in_azure_mode() {
        let config = CosiConfig::builder()
            .mode(DriverMode::AzureFake)
            .driver_name("azure.objectstorage.k8s.io".to_owned())
            .build();
        let server = TestServer::start_with(config).await;

        let info = server
            .call(CosiOperation::DriverGetInfo, &json!({}))
            .await
            .unwrap();
        assert_eq!(info.str("name"), "azure.objectstorage.k8s.io");

        let bucket = server
            .call(
                CosiOperation::DriverCreateBucket,
                &json!({ "name": test_bucket_name("blob"), "protocol": { "azureBlob": {} } }),
            )
            .await
            .unwrap();
        assert!(bucket.is_ok(), "{:?}", bucket.body);
        assert_eq!(bucket.body["bucketInfo"]["azureBlob"]["storageAccount"], "fake");

        let grant = server
            .grant(&bucket.str("bucketId"), "alice", "p1")
            .await
            .unwrap();
        assert!(grant.body["credentials"]["azure"]["secrets"]["accessToken"].is_string());

        server.stop().await;
    }
}
