//! Error body integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use ruststack_cosi_model::operations::CosiOperation;

    use crate::TestServer;

    #[tokio::test]
    async fn test_should_return_structured_error_body() {
        let server = TestServer::start().await;

        let reply = server
            .call(
                CosiOperation::DriverGrantBucketAccess,
                &json!({ "bucketId": uuid::Uuid::new_v4().to_string(), "name": "alice" }),
            )
            .await
            .unwrap();

        assert_eq!(reply.http_status, 404);
        assert_eq!(reply.cosi_status, 5);
        assert_eq!(reply.body["code"], 5);
        assert_eq!(reply.body["__type"], "NotFound");
        assert!(!reply.str("message").is_empty());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_name_malformed_account_id() {
        let server = TestServer::start().await;
        let bucket_id = uuid::Uuid::new_v4().to_string();

        let reply = server.revoke(&bucket_id, "bogus").await.unwrap();
        assert_eq!(reply.error_code(), "InvalidArgument");
        assert!(reply.str("message").contains("AccountId"));

        server.stop().await;
    }
}
