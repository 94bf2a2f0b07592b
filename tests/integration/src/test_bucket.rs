//! Bucket lifecycle integration tests.

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use serde_json::json;

    use ruststack_cosi_model::operations::CosiOperation;

    use crate::{TestServer, test_bucket_name};

    #[tokio::test]
    async fn test_should_create_bucket_idempotently() {
        let server = TestServer::start().await;
        let name = test_bucket_name("idem");

        let first = server
            .create_bucket(&name, &json!({ "tier": "gold", "zone": "a" }))
            .await
            .unwrap();
        // Same parameters in a different order.
        let second = server
            .create_bucket(&name, &json!({ "zone": "a", "tier": "gold" }))
            .await
            .unwrap();

        assert!(first.is_ok(), "{:?}", first.body);
        assert!(second.is_ok(), "{:?}", second.body);
        assert_eq!(first.str("bucketId"), second.str("bucketId"));
        assert_eq!(first.body["bucketInfo"]["s3"]["region"], "fake");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_conflict_on_different_parameters() {
        let server = TestServer::start().await;
        let name = test_bucket_name("conflict");

        let created = server
            .create_bucket(&name, &json!({ "tier": "gold" }))
            .await
            .unwrap();
        assert!(created.is_ok());

        let conflict = server
            .create_bucket(&name, &json!({ "tier": "silver" }))
            .await
            .unwrap();
        assert_eq!(conflict.cosi_status, 6);
        assert_eq!(conflict.http_status, 409);
        assert_eq!(conflict.error_code(), "AlreadyExists");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_issue_fresh_id_after_delete() {
        let server = TestServer::start().await;
        let name = test_bucket_name("recreate");

        let first = server.create_bucket(&name, &json!({})).await.unwrap();
        let first_id = first.str("bucketId");

        let deleted = server.delete_bucket(&first_id).await.unwrap();
        assert!(deleted.is_ok());
        // Deleting again is still a success.
        let deleted = server.delete_bucket(&first_id).await.unwrap();
        assert!(deleted.is_ok());

        let second = server
            .create_bucket(&name, &json!({ "tier": "silver" }))
            .await
            .unwrap();
        assert!(second.is_ok());
        assert_ne!(second.str("bucketId"), first_id);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_require_bucket_name_and_protocol() {
        let server = TestServer::start().await;

        let reply = server.create_bucket("", &json!({})).await.unwrap();
        assert_eq!(reply.error_code(), "InvalidArgument");

        let reply = server
            .call(
                CosiOperation::DriverCreateBucket,
                &json!({ "name": test_bucket_name("noproto") }),
            )
            .await
            .unwrap();
        assert_eq!(reply.error_code(), "InvalidArgument");

        let reply = server
            .call(
                CosiOperation::DriverCreateBucket,
                &json!({ "name": test_bucket_name("azure"), "protocol": { "azureBlob": {} } }),
            )
            .await
            .unwrap();
        assert_eq!(reply.error_code(), "InvalidArgument");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_malformed_bucket_id() {
        let server = TestServer::start().await;

        let reply = server.delete_bucket("not-a-uuid").await.unwrap();
        assert_eq!(reply.cosi_status, 3);
        assert_eq!(reply.error_code(), "InvalidArgument");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_return_one_id_for_concurrent_creates() {
        let server = TestServer::start().await;
        let name = test_bucket_name("race");

        let params = json!({ "tier": "gold" });

        let replies = join_all((0..16).map(|_| server.create_bucket(&name, &params))).await;

        let ids: Vec<String> = replies
            .into_iter()
            .map(|r| {
                let r = r.unwrap();
                assert!(r.is_ok(), "{:?}", r.body);
                r.str("bucketId")
            })
            .collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));

        server.stop().await;
    }
}
