//! Access grant integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{TestServer, test_bucket_name};

    #[tokio::test]
    async fn test_should_run_photos_lifecycle() {
        let server = TestServer::start().await;
        let name = test_bucket_name("photos");

        let bucket = server.create_bucket(&name, &json!({})).await.unwrap();
        let bucket_id = bucket.str("bucketId");

        let alice = server.grant(&bucket_id, "alice", "p1").await.unwrap();
        assert!(alice.is_ok(), "{:?}", alice.body);
        let secrets = &alice.body["credentials"]["s3"]["secrets"];
        assert_eq!(secrets["accessKeyId"].as_str().unwrap().len(), 20);
        assert_eq!(secrets["accessSecretKey"].as_str().unwrap().len(), 40);

        let retried = server.grant(&bucket_id, "alice", "p1").await.unwrap();
        assert_eq!(retried.str("accountId"), alice.str("accountId"));
        assert_eq!(retried.body["credentials"], alice.body["credentials"]);

        let conflict = server.grant(&bucket_id, "alice", "p2").await.unwrap();
        assert_eq!(conflict.error_code(), "AlreadyExists");

        let bob = server.grant(&bucket_id, "bob", "p1").await.unwrap();
        assert!(bob.is_ok());
        assert_ne!(bob.str("accountId"), alice.str("accountId"));

        let revoked = server
            .revoke(&bucket_id, &alice.str("accountId"))
            .await
            .unwrap();
        assert!(revoked.is_ok());
        let revoked = server
            .revoke(&bucket_id, &alice.str("accountId"))
            .await
            .unwrap();
        assert!(revoked.is_ok());

        let regranted = server.grant(&bucket_id, "alice", "p2").await.unwrap();
        assert!(regranted.is_ok());
        assert_ne!(regranted.str("accountId"), alice.str("accountId"));

        let deleted = server.delete_bucket(&bucket_id).await.unwrap();
        assert!(deleted.is_ok());

        let orphan = server.grant(&bucket_id, "carol", "p1").await.unwrap();
        assert_eq!(orphan.cosi_status, 5);
        assert_eq!(orphan.error_code(), "NotFound");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_scope_accounts_to_bucket() {
        let server = TestServer::start().await;

        let photos = server
            .create_bucket(&test_bucket_name("photos"), &json!({}))
            .await
            .unwrap()
            .str("bucketId");
        let videos = server
            .create_bucket(&test_bucket_name("videos"), &json!({}))
            .await
            .unwrap()
            .str("bucketId");

        let on_photos = server.grant(&photos, "alice", "p1").await.unwrap();
        let on_videos = server.grant(&videos, "alice", "p2").await.unwrap();
        assert!(on_photos.is_ok());
        assert!(on_videos.is_ok());
        assert_ne!(on_photos.str("accountId"), on_videos.str("accountId"));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_refuse_revoke_on_missing_bucket() {
        let server = TestServer::start().await;

        let reply = server
            .revoke(
                &uuid::Uuid::new_v4().to_string(),
                &uuid::Uuid::new_v4().to_string(),
            )
            .await
            .unwrap();
        assert_eq!(reply.error_code(), "NotFound");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_require_account_name() {
        let server = TestServer::start().await;
        let bucket_id = server
            .create_bucket(&test_bucket_name("noname"), &json!({}))
            .await
            .unwrap()
            .str("bucketId");

        let reply = server.grant(&bucket_id, "", "p1").await.unwrap();
        assert_eq!(reply.error_code(), "InvalidArgument");

        server.stop().await;
    }
}
