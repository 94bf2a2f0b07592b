//! Transport-level integration tests: health and routing.

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use ruststack_cosi_model::operations::CosiOperation;

    use crate::{STATUS_HEADER, TestServer};

    #[tokio::test]
    async fn test_should_report_health() {
        let server = TestServer::start().await;

        let response = server
            .client()
            .get(format!("{}/_cosi/health", server.base_url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert!(response.headers().contains_key("x-cosi-request-id"));
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "running");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_return_driver_name() {
        let server = TestServer::start().await;

        let reply = server
            .call(CosiOperation::DriverGetInfo, &json!({}))
            .await
            .unwrap();

        assert!(reply.is_ok());
        assert_eq!(reply.http_status, 200);
        assert_eq!(reply.str("name"), "sample.objectstorage.k8s.io");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_unknown_target() {
        let server = TestServer::start().await;

        let reply = server
            .call_target("cosi.v1alpha1.Provisioner.DriverResizeBucket", &json!({}))
            .await
            .unwrap();
        assert_eq!(reply.cosi_status, 12);
        assert_eq!(reply.http_status, 501);
        assert_eq!(reply.error_code(), "Unimplemented");

        // GetInfo belongs to the identity service, not the provisioner.
        let reply = server
            .call_target("cosi.v1alpha1.Provisioner.DriverGetInfo", &json!({}))
            .await
            .unwrap();
        assert_eq!(reply.error_code(), "Unimplemented");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_missing_target() {
        let server = TestServer::start().await;

        let response = server
            .client()
            .post(server.base_url())
            .body("{}")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(response.headers()[STATUS_HEADER], "3");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_wrong_method() {
        let server = TestServer::start().await;

        let response = server
            .client()
            .put(server.base_url())
            .header("x-cosi-target", CosiOperation::DriverGetInfo.target())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 405);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_malformed_json() {
        let server = TestServer::start().await;

        let response = server
            .client()
            .post(server.base_url())
            .header("x-cosi-target", CosiOperation::DriverCreateBucket.target())
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["__type"], "InvalidArgument");

        server.stop().await;
    }
}
