//! The client over the HTTP transport against a wiremock server.

use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use weaviate::interceptors::{HeaderInterceptor, TimingInterceptor};
use weaviate::pipeline::RequestPipeline;
use weaviate::request::{ConsistencyLevel, FetchObjects, ObjectInsert};
use weaviate::testing::MockGrpcTransport;
use weaviate::transport::HttpTransport;
use weaviate::{Client, ErrorKind, RetryConfig};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::init_tracing;

async fn client_for(
    server: &MockServer,
    pipeline: RequestPipeline,
) -> Client<HttpTransport, MockGrpcTransport> {
    init_tracing();
    let rest = HttpTransport::builder()
        .base_url_str(&server.uri())
        .unwrap()
        .header("Authorization", "Bearer test-key")
        .retry_config(
            RetryConfig::default()
                .with_max_retries(2)
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(5))
                .with_jitter(0.0),
        )
        .build()
        .unwrap();
    Client::new(rest, MockGrpcTransport::new()).with_pipeline(pipeline)
}

#[tokio::test]
async fn test_meta_and_health_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/meta"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hostname": "http://[::]:8080",
            "version": "1.27.0",
            "modules": {}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/live"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/ready"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server, RequestPipeline::new()).await;

    assert_eq!(client.meta().await.unwrap().version, "1.27.0");
    assert!(client.is_live().await.unwrap());
    assert!(!client.is_ready().await.unwrap());
}

#[tokio::test]
async fn test_collection_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .and(body_partial_json(json!({"class": "Articles"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"class": "Articles"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/schema/Articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"class": "Articles"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/schema/Missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/schema/Articles"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, RequestPipeline::new()).await;

    let created = client.create_collection(json!({"class": "Articles"})).await.unwrap();
    assert_eq!(created["class"], "Articles");
    assert!(client.get_collection("Articles").await.unwrap().is_some());
    assert!(client.get_collection("Missing").await.unwrap().is_none());
    client.delete_collection("Articles").await.unwrap();
}

#[tokio::test]
async fn test_insert_carries_scope_and_headers() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/v1/objects"))
        .and(query_param("consistency_level", "ALL"))
        .and(header("X-Request-Source", "integration"))
        .and(body_partial_json(json!({
            "class": "Articles",
            "tenant": "tenant-a",
            "properties": {"title": "Pinning"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "class": "Articles",
            "id": id,
            "tenant": "tenant-a",
            "properties": {"title": "Pinning"},
            "creationTimeUnix": 1_700_000_000_000_i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = RequestPipeline::builder()
        .interceptor(HeaderInterceptor::new("X-Request-Source", "integration"))
        .build();
    let client = client_for(&server, pipeline)
        .await
        .with_tenant("tenant-a")
        .with_consistency_level(ConsistencyLevel::All);

    let object = client
        .insert_object(ObjectInsert::new("Articles", json!({"title": "Pinning"})))
        .await
        .unwrap();

    assert_eq!(object.id, Some(id));
    assert_eq!(object.tenant.as_deref(), Some("tenant-a"));
    assert_eq!(object.creation_time_unix, Some(1_700_000_000_000));
}

#[tokio::test]
async fn test_fetch_objects_pages() {
    let server = MockServer::start().await;
    let first = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/v1/objects"))
        .and(query_param("class", "Articles"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [{"class": "Articles", "id": first, "properties": {}}],
            "totalResults": 1
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, RequestPipeline::new()).await;
    let page = client
        .fetch_objects(FetchObjects { collection: "Articles".into(), limit: Some(1), after: None })
        .await
        .unwrap();

    assert_eq!(page.objects.len(), 1);
    assert_eq!(page.next_cursor(), Some(first));
}

#[tokio::test]
async fn test_server_errors_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/meta"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "anonymous access disabled"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/schema/Articles"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let timing = TimingInterceptor::new();
    let stats = timing.stats();
    let client = client_for(&server, RequestPipeline::builder().interceptor(timing).build()).await;

    let err = client.meta().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.message(), "anonymous access disabled");

    let err = client.delete_collection("Articles").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert_eq!(err.status(), Some(503));
    assert_eq!(client.rest_transport().stats().retries, 2);

    assert_eq!(stats.get("GetMeta").unwrap().errors, 1);
    assert_eq!(stats.get("CollectionDelete").unwrap().errors, 1);
}
