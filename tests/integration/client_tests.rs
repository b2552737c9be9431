//! The client facade over the in-memory transports, with the built-in
//! interceptors installed.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use weaviate::interceptors::{HeaderInterceptor, LoggingInterceptor, TimingInterceptor, on_error_fn};
use weaviate::pipeline::RequestPipeline;
use weaviate::request::{
    ConsistencyLevel, FetchObjects, ObjectInsert, Operation, Search, SearchKind,
};
use weaviate::testing::{MockGrpcTransport, MockRestTransport};
use weaviate::transport::{
    HEALTH_CHECK_METHOD, HealthCheckRequest, HealthCheckResponse, HttpMethod, RestResponse,
    ServingStatus,
};
use weaviate::{Client, ClientConfig, ErrorKind, TimeoutConfig};

use crate::common::{EventLog, init_tracing};

fn client_with(
    pipeline: RequestPipeline,
) -> (Client<MockRestTransport, MockGrpcTransport>, MockRestTransport, MockGrpcTransport) {
    let rest = MockRestTransport::new();
    let grpc = MockGrpcTransport::new();
    let client = Client::new(rest.clone(), grpc.clone()).with_pipeline(pipeline);
    (client, rest, grpc)
}

#[tokio::test]
async fn test_timing_counts_successes_and_failures() {
    init_tracing();
    let timing = Arc::new(TimingInterceptor::new());
    let stats = timing.stats();
    let pipeline = RequestPipeline::builder()
        .interceptor(LoggingInterceptor::new().with_metadata(true))
        .shared(timing)
        .build();
    let (client, rest, _) = client_with(pipeline);
    rest.on_operation_json(Operation::GetMeta, 200, json!({"version": "1.27.0"}))
        .fail_operation(Operation::ObjectInsert, ErrorKind::Connection, "connection reset");

    assert_eq!(client.meta().await.unwrap().version, "1.27.0");
    assert_eq!(client.meta().await.unwrap().version, "1.27.0");
    let err = client
        .insert_object(ObjectInsert::new("Articles", json!({"title": "Lifetimes"})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    let meta = stats.get("GetMeta").unwrap();
    assert_eq!(meta.count, 2);
    assert_eq!(meta.errors, 0);
    assert!(meta.max >= meta.average());
    assert_eq!(stats.get("ObjectInsert").unwrap().errors, 1);
    assert_eq!(stats.snapshot().len(), 2);
}

#[tokio::test]
async fn test_interceptor_headers_reach_the_wire() {
    let pipeline = RequestPipeline::builder()
        .interceptor(
            HeaderInterceptor::new("X-Request-Source", "integration").with("X-Team", "search"),
        )
        .build();
    let (client, rest, _) = client_with(pipeline);

    client.get_collection("Articles").await.unwrap();

    let captured = rest.last_request().unwrap();
    assert_eq!(captured.details.headers["X-Request-Source"], "integration");
    assert_eq!(captured.details.headers["X-Team"], "search");
    assert_eq!(captured.details.timeout, Some(ClientConfig::local().timeouts.request));
}

#[tokio::test]
async fn test_failures_reach_error_observers_once() {
    let log = EventLog::new();
    let observer = log.clone();
    let pipeline = RequestPipeline::builder()
        .on_error(on_error_fn(move |ctx, error| {
            observer.push(format!(
                "{}:{}:{}",
                ctx.operation_name(),
                ctx.tenant().unwrap_or("-"),
                error.status().unwrap_or_default()
            ));
            Ok(())
        }))
        .build();
    let (client, rest, _) = client_with(pipeline);
    rest.on_request(
        HttpMethod::Get,
        "/v1/objects",
        RestResponse::new(422).with_json(&json!({"error": [{"message": "tenant not found"}]})),
    );

    let err = client
        .with_tenant("tenant-b")
        .fetch_objects(FetchObjects { collection: "Articles".into(), limit: Some(5), after: None })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.message(), "tenant not found");
    assert_eq!(log.events(), vec!["FetchObjects:tenant-b:422"]);
    rest.assert_request()
        .for_operation(Operation::FetchObjects)
        .with_target_containing("tenant=tenant-b")
        .with_target_containing("limit=5")
        .was_sent_times(1);
}

#[tokio::test]
async fn test_scoped_clients_share_transports() {
    let (client, rest, _) = client_with(RequestPipeline::new());
    let quorum = client.with_consistency_level(ConsistencyLevel::Quorum);
    let id = Uuid::new_v4();

    quorum.delete_object("Articles", id).await.unwrap();
    client.delete_object("Articles", id).await.unwrap();

    let captured = rest.captured();
    assert_eq!(captured.len(), 2);
    assert_eq!(
        captured[0].details.path,
        format!("/v1/objects/Articles/{}?consistency_level=QUORUM", id)
    );
    assert_eq!(captured[1].details.path, format!("/v1/objects/Articles/{}", id));
}

#[tokio::test]
async fn test_configured_timeout_applies_to_requests() {
    let config = ClientConfig::builder()
        .timeouts(TimeoutConfig::builder().request(Duration::from_secs(3)).build())
        .build();
    let rest = MockRestTransport::new();
    let client = Client::new(rest.clone(), MockGrpcTransport::new()).with_config(config);

    client.is_ready().await.unwrap();

    assert_eq!(rest.last_request().unwrap().details.timeout, Some(Duration::from_secs(3)));
}

#[tokio::test]
async fn test_unary_runs_through_pipeline() {
    let log = EventLog::new();
    let before = log.clone();
    let pipeline = RequestPipeline::builder()
        .before_send(weaviate::interceptors::before_send_fn(move |ctx| {
            before.push(ctx.operation_name().to_string());
            Ok(ctx.with_metadata("header:X-Trace", "t-1"))
        }))
        .build();
    let (client, _, grpc) = client_with(pipeline);
    grpc.on_method(HEALTH_CHECK_METHOD, HealthCheckResponse::with_status(ServingStatus::Serving));

    let search = Search {
        collection: "Articles".into(),
        kind: SearchKind::Hybrid { query: "borrow checker".into(), alpha: 0.5 },
        limit: Some(10),
    };
    let response: HealthCheckResponse = client
        .unary(client.context(search), HEALTH_CHECK_METHOD, HealthCheckRequest::default())
        .await
        .unwrap();

    assert!(response.is_serving());
    assert_eq!(log.events(), vec!["HybridSearch"]);
    let captured = grpc.captured();
    assert_eq!(captured[0].details.details.headers["x-trace"], "t-1");
    grpc.assert_request().for_operation(Operation::HybridSearch).was_sent();
}

#[tokio::test]
async fn test_grpc_health_bypasses_pipeline() {
    let log = EventLog::new();
    let observer = log.clone();
    let pipeline = RequestPipeline::builder()
        .before_send(weaviate::interceptors::before_send_fn(move |ctx| {
            observer.push("before");
            Ok(ctx)
        }))
        .build();
    let (client, _, grpc) = client_with(pipeline);

    assert!(client.grpc_healthy().await);
    grpc.set_healthy(false);
    assert!(!client.grpc_healthy().await);

    assert_eq!(log.count("before"), 0);
    assert_eq!(grpc.request_count(), 0);
}
