//! Behavior of the in-memory transports as seen by test authors.

use serde_json::{Value, json};
use test_case::test_case;
use tokio_util::sync::CancellationToken;
use weaviate::request::{CollectionCreate, GetMeta, Operation, RequestContext};
use weaviate::testing::{MockGrpcTransport, MockRestTransport, WireRequest};
use weaviate::transport::{
    GrpcRequestDetails, GrpcTransport, HEALTH_CHECK_METHOD, HealthCheckRequest,
    HealthCheckResponse, HttpMethod, RestRequestDetails, RestTransport,
};
use weaviate::{Client, ErrorKind};

#[tokio::test]
async fn test_collection_create_round_trip() {
    let rest = MockRestTransport::new();
    rest.on_operation_json(Operation::CollectionCreate, 200, json!({"name": "Articles"}));
    let client = Client::new(rest.clone(), MockGrpcTransport::new());

    let created = client.create_collection(json!({"class": "Articles"})).await.unwrap();

    assert_eq!(created, json!({"name": "Articles"}));
    rest.assert_request()
        .for_operation("CollectionCreate")
        .with_method("post")
        .with_target_containing("/v1/schema")
        .was_sent();

    let captured = rest.last_request().unwrap();
    let body: Value = captured.details.body_json().unwrap();
    assert_eq!(body["class"], "Articles");
    assert_eq!(captured.operation_name(), Some("CollectionCreate"));
}

#[tokio::test]
async fn test_unstubbed_rest_is_empty_success() {
    let rest = MockRestTransport::new();
    let response =
        rest.send(RestRequestDetails::get("/v1/nodes"), &CancellationToken::new()).await.unwrap();

    assert_eq!(response.status, 200);
    assert!(response.is_empty());
}

#[tokio::test]
async fn test_unstubbed_grpc_is_unimplemented() {
    let grpc = MockGrpcTransport::new();
    let err = grpc
        .unary_call::<_, HealthCheckResponse>(
            GrpcRequestDetails::new(HEALTH_CHECK_METHOD),
            HealthCheckRequest::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unimplemented);
    assert_eq!(grpc.request_count(), 1);
}

#[test_case(0 ; "no requests")]
#[test_case(1 ; "one request")]
#[test_case(7 ; "several requests")]
#[tokio::test]
async fn test_captures_every_request_in_order(n: usize) {
    let rest = MockRestTransport::new();
    let token = CancellationToken::new();
    for i in 0..n {
        rest.send(RestRequestDetails::get(format!("/v1/objects/{}", i)), &token).await.unwrap();
    }

    let captured = rest.captured();
    assert_eq!(captured.len(), n);
    for (i, request) in captured.iter().enumerate() {
        assert_eq!(request.details.path, format!("/v1/objects/{}", i));
        assert_eq!(request.sequence, i as u64);
    }
    for pair in captured.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[tokio::test]
async fn test_cancelled_request_is_captured_then_fails() {
    let rest = MockRestTransport::new();
    rest.on_request(HttpMethod::Get, "/v1/meta", weaviate::transport::RestResponse::ok());
    let ctx = RequestContext::new(GetMeta);
    ctx.cancellation_token().cancel();

    let err = rest
        .send(RestRequestDetails::get("/v1/meta").with_context(&ctx), ctx.cancellation_token())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    rest.assert_request().for_operation(Operation::GetMeta).was_sent_times(1);
}

#[tokio::test]
async fn test_wire_request_description() {
    let rest = MockRestTransport::new();
    let ctx = RequestContext::new(CollectionCreate::new(json!({"class": "Articles"})).unwrap());
    rest.send(RestRequestDetails::post("/v1/schema").with_context(&ctx), &CancellationToken::new())
        .await
        .unwrap();

    let captured = rest.captured();
    let described = captured[0].details.describe();
    assert!(described.contains("POST"));
    assert!(described.contains("/v1/schema"));
}

#[tokio::test]
async fn test_reset_forgets_rules() {
    let rest = MockRestTransport::new();
    rest.on_operation_json(Operation::GetMeta, 500, json!({"error": "boom"}));
    rest.reset();

    let client = Client::new(rest.clone(), MockGrpcTransport::new());
    let meta = client.meta().await.unwrap();

    assert!(meta.version.is_empty());
    assert_eq!(rest.request_count(), 1);
}

#[tokio::test]
#[should_panic(expected = "CollectionCreate")]
async fn test_was_sent_panics_when_nothing_matches() {
    let rest = MockRestTransport::new();
    let client = Client::new(rest.clone(), MockGrpcTransport::new());
    client.meta().await.unwrap();

    rest.assert_request().for_operation(Operation::CollectionCreate).was_sent();
}

#[tokio::test]
#[should_panic(expected = "3")]
async fn test_was_sent_times_panics_on_wrong_count() {
    let rest = MockRestTransport::new();
    let client = Client::new(rest.clone(), MockGrpcTransport::new());
    client.meta().await.unwrap();
    client.meta().await.unwrap();

    rest.assert_request().for_operation(Operation::GetMeta).was_sent_times(3);
}

#[tokio::test]
#[should_panic]
async fn test_was_not_sent_panics_on_match() {
    let rest = MockRestTransport::new();
    let client = Client::new(rest.clone(), MockGrpcTransport::new());
    client.is_live().await.unwrap();

    rest.assert_request().for_operation(Operation::Liveness).was_not_sent();
}
