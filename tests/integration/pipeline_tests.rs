//! Pipeline ordering and failure semantics through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use weaviate::interceptors::{after_receive_fn, before_send_fn, on_error_fn};
use weaviate::pipeline::{RequestPipeline, Response};
use weaviate::request::{ContextOverrides, GetMeta, ObjectInsert, RequestContext};
use weaviate::{Error, ErrorKind};

use crate::common::{EventLog, init_tracing};

fn add_logging(pipeline: &mut RequestPipeline, log: &EventLog, name: &'static str) {
    let before = log.clone();
    let after = log.clone();
    let error = log.clone();
    pipeline
        .add_before_send(before_send_fn(move |ctx| {
            before.push(format!("before:{}", name));
            Ok(ctx)
        }))
        .add_after_receive(after_receive_fn(move |_, response| {
            after.push(format!("after:{}", name));
            Ok(response)
        }))
        .add_on_error(on_error_fn(move |_, _| {
            error.push(format!("error:{}", name));
            Ok(())
        }));
}

#[tokio::test]
async fn test_forward_then_reverse_order() {
    init_tracing();
    let log = EventLog::new();
    let mut pipeline = RequestPipeline::new();
    for name in ["a", "b", "c"] {
        add_logging(&mut pipeline, &log, name);
    }

    let executor_log = log.clone();
    let result: String = pipeline
        .execute(RequestContext::new(GetMeta), |_| async move {
            executor_log.push("execute");
            Ok("ok".to_string())
        })
        .await
        .unwrap();

    assert_eq!(result, "ok");
    assert_eq!(
        log.events(),
        vec!["before:a", "before:b", "before:c", "execute", "after:c", "after:b", "after:a"]
    );
}

#[tokio::test]
async fn test_rejection_stops_everything_but_error_observers() {
    init_tracing();
    let log = EventLog::new();
    let mut pipeline = RequestPipeline::new();
    add_logging(&mut pipeline, &log, "a");
    let reject_log = log.clone();
    pipeline.add_before_send(before_send_fn(move |_| {
        reject_log.push("before:reject");
        Err(Error::invalid_argument("tenant is required"))
    }));
    add_logging(&mut pipeline, &log, "z");

    let executed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&executed);
    let err = pipeline
        .execute_unit(RequestContext::new(GetMeta), |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.message(), "tenant is required");
    assert_eq!(executed.load(Ordering::SeqCst), 0);
    assert_eq!(log.events(), vec!["before:a", "before:reject", "error:a", "error:z"]);
}

#[tokio::test]
async fn test_failing_observer_does_not_mask_root_cause() {
    init_tracing();
    let log = EventLog::new();
    let mut pipeline = RequestPipeline::new();
    let first = log.clone();
    let last = log.clone();
    pipeline
        .add_on_error(on_error_fn(move |_, _| {
            first.push("observer:1");
            Err(Error::internal("metrics sink offline"))
        }))
        .add_on_error(on_error_fn(move |_, error| {
            last.push(format!("observer:2:{}", error.kind()));
            Ok(())
        }));

    let err = pipeline
        .execute::<(), _, _>(RequestContext::new(GetMeta), |_| async {
            Err(Error::unavailable("node is shutting down").with_status(503))
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert_eq!(err.message(), "node is shutting down");
    assert_eq!(err.status(), Some(503));
    assert_eq!(log.events(), vec!["observer:1", "observer:2:service unavailable"]);
}

#[tokio::test]
async fn test_metadata_scenario() {
    init_tracing();
    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    let pipeline = RequestPipeline::builder()
        .before_send(before_send_fn(|ctx| Ok(ctx.with_metadata("X-Test", "1"))))
        .after_receive(after_receive_fn(move |_, response| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(response)
        }))
        .build();

    let seen = EventLog::new();
    let executor_seen = seen.clone();
    let result: &'static str = pipeline
        .execute(RequestContext::new(GetMeta), |ctx| async move {
            executor_seen.push(ctx.metadata().get("X-Test").unwrap_or("missing"));
            Ok("ok")
        })
        .await
        .unwrap();

    assert_eq!(result, "ok");
    assert_eq!(seen.events(), vec!["1"]);
    assert_eq!(received.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_after_receive_transforms_response() {
    let pipeline = RequestPipeline::builder()
        .after_receive(after_receive_fn(|_, response| {
            let text = response.downcast_ref::<String>().cloned().unwrap_or_default();
            Ok(Response::new(text.to_uppercase()))
        }))
        .build();

    let result: String = pipeline
        .execute(RequestContext::new(GetMeta), |_| async { Ok("weaviate".to_string()) })
        .await
        .unwrap();
    assert_eq!(result, "WEAVIATE");
}

#[tokio::test]
async fn test_response_type_swap_is_reported() {
    let log = EventLog::new();
    let observer = log.clone();
    let pipeline = RequestPipeline::builder()
        .after_receive(after_receive_fn(|_, _| Ok(Response::new(42_u64))))
        .on_error(on_error_fn(move |ctx, error| {
            observer.push(format!("{}:{}", ctx.operation_name(), error.kind()));
            Ok(())
        }))
        .build();

    let insert = ObjectInsert::new("Articles", serde_json::json!({"title": "Traits"}));
    let err = pipeline
        .execute(RequestContext::new(insert), |_| async { Ok("stored".to_string()) })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    assert_eq!(log.count("ObjectInsert:invalid response"), 1);
}

#[tokio::test]
async fn test_error_observers_see_original_context() {
    let log = EventLog::new();
    let observer = log.clone();
    let pipeline = RequestPipeline::builder()
        .before_send(before_send_fn(|ctx| Ok(ctx.with_tenant("rewritten"))))
        .on_error(on_error_fn(move |ctx, _| {
            observer.push(ctx.tenant().unwrap_or("none"));
            Ok(())
        }))
        .build();

    let ctx = RequestContext::new(GetMeta).with_tenant("original");
    let _ = pipeline
        .execute::<(), _, _>(ctx, |ctx| async move {
            Err(Error::not_found(format!("tenant {} not found", ctx.tenant().unwrap_or_default())))
        })
        .await;

    assert_eq!(log.events(), vec!["original"]);
}

#[test]
fn test_empty_overrides_round_trip() {
    let ctx = RequestContext::new(GetMeta)
        .with_tenant("t1")
        .with_collection("Articles")
        .with_metadata("k", "v");
    let copy = ctx.with(ContextOverrides::default());

    assert_eq!(copy.tenant(), Some("t1"));
    assert_eq!(copy.collection(), Some("Articles"));
    assert_eq!(copy.metadata(), ctx.metadata());
    assert_eq!(copy.timeout(), ctx.timeout());
    assert_eq!(copy.consistency_level(), ctx.consistency_level());
    assert!(Arc::ptr_eq(copy.request(), ctx.request()));

    ctx.cancellation_token().cancel();
    assert!(copy.is_cancelled());
}
