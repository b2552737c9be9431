//! The client facade.
//!
//! [`Client`] turns method calls into logical requests, runs each one through
//! its [`RequestPipeline`] exactly once, and delegates the wire work to a
//! [`RestTransport`] and a [`GrpcTransport`]:
//!
//! - Server: [`meta()`](Client::meta), [`is_live()`](Client::is_live),
//!   [`is_ready()`](Client::is_ready), [`grpc_healthy()`](Client::grpc_healthy)
//! - Collections: [`create_collection()`](Client::create_collection),
//!   [`get_collection()`](Client::get_collection),
//!   [`update_collection()`](Client::update_collection),
//!   [`delete_collection()`](Client::delete_collection)
//! - Objects: [`insert_object()`](Client::insert_object),
//!   [`replace_object()`](Client::replace_object),
//!   [`delete_object()`](Client::delete_object),
//!   [`fetch_objects()`](Client::fetch_objects)
//! - Anything else: [`send_rest()`](Client::send_rest) and
//!   [`unary()`](Client::unary)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use weaviate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pipeline = RequestPipeline::builder().interceptor(LoggingInterceptor::new()).build();
//!     let client = Client::connect(ClientConfig::from_env())?.with_pipeline(pipeline);
//!
//!     client.create_collection(json!({"class": "Articles"})).await?;
//!     let object = client
//!         .insert_object(ObjectInsert::new("Articles", json!({"title": "Ownership"})))
//!         .await?;
//!     println!("stored {:?}", object.id);
//!     Ok(())
//! }
//! ```

mod types;

pub use types::{DataObject, Meta, ObjectList};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::pipeline::RequestPipeline;
use crate::request::{
    CollectionCreate, CollectionDelete, CollectionGet, CollectionUpdate, ConsistencyLevel,
    FetchObjects, GetMeta, Liveness, LogicalRequest, ObjectDelete, ObjectInsert, ObjectReplace,
    Readiness, RequestContext,
};
use crate::transport::{
    GrpcRequestDetails, GrpcTransport, RestRequestDetails, RestTransport, RestTransportExt,
};
use crate::{Error, Result};

/// Client for one Weaviate deployment.
///
/// Generic over its transports so tests can plug in the in-memory doubles
/// from [`testing`](crate::testing). Scoped copies made with
/// [`with_tenant`](Self::with_tenant) or
/// [`with_consistency_level`](Self::with_consistency_level) share the
/// transports.
///
/// ## Example
///
/// ```rust
/// use weaviate::Client;
/// use weaviate::request::ConsistencyLevel;
/// use weaviate::testing::{MockGrpcTransport, MockRestTransport};
///
/// let client = Client::new(MockRestTransport::new(), MockGrpcTransport::new());
/// let scoped = client.with_tenant("tenant-a").with_consistency_level(ConsistencyLevel::Quorum);
///
/// assert_eq!(scoped.tenant(), Some("tenant-a"));
/// assert_eq!(client.tenant(), None);
/// ```
pub struct Client<R, G> {
    rest: Arc<R>,
    grpc: Arc<G>,
    pipeline: Arc<RequestPipeline>,
    config: Arc<ClientConfig>,
    tenant: Option<String>,
    consistency_level: Option<ConsistencyLevel>,
}

impl<R, G> Clone for Client<R, G> {
    fn clone(&self) -> Self {
        Self {
            rest: Arc::clone(&self.rest),
            grpc: Arc::clone(&self.grpc),
            pipeline: Arc::clone(&self.pipeline),
            config: Arc::clone(&self.config),
            tenant: self.tenant.clone(),
            consistency_level: self.consistency_level,
        }
    }
}

impl<R, G> std::fmt::Debug for Client<R, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("rest_endpoint", &self.config.rest_endpoint)
            .field("grpc_endpoint", &self.config.grpc_endpoint)
            .field("pipeline", &self.pipeline)
            .field("tenant", &self.tenant)
            .field("consistency_level", &self.consistency_level)
            .finish_non_exhaustive()
    }
}

#[cfg(all(feature = "rest", feature = "grpc"))]
impl Client<crate::transport::HttpTransport, crate::transport::TonicTransport> {
    /// Creates a client with the HTTP and tonic transports described by
    /// `config` and an empty pipeline.
    ///
    /// The gRPC channel connects lazily, but must be created inside a tokio
    /// runtime.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let rest = crate::transport::HttpTransport::from_config(&config)?;
        let grpc = crate::transport::TonicTransport::from_config(&config)?;
        tracing::debug!(
            rest = %config.rest_endpoint,
            grpc = %config.grpc_endpoint,
            "client created"
        );
        Ok(Self::new(rest, grpc).with_config(config))
    }
}

impl<R: RestTransport, G: GrpcTransport> Client<R, G> {
    /// Creates a client over the given transports with an empty pipeline
    /// and the local default configuration.
    pub fn new(rest: R, grpc: G) -> Self {
        Self {
            rest: Arc::new(rest),
            grpc: Arc::new(grpc),
            pipeline: Arc::new(RequestPipeline::new()),
            config: Arc::new(ClientConfig::default()),
            tenant: None,
            consistency_level: None,
        }
    }

    /// Replaces the pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: RequestPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    /// Replaces the configuration. Its request timeout becomes the default
    /// timeout of every context the client creates.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// A copy scoped to `tenant`.
    #[must_use]
    pub fn with_tenant(&self, tenant: impl Into<String>) -> Self {
        Self { tenant: Some(tenant.into()), ..self.clone() }
    }

    /// A copy that reads and writes with `level`.
    #[must_use]
    pub fn with_consistency_level(&self, level: ConsistencyLevel) -> Self {
        Self { consistency_level: Some(level), ..self.clone() }
    }

    /// The pipeline.
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// The configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The tenant this client is scoped to.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    /// The consistency level this client uses.
    pub fn consistency_level(&self) -> Option<ConsistencyLevel> {
        self.consistency_level
    }

    /// The REST transport.
    pub fn rest_transport(&self) -> &R {
        &self.rest
    }

    /// The gRPC transport.
    pub fn grpc_transport(&self) -> &G {
        &self.grpc
    }

    /// Creates the context the client would use for `request`: the
    /// configured request timeout plus the client's tenant and consistency
    /// level.
    pub fn context(&self, request: impl LogicalRequest) -> RequestContext {
        self.context_for(Arc::new(request))
    }

    fn context_for(&self, request: Arc<dyn LogicalRequest>) -> RequestContext {
        let mut ctx = RequestContext::from_arc(request).with_timeout(self.config.timeouts.request);
        if let Some(ref tenant) = self.tenant {
            ctx = ctx.with_tenant(tenant.clone());
        }
        if let Some(level) = self.consistency_level {
            ctx = ctx.with_consistency_level(level);
        }
        ctx
    }

    // ------------------------------------------------------------------------
    // Generic entry points
    // ------------------------------------------------------------------------

    /// Runs `ctx` through the pipeline, sending `details` over REST and
    /// decoding the JSON response.
    ///
    /// The final context's timeout and `header:` metadata are applied to the
    /// details. Non-success statuses fail with the status-derived kind; an
    /// empty body decodes to `T::default()`.
    pub async fn send_rest<T>(&self, ctx: RequestContext, details: RestRequestDetails) -> Result<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        let rest = &self.rest;
        self.pipeline
            .execute(ctx, move |ctx| async move {
                rest.send_json(details.with_context(&ctx), ctx.cancellation_token()).await
            })
            .await
    }

    /// Runs `ctx` through the pipeline, making a unary gRPC call to `method`.
    pub async fn unary<Req, Resp>(
        &self,
        ctx: RequestContext,
        method: impl Into<String>,
        message: Req,
    ) -> Result<Resp>
    where
        Req: prost::Message + Clone + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let grpc = &self.grpc;
        let details = GrpcRequestDetails::new(method);
        self.pipeline
            .execute(ctx, move |ctx| async move {
                grpc.unary_call(details.with_context(&ctx), message, ctx.cancellation_token()).await
            })
            .await
    }

    /// Runs `ctx` through the pipeline with details built from the final
    /// context.
    async fn rest_call<T, B>(&self, ctx: RequestContext, build: B) -> Result<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
        B: FnOnce(&RequestContext) -> Result<RestRequestDetails> + Send,
    {
        let rest = &self.rest;
        self.pipeline
            .execute(ctx, move |ctx| async move {
                let details = build(&ctx)?.with_context(&ctx);
                rest.send_json(details, ctx.cancellation_token()).await
            })
            .await
    }

    /// Like [`rest_call`](Self::rest_call), but hands back the raw response
    /// to `finish` instead of decoding it.
    async fn rest_raw<T, B, F>(&self, ctx: RequestContext, build: B, finish: F) -> Result<T>
    where
        T: Send + 'static,
        B: FnOnce(&RequestContext) -> Result<RestRequestDetails> + Send,
        F: FnOnce(crate::transport::RestResponse) -> Result<T> + Send,
    {
        let rest = &self.rest;
        self.pipeline
            .execute(ctx, move |ctx| async move {
                let details = build(&ctx)?.with_context(&ctx);
                finish(rest.send(details, ctx.cancellation_token()).await?)
            })
            .await
    }

    // ------------------------------------------------------------------------
    // Server
    // ------------------------------------------------------------------------

    /// Reads server metadata.
    pub async fn meta(&self) -> Result<Meta> {
        self.rest_call(self.context(GetMeta), |_| Ok(RestRequestDetails::get("/v1/meta"))).await
    }

    /// Returns `true` if the server answers its liveness check with a 2xx.
    pub async fn is_live(&self) -> Result<bool> {
        self.rest_raw(
            self.context(Liveness),
            |_| Ok(RestRequestDetails::get("/v1/.well-known/live")),
            |response| Ok(response.is_success()),
        )
        .await
    }

    /// Returns `true` if the server answers its readiness check with a 2xx.
    pub async fn is_ready(&self) -> Result<bool> {
        self.rest_raw(
            self.context(Readiness),
            |_| Ok(RestRequestDetails::get("/v1/.well-known/ready")),
            |response| Ok(response.is_success()),
        )
        .await
    }

    /// Probes the gRPC endpoint. Not routed through the pipeline.
    pub async fn grpc_healthy(&self) -> bool {
        self.grpc.is_healthy(&tokio_util::sync::CancellationToken::new()).await
    }

    // ------------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------------

    /// Creates a collection from a definition carrying a `class` name and
    /// returns the definition the server stored.
    pub async fn create_collection(&self, definition: Value) -> Result<Value> {
        let request = Arc::new(CollectionCreate::new(definition)?);
        let body = request.definition.clone();
        self.rest_call(self.context_for(request), move |_| {
            RestRequestDetails::post("/v1/schema").json(&body)
        })
        .await
    }

    /// Reads a collection definition, or `None` if it does not exist.
    pub async fn get_collection(&self, name: &str) -> Result<Option<Value>> {
        let path = format!("/v1/schema/{}", encode(name)?);
        self.rest_raw(
            self.context(CollectionGet { name: name.to_string() }),
            move |_| Ok(RestRequestDetails::get(path)),
            |response| {
                if response.status == 404 {
                    return Ok(None);
                }
                response.json::<Option<Value>>()
            },
        )
        .await
    }

    /// Updates a collection definition.
    pub async fn update_collection(&self, name: &str, definition: Value) -> Result<Value> {
        let path = format!("/v1/schema/{}", encode(name)?);
        let body = definition.clone();
        self.rest_call(
            self.context(CollectionUpdate { name: name.to_string(), definition }),
            move |_| RestRequestDetails::put(path).json(&body),
        )
        .await
    }

    /// Deletes a collection and all of its objects.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        let path = format!("/v1/schema/{}", encode(name)?);
        self.rest_call::<Value, _>(
            self.context(CollectionDelete { name: name.to_string() }),
            move |_| Ok(RestRequestDetails::delete(path)),
        )
        .await
        .map(drop)
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    /// Inserts an object and returns it as stored.
    pub async fn insert_object(&self, insert: ObjectInsert) -> Result<DataObject> {
        let body = serde_json::to_value(&insert)?;
        self.rest_call(self.context(insert), move |ctx| {
            let details = RestRequestDetails::post("/v1/objects").json(&with_tenant(body, ctx))?;
            Ok(with_consistency(details, ctx))
        })
        .await
    }

    /// Replaces an object and returns it as stored.
    pub async fn replace_object(&self, replace: ObjectReplace) -> Result<DataObject> {
        let path = format!("/v1/objects/{}/{}", encode(&replace.collection)?, replace.id);
        let body = serde_json::to_value(&replace)?;
        self.rest_call(self.context(replace), move |ctx| {
            let details = RestRequestDetails::put(path).json(&with_tenant(body, ctx))?;
            Ok(with_consistency(details, ctx))
        })
        .await
    }

    /// Deletes an object.
    pub async fn delete_object(&self, collection: &str, id: Uuid) -> Result<()> {
        let path = format!("/v1/objects/{}/{}", encode(collection)?, id);
        self.rest_call::<Value, _>(
            self.context(ObjectDelete { collection: collection.to_string(), id }),
            move |ctx| {
                Ok(with_consistency(tenant_query(RestRequestDetails::delete(path), ctx), ctx))
            },
        )
        .await
        .map(drop)
    }

    /// Reads one page of objects. Pass [`ObjectList::next_cursor`] as
    /// `after` to read the next page.
    pub async fn fetch_objects(&self, fetch: FetchObjects) -> Result<ObjectList> {
        let mut details = RestRequestDetails::get("/v1/objects").query("class", &fetch.collection);
        if let Some(limit) = fetch.limit {
            details = details.query("limit", &limit.to_string());
        }
        if let Some(after) = fetch.after {
            details = details.query("after", &after.to_string());
        }
        self.rest_call(self.context(fetch), move |ctx| {
            Ok(with_consistency(tenant_query(details, ctx), ctx))
        })
        .await
    }
}

/// Percent-encodes a path segment, rejecting empty names.
fn encode(segment: &str) -> Result<String> {
    if segment.is_empty() {
        return Err(Error::invalid_argument("collection name cannot be empty"));
    }
    Ok(urlencoding::encode(segment).into_owned())
}

fn with_tenant(mut body: Value, ctx: &RequestContext) -> Value {
    if let (Some(tenant), Some(object)) = (ctx.tenant(), body.as_object_mut()) {
        object.insert("tenant".to_string(), Value::String(tenant.to_string()));
    }
    body
}

fn tenant_query(details: RestRequestDetails, ctx: &RequestContext) -> RestRequestDetails {
    match ctx.tenant() {
        Some(tenant) => details.query("tenant", tenant),
        None => details,
    }
}

fn with_consistency(details: RestRequestDetails, ctx: &RequestContext) -> RestRequestDetails {
    match ctx.consistency_level() {
        Some(level) => details.query("consistency_level", level.as_str()),
        None => details,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;
    use crate::interceptors::HeaderInterceptor;
    use crate::request::Operation;
    use crate::testing::{MockGrpcTransport, MockRestTransport, WireRequest};
    use crate::transport::{HttpMethod, RestResponse};

    fn client() -> (Client<MockRestTransport, MockGrpcTransport>, MockRestTransport) {
        let rest = MockRestTransport::new();
        (Client::new(rest.clone(), MockGrpcTransport::new()), rest)
    }

    #[tokio::test]
    async fn test_meta() {
        let (client, rest) = client();
        rest.on_operation_json(
            Operation::GetMeta,
            200,
            json!({"Version": "1.27.0", "Hostname": "node-1"}),
        );

        let meta = client.meta().await.unwrap();
        assert_eq!(meta.version, "1.27.0");
        assert_eq!(meta.hostname, "node-1");
        rest.assert_request()
            .for_operation("GetMeta")
            .with_target_containing("/v1/meta")
            .was_sent();
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (client, rest) = client();
        rest.on_operation(Operation::Readiness, RestResponse::new(503));

        assert!(client.is_live().await.unwrap());
        assert!(!client.is_ready().await.unwrap());
        assert!(client.grpc_healthy().await);
    }

    #[tokio::test]
    async fn test_get_collection_not_found_is_none() {
        let (client, rest) = client();
        rest.on_operation(Operation::CollectionGet, RestResponse::new(404));

        assert_eq!(client.get_collection("Missing").await.unwrap(), None);
        rest.assert_request().with_target_containing("/v1/schema/Missing").was_sent_times(1);
    }

    #[tokio::test]
    async fn test_create_collection_rejects_nameless_definition() {
        let (client, rest) = client();
        let err = client.create_collection(json!({"properties": []})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(rest.request_count(), 0);
    }

    #[tokio::test]
    async fn test_insert_applies_scope() {
        let (client, rest) = client();
        let id = Uuid::new_v4();
        rest.on_request(
            HttpMethod::Post,
            "/v1/objects",
            RestResponse::ok().with_json(&json!({"class": "Articles", "id": id, "tenant": "t1"})),
        );

        let scoped = client.with_tenant("t1").with_consistency_level(ConsistencyLevel::All);
        let stored = scoped
            .insert_object(ObjectInsert::new("Articles", json!({"title": "Borrowing"})))
            .await
            .unwrap();
        assert_eq!(stored.id, Some(id));

        let sent = rest.last_request().unwrap().details;
        assert_eq!(sent.path, "/v1/objects?consistency_level=ALL");
        let body: Value = sent.body_json().unwrap();
        assert_eq!(body["tenant"], "t1");
        assert_eq!(body["class"], "Articles");
        assert_eq!(sent.timeout, Some(client.config().timeouts.request));
    }

    #[tokio::test]
    async fn test_delete_object_query() {
        let (client, rest) = client();
        let id = Uuid::nil();
        client.with_tenant("t 1").delete_object("Articles", id).await.unwrap();

        rest.assert_request()
            .for_operation("ObjectDelete")
            .with_method("DELETE")
            .with_target_containing(&format!("/v1/objects/Articles/{}?tenant=t%201", id))
            .was_sent();
    }

    #[tokio::test]
    async fn test_fetch_objects_query() {
        let (client, rest) = client();
        rest.on_operation_json(
            Operation::FetchObjects,
            200,
            json!({"objects": [], "totalResults": 0}),
        );

        let after = Uuid::new_v4();
        let page = client
            .fetch_objects(FetchObjects {
                collection: "Articles".into(),
                limit: Some(10),
                after: Some(after),
            })
            .await
            .unwrap();
        assert!(page.objects.is_empty());

        let sent = rest.last_request().unwrap().details;
        assert_eq!(sent.path, format!("/v1/objects?class=Articles&limit=10&after={}", after));
    }

    #[tokio::test]
    async fn test_pipeline_headers_reach_transport() {
        let (client, rest) = client();
        let pipeline = RequestPipeline::builder()
            .before_send(HeaderInterceptor::new("X-Request-Source", "tests"))
            .build();
        let client = client.with_pipeline(pipeline);

        client.delete_collection("Articles").await.unwrap();
        let sent = rest.last_request().unwrap().details;
        assert_eq!(sent.headers["X-Request-Source"], "tests");
    }

    #[tokio::test]
    async fn test_error_status_surfaces_kind() {
        let (client, rest) = client();
        rest.on_operation_json(
            Operation::CollectionUpdate,
            422,
            json!({"error": [{"message": "vectorizer cannot change"}]}),
        );

        let err =
            client.update_collection("Articles", json!({"class": "Articles"})).await.unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.message(), "vectorizer cannot change");
    }

    #[tokio::test]
    async fn test_unary_through_pipeline() {
        use crate::transport::{
            HEALTH_CHECK_METHOD, HealthCheckRequest, HealthCheckResponse, ServingStatus,
        };

        let grpc = MockGrpcTransport::new();
        grpc.on_method(
            HEALTH_CHECK_METHOD,
            HealthCheckResponse::with_status(ServingStatus::Serving),
        );
        let client = Client::new(MockRestTransport::new(), grpc.clone());

        let ctx = client.context(Readiness).with_metadata("header:x-check", "1");
        let response: HealthCheckResponse =
            client.unary(ctx, HEALTH_CHECK_METHOD, HealthCheckRequest::default()).await.unwrap();
        assert!(response.is_serving());

        let call = &grpc.captured()[0].details;
        assert_eq!(call.details.headers["x-check"], "1");
        assert_eq!(call.operation_name(), Some("Readiness"));
    }
}
