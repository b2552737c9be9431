//! Static header injection.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::pipeline::{BeforeSend, Interceptor};
use crate::request::{ContextOverrides, HEADER_PREFIX, RequestContext};

/// Adds fixed headers to every request.
///
/// Headers are written as `header:<name>` metadata, which the transports
/// forward as HTTP headers or gRPC metadata. A header already present in the
/// context is left alone unless [`overwrite`](Self::overwrite) is set.
///
/// ## Example
///
/// ```rust
/// use weaviate::interceptors::HeaderInterceptor;
/// use weaviate::pipeline::RequestPipeline;
///
/// let pipeline = RequestPipeline::builder()
///     .before_send(
///         HeaderInterceptor::new("X-Openai-Api-Key", "sk-...").with("X-Cluster", "eu-1"),
///     )
///     .build();
/// # let _ = pipeline;
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeaderInterceptor {
    headers: BTreeMap<String, String>,
    overwrite: bool,
}

impl HeaderInterceptor {
    /// Creates an interceptor adding one header.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().with(name, value)
    }

    /// Creates an interceptor from a header map.
    pub fn from_headers<K, V>(headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            overwrite: false,
        }
    }

    /// Adds another header.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace headers the context already carries.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[async_trait]
impl BeforeSend for HeaderInterceptor {
    async fn before_send(&self, ctx: RequestContext) -> Result<RequestContext> {
        if self.headers.is_empty() {
            return Ok(ctx);
        }

        let mut metadata = ctx.metadata().clone();
        for (name, value) in &self.headers {
            let key = format!("{}{}", HEADER_PREFIX, name);
            if self.overwrite || !metadata.contains_key(&key) {
                metadata.insert(key, value.clone());
            }
        }
        Ok(ctx.with(ContextOverrides { metadata: Some(metadata), ..Default::default() }))
    }
}

impl Interceptor for HeaderInterceptor {
    fn as_before_send(self: Arc<Self>) -> Option<Arc<dyn BeforeSend>> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{GetMeta, Metadata};

    #[tokio::test]
    async fn test_adds_headers() {
        let interceptor = HeaderInterceptor::new("X-A", "1").with("X-B", "2");
        let ctx = interceptor.before_send(RequestContext::new(GetMeta)).await.unwrap();

        let mut headers: Vec<_> = ctx.metadata().headers().collect();
        headers.sort();
        assert_eq!(headers, vec![("X-A", "1"), ("X-B", "2")]);
    }

    #[tokio::test]
    async fn test_existing_header_kept_unless_overwrite() {
        let ctx = RequestContext::new(GetMeta).with(ContextOverrides {
            metadata: Some(Metadata::new().with_header("X-A", "caller")),
            ..Default::default()
        });

        let kept = HeaderInterceptor::new("X-A", "static").before_send(ctx.clone()).await.unwrap();
        assert_eq!(kept.metadata().get("header:X-A"), Some("caller"));

        let replaced = HeaderInterceptor::from_headers([("X-A", "static")])
            .overwrite(true)
            .before_send(ctx)
            .await
            .unwrap();
        assert_eq!(replaced.metadata().get("header:X-A"), Some("static"));
    }
}
