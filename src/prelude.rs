//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy importing:
//!
//! ```rust
//! use weaviate::prelude::*;
//! ```
//!
//! This provides access to:
//! - The client and its configuration
//! - Error types
//! - Logical requests and the request context
//! - The pipeline, interceptor capabilities and built-in interceptors
//! - Transport traits

pub use crate::{
    client::{Client, DataObject, Meta, ObjectList},
    config::{ClientConfig, RetryConfig, TimeoutConfig},
    error::{Error, ErrorKind, Result},
    interceptors::{HeaderInterceptor, LoggingInterceptor, TimingInterceptor},
    pipeline::{AfterReceive, BeforeSend, Interceptor, OnError, RequestPipeline, Response},
    request::{
        Category, CollectionCreate, ConsistencyLevel, FetchObjects, LogicalRequest, ObjectInsert,
        Operation, PreferredProtocol, RequestContext,
    },
    transport::{GrpcTransport, RestTransport, RestTransportExt},
};
