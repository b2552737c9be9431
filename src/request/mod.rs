//! Logical requests and the context that carries them.
//!
//! A *logical request* describes what the caller wants done, independent of
//! how it travels. Every request exposes a stable [operation
//! name](LogicalRequest::operation_name), a [`Category`] and a
//! [`PreferredProtocol`] hint.
//!
//! A [`RequestContext`] wraps one logical request for exactly one pipeline
//! execution, together with its cancellation token, timeout, metadata and
//! addressing (collection, tenant, consistency level).

mod context;
mod kinds;
mod operation;

pub use context::{ConsistencyLevel, ContextOverrides, HEADER_PREFIX, Metadata, RequestContext};
pub use kinds::{
    CollectionCreate, CollectionDelete, CollectionGet, CollectionUpdate, FetchObjects, GetMeta,
    Liveness, ObjectDelete, ObjectInsert, ObjectReplace, Readiness, Search, SearchKind,
};
pub use operation::{Category, LogicalRequest, Operation, PreferredProtocol};
