//! Concrete logical request kinds.
//!
//! Each kind carries the payload its operation needs and implements
//! [`LogicalRequest`] through its [`Operation`]. Serialization into wire
//! payloads is handled by the client facade, not here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{LogicalRequest, Operation};
use crate::Error;

macro_rules! fixed_operation {
    ($ty:ty => $op:ident) => {
        impl LogicalRequest for $ty {
            fn operation(&self) -> Option<Operation> {
                Some(Operation::$op)
            }
        }
    };
}

/// Reads server metadata (version, hostname, modules).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetMeta;
fixed_operation!(GetMeta => GetMeta);

/// Liveness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Liveness;
fixed_operation!(Liveness => Liveness);

/// Readiness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness;
fixed_operation!(Readiness => Readiness);

/// Inserts one object into a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInsert {
    /// Target collection.
    #[serde(rename = "class")]
    pub collection: String,
    /// Object ID; generated by the server when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Object properties.
    pub properties: Value,
    /// Custom vector, if the collection is not vectorized server-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}
fixed_operation!(ObjectInsert => ObjectInsert);

impl ObjectInsert {
    /// Creates an insert with server-assigned ID and no custom vector.
    pub fn new(collection: impl Into<String>, properties: Value) -> Self {
        Self { collection: collection.into(), id: None, properties, vector: None }
    }

    /// Sets an explicit object ID.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets a custom vector.
    #[must_use]
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }
}

/// Replaces an existing object wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReplace {
    /// Target collection.
    #[serde(rename = "class")]
    pub collection: String,
    /// Object ID.
    pub id: Uuid,
    /// New properties.
    pub properties: Value,
    /// New custom vector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}
fixed_operation!(ObjectReplace => ObjectReplace);

/// Deletes an object by ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDelete {
    /// Target collection.
    pub collection: String,
    /// Object ID.
    pub id: Uuid,
}
fixed_operation!(ObjectDelete => ObjectDelete);

/// Creates a collection from a full definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionCreate {
    /// Collection definition as accepted by `POST /v1/schema`.
    pub definition: Value,
}
fixed_operation!(CollectionCreate => CollectionCreate);

impl CollectionCreate {
    /// Wraps a definition, which must carry a non-empty `class` name.
    pub fn new(definition: Value) -> Result<Self, Error> {
        match definition.get("class").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => Ok(Self { definition }),
            _ => Err(Error::invalid_argument("collection definition requires a \"class\" name")),
        }
    }

    /// The collection name from the definition.
    pub fn name(&self) -> &str {
        self.definition.get("class").and_then(Value::as_str).unwrap_or_default()
    }
}

/// Reads one collection definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionGet {
    /// Collection name.
    pub name: String,
}
fixed_operation!(CollectionGet => CollectionGet);

/// Replaces the mutable parts of a collection definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionUpdate {
    /// Collection name.
    pub name: String,
    /// Updated definition.
    pub definition: Value,
}
fixed_operation!(CollectionUpdate => CollectionUpdate);

/// Deletes a collection and all of its objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDelete {
    /// Collection name.
    pub name: String,
}
fixed_operation!(CollectionDelete => CollectionDelete);

/// The kind of similarity or keyword search to run.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchKind {
    /// Vectorize the concepts server-side and search near them.
    NearText {
        /// Concepts to search for.
        concepts: Vec<String>,
    },
    /// Search near a caller-provided vector.
    NearVector {
        /// Query vector.
        vector: Vec<f32>,
    },
    /// Keyword search.
    Bm25 {
        /// Query string.
        query: String,
    },
    /// Weighted combination of keyword and vector search.
    Hybrid {
        /// Query string.
        query: String,
        /// 0.0 is pure keyword, 1.0 is pure vector.
        alpha: f32,
    },
}

/// A search against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    /// Collection to search.
    pub collection: String,
    /// What kind of search to run.
    pub kind: SearchKind,
    /// Maximum number of results.
    pub limit: Option<u32>,
}

impl LogicalRequest for Search {
    fn operation(&self) -> Option<Operation> {
        Some(match self.kind {
            SearchKind::NearText { .. } => Operation::SearchNearText,
            SearchKind::NearVector { .. } => Operation::SearchNearVector,
            SearchKind::Bm25 { .. } => Operation::Bm25Search,
            SearchKind::Hybrid { .. } => Operation::HybridSearch,
        })
    }
}

/// Pages through the objects of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchObjects {
    /// Collection to read.
    pub collection: String,
    /// Page size.
    pub limit: Option<u32>,
    /// Cursor: return objects after this ID.
    pub after: Option<Uuid>,
}
fixed_operation!(FetchObjects => FetchObjects);
