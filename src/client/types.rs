//! Response types returned by the client facade.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Server metadata from `GET /v1/meta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Address the server reports for itself.
    #[serde(default)]
    pub hostname: String,
    /// Server version.
    pub version: String,
    /// Enabled modules and their metadata.
    #[serde(default)]
    pub modules: Value,
}

/// A stored object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataObject {
    /// Collection the object belongs to.
    #[serde(rename = "class")]
    pub collection: String,
    /// Object ID.
    pub id: Option<Uuid>,
    /// Object properties.
    #[serde(default)]
    pub properties: Value,
    /// Object vector, when returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Tenant, for multi-tenant collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Creation time in milliseconds since the epoch.
    pub creation_time_unix: Option<i64>,
    /// Last update time in milliseconds since the epoch.
    pub last_update_time_unix: Option<i64>,
}

/// A page of objects from `GET /v1/objects`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList {
    /// Objects on this page.
    pub objects: Vec<DataObject>,
    /// Total number of results the server reported.
    #[serde(default)]
    pub total_results: u64,
}

impl ObjectList {
    /// ID of the last object, to pass as the `after` cursor of the next page.
    pub fn next_cursor(&self) -> Option<Uuid> {
        self.objects.last().and_then(|o| o.id)
    }
}
