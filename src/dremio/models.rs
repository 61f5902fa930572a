//! Dremio REST payloads
//!
//! Only the fields this crate reads are modelled; everything else in the
//! server responses is ignored by serde.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One row of a job result: field name -> value
pub type Record = Map<String, Value>;

/// A node in the Dremio catalog (space, folder, dataset, source, ...)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub path: Vec<String>,
    /// "space", "folder", "dataset", ... (absent on some container listings)
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<CatalogEntry>>,
    #[serde(default)]
    pub fields: Option<Vec<DatasetField>>,
}

impl CatalogEntry {
    /// Column names in catalog order
    pub fn field_names(&self) -> Option<Vec<String>> {
        self.fields
            .as_ref()
            .map(|fields| fields.iter().map(|f| f.name.clone()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetField {
    pub name: String,
}

/// `GET /api/v3/catalog`
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogListing {
    pub data: Vec<CatalogEntry>,
}

/// `POST /apiv2/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// `POST /api/v3/sql`
#[derive(Debug, Clone, Deserialize)]
pub struct SqlSubmission {
    #[serde(default)]
    pub id: Option<String>,
}

/// `GET /api/v3/job/{id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub job_state: Option<String>,
    /// Outer None: key absent. Inner None: key present with null.
    #[serde(default, deserialize_with = "present")]
    pub error_message: Option<Option<String>>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// `GET /api/v3/job/{id}/results`
#[derive(Debug, Clone, Deserialize)]
pub struct ResultPage {
    pub rows: Vec<Record>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
