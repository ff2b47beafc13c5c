use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    pub data: Value,
}

/// Body of `GET /v1/{collection}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentEntry>,
}
