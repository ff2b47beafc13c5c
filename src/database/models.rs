use chrono::{DateTime, Utc};

/// One stored JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: String,
    pub id: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

/// Condition a write is made under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    Upsert,
    /// Fails if the document exists
    CreateOnly,
    /// Fails if the document does not exist
    UpdateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Replaced,
    PreconditionFailed,
}
