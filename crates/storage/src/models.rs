use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A case ready to be persisted. Structured parts are kept as JSON so the
/// storage crate stays independent of the domain types built on top of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCase {
    pub case_title: String,
    pub input: serde_json::Value,
    pub formal_letter: String,
    pub legal_arguments: String,
    pub supporting_sections: Vec<String>,
    pub relevant_documents: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRow {
    pub id: String,
    pub case_title: String,
    pub input: serde_json::Value,
    pub formal_letter: String,
    pub legal_arguments: String,
    pub supporting_sections: Vec<String>,
    pub relevant_documents: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
