use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of text from a source document. Page numbers start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub text: String,
    pub source: String,
}

/// A titled span of a legal document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    pub page_number: u32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub section_title: String,
    pub page_number: u32,
    pub chunk_id: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    #[serde(rename = "similarity_score")]
    pub score: f32,
}

impl RetrievedChunk {
    pub fn citation(&self) -> String {
        format!(
            "{} (Page {})",
            self.chunk.section_title, self.chunk.page_number
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseInput {
    pub case_title: String,
    pub incident_summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub advocate_name: String,
    pub client_name: String,

    pub law_firm_name: String,
    pub law_firm_address: String,
    pub law_firm_city: String,
    pub law_firm_state: String,
    pub law_firm_zip: String,
    pub law_firm_phone: String,
    pub law_firm_email: String,
    #[serde(default)]
    pub bar_registration_number: String,

    pub recipient_name: String,
    pub recipient_organization: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub recipient_state: String,
    pub recipient_zip: String,
}

impl CaseInput {
    /// Names of required fields left blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required = [
            ("case_title", &self.case_title),
            ("incident_summary", &self.incident_summary),
            ("advocate_name", &self.advocate_name),
            ("client_name", &self.client_name),
            ("law_firm_name", &self.law_firm_name),
            ("law_firm_address", &self.law_firm_address),
            ("law_firm_city", &self.law_firm_city),
            ("law_firm_state", &self.law_firm_state),
            ("law_firm_zip", &self.law_firm_zip),
            ("law_firm_phone", &self.law_firm_phone),
            ("law_firm_email", &self.law_firm_email),
            ("recipient_name", &self.recipient_name),
            ("recipient_organization", &self.recipient_organization),
            ("recipient_address", &self.recipient_address),
            ("recipient_city", &self.recipient_city),
            ("recipient_state", &self.recipient_state),
            ("recipient_zip", &self.recipient_zip),
        ];
        required
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub formal_letter: String,
    pub legal_arguments: String,
    pub supporting_sections: Vec<String>,
    pub relevant_documents: Vec<RetrievedChunk>,
}

/// A persisted case as returned by lookups: the submitted input and the
/// generated content side by side, under the document id `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCase {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub input: CaseInput,
    #[serde(flatten)]
    pub content: GeneratedContent,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLetter {
    pub case_id: String,
    pub case_title: String,
    pub formal_letter: String,
    pub legal_arguments: String,
    pub supporting_sections: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResponse {
    pub success: bool,
    pub message: String,
    pub case_id: Option<String>,
    pub letter: Option<GeneratedLetter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseList {
    pub cases: Vec<StoredCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub rag_system_ready: bool,
    pub letter_generator_ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub success: bool,
    pub case_title: String,
    pub formal_content: String,
    pub arguments: String,
}

#[cfg(test)]
pub(crate) fn sample_case() -> CaseInput {
    CaseInput {
        case_title: "Unpaid Salary - Jane Roe vs Acme Logistics".into(),
        incident_summary: "Salary for March and April was withheld without notice.".into(),
        tags: vec!["Unpaid Salary".into(), "Retaliation".into()],
        advocate_name: "Adv. Priya Sharma".into(),
        client_name: "Jane Roe".into(),
        law_firm_name: "Sharma & Associates".into(),
        law_firm_address: "12 Court Road".into(),
        law_firm_city: "Mumbai".into(),
        law_firm_state: "Maharashtra".into(),
        law_firm_zip: "400001".into(),
        law_firm_phone: "+91 22 5555 0101".into(),
        law_firm_email: "office@sharma.law".into(),
        bar_registration_number: "MAH/1234/2010".into(),
        recipient_name: "HR Director".into(),
        recipient_organization: "Acme Logistics Pvt Ltd".into(),
        recipient_address: "4 Dock Street".into(),
        recipient_city: "Pune".into(),
        recipient_state: "Maharashtra".into(),
        recipient_zip: "411001".into(),
    }
}
