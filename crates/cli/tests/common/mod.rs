#![allow(dead_code)]

use lexdraft_core::config::AppConfig;
use lexdraft_core::models::CaseInput;
use lexdraft_core::rag::RagSystem;
use lexdraft_core::LetterService;
use providers::local::HashingEmbedder;
use providers::{Completion, CompletionRequest, LlmProvider, ProviderError, ProviderRegistry};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

pub const STATUTE: &str = "THE PAYMENT OF WAGES ACT\n\
Section 3. Responsibility for payment of wages\n\
Every employer shall be responsible for the payment of all wages to persons employed by him.\n\
Section 5. Time of payment of wages\n\
The wages of every person employed shall be paid before the expiry of the seventh day.\n\
\u{000C}Section 15. Claims arising out of deductions from wages\n\
Any person whose wages were withheld or delayed may apply to the authority for a direction.\n\
\u{000C}Section 354. Assault on woman\n\
Whoever assaults any woman intending to outrage her modesty shall be punished.\n";

/// Writes a letter when asked for one and an argument memo otherwise.
pub struct ScriptedLlm;

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let content = if request.prompt.contains("formal legal letter") {
            "STATEMENT OF FACTS:\nOur client was not paid.\n\n1. Pay the **withheld wages** within 15 days."
        } else {
            "KEY ARGUMENTS:\nThe delay breaches *Section 5*."
        };
        Ok(Completion {
            content: content.to_string(),
        })
    }
}

pub fn registry() -> ProviderRegistry {
    ProviderRegistry::new()
        .with_embedding("local", Arc::new(HashingEmbedder::new(256)))
        .set_preferred_embedding("local")
        .with_llm("scripted", Arc::new(ScriptedLlm))
        .set_preferred_llm("scripted")
}

pub fn config(dir: &TempDir) -> AppConfig {
    let docs = dir.path().join("documents");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("wages_act.txt"), STATUTE).unwrap();

    let mut cfg = AppConfig::default();
    cfg.database.path = dir.path().join("lexdraft.db").to_string_lossy().into_owned();
    cfg.documents.paths = vec![docs.to_string_lossy().into_owned()];
    cfg.vectors.path = dir.path().join("vector_store").to_string_lossy().into_owned();
    cfg.chunking.chunk_size = 200;
    cfg.chunking.chunk_overlap = 40;
    cfg.retrieval.top_k = 3;
    cfg.retrieval.supporting_sections = 2;
    cfg
}

pub async fn service(dir: &TempDir) -> LetterService {
    let cfg = config(dir);
    let pool = storage::connect(&cfg.database.path).await.unwrap();
    storage::migrate(&pool).await.unwrap();
    let top_k = cfg.retrieval.top_k;
    let (rag, _) = RagSystem::bootstrap(cfg, registry(), false).await.unwrap();
    LetterService::new(pool, Some(Arc::new(rag)), top_k)
}

pub fn case() -> CaseInput {
    serde_json::from_value(serde_json::json!({
        "case_title": "Withheld Wages - R. Mehta vs Northwind Traders",
        "incident_summary": "The employer withheld wages for two months and delayed payment.",
        "tags": ["Unpaid Salary"],
        "advocate_name": "Adv. K. Iyer",
        "client_name": "R. Mehta",
        "law_firm_name": "Iyer Legal",
        "law_firm_address": "7 Marine Drive",
        "law_firm_city": "Mumbai",
        "law_firm_state": "Maharashtra",
        "law_firm_zip": "400020",
        "law_firm_phone": "+91 22 4000 1234",
        "law_firm_email": "desk@iyer.legal",
        "recipient_name": "The Manager",
        "recipient_organization": "Northwind Traders",
        "recipient_address": "22 Harbour Road",
        "recipient_city": "Mumbai",
        "recipient_state": "Maharashtra",
        "recipient_zip": "400001"
    }))
    .unwrap()
}
