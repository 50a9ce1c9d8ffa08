//! The letter service: every operation the API and CLI expose.

use crate::config::AppConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::export;
use crate::letter::LetterGenerator;
use crate::models::{
    CaseInput, CaseList, CaseResponse, ExportBundle, GeneratedContent, GeneratedLetter,
    HealthStatus, RetrievedChunk, StoredCase,
};
use crate::pipeline::build_registry;
use crate::rag::RagSystem;
use anyhow::Context;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use storage::cases;
use storage::models::{CaseRow, NewCase};
use tracing::{error, info};

pub const BANNER: &str = "Legal Letter Generator API is running";

pub struct LetterService {
    pool: SqlitePool,
    rag: Option<Arc<RagSystem>>,
    generator: Option<LetterGenerator>,
    default_k: usize,
}

impl LetterService {
    pub fn new(pool: SqlitePool, rag: Option<Arc<RagSystem>>, default_k: usize) -> Self {
        let generator = rag.clone().map(LetterGenerator::new);
        Self {
            pool,
            rag,
            generator,
            default_k,
        }
    }

    /// Opens the case store only. Enough for listing, lookup, export and
    /// deletion.
    pub async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = storage::connect(&config.database.path)
            .await
            .context("db connect")?;
        storage::migrate(&pool).await.context("db migrate")?;
        Ok(Self::new(pool, None, config.retrieval.top_k))
    }

    /// Opens the case store and brings up retrieval. A retrieval failure is
    /// logged and leaves the service running without it.
    pub async fn start(config: AppConfig) -> anyhow::Result<Self> {
        let mut service = Self::open(&config).await?;
        info!("Initializing RAG system...");
        let registry = build_registry(&config);
        match RagSystem::bootstrap(config, registry, false).await {
            Ok((rag, _)) => {
                let rag = Arc::new(rag);
                service.generator = Some(LetterGenerator::new(rag.clone()));
                service.rag = Some(rag);
                info!("Letter generator initialized successfully");
            }
            Err(e) => error!("Error initializing RAG system: {e:#}"),
        }
        Ok(service)
    }

    pub fn banner(&self) -> &'static str {
        BANNER
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            rag_system_ready: self.rag.as_ref().is_some_and(|r| r.is_indexed()),
            letter_generator_ready: self.generator.is_some(),
        }
    }

    pub async fn generate_letter(&self, case: CaseInput) -> ServiceResult<CaseResponse> {
        let generator = self.generator.as_ref().ok_or(ServiceError::NotReady)?;
        let missing = case.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let content = generator.generate(&case).await.map_err(|e| {
            error!("Error generating letter: {e:#}");
            ServiceError::Internal(e)
        })?;
        let created_at = Utc::now();
        let new_case = NewCase {
            case_title: case.case_title.clone(),
            input: serde_json::to_value(&case).context("encode case input")?,
            formal_letter: content.formal_letter.clone(),
            legal_arguments: content.legal_arguments.clone(),
            supporting_sections: content.supporting_sections.clone(),
            relevant_documents: serde_json::to_value(&content.relevant_documents)
                .context("encode relevant documents")?,
            created_at,
        };
        let case_id = cases::insert_case(&self.pool, &new_case).await?;
        info!(case_id = %case_id, "case saved");

        Ok(CaseResponse {
            success: true,
            message: "Letter generated successfully".to_string(),
            case_id: Some(case_id.clone()),
            letter: Some(GeneratedLetter {
                case_id,
                case_title: case.case_title,
                formal_letter: content.formal_letter,
                legal_arguments: content.legal_arguments,
                supporting_sections: content.supporting_sections,
                created_at,
            }),
        })
    }

    pub async fn get_case(&self, case_id: &str) -> ServiceResult<StoredCase> {
        let row = cases::get_case(&self.pool, case_id)
            .await?
            .ok_or_else(ServiceError::case_not_found)?;
        Ok(stored_case(row)?)
    }

    pub async fn list_cases(&self) -> ServiceResult<CaseList> {
        let rows = cases::list_cases(&self.pool).await?;
        let cases = rows
            .into_iter()
            .map(stored_case)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(CaseList { cases })
    }

    pub async fn export_case(&self, case_id: &str) -> ServiceResult<ExportBundle> {
        let stored = self.get_case(case_id).await?;
        let today = Utc::now().date_naive();
        Ok(ExportBundle {
            success: true,
            formal_content: export::render_letter(&stored.input, &stored.content, today),
            arguments: export::render_arguments(&stored.input, &stored.content, today),
            case_title: stored.input.case_title,
        })
    }

    pub async fn search(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> ServiceResult<Vec<RetrievedChunk>> {
        let rag = self.rag.as_ref().ok_or(ServiceError::NotReady)?;
        if query.trim().is_empty() {
            return Err(ServiceError::InvalidInput("query must not be empty".into()));
        }
        Ok(rag
            .similarity_search(query, k.unwrap_or(self.default_k))
            .await?)
    }

    pub async fn delete_case(&self, case_id: &str) -> ServiceResult<()> {
        if cases::delete_case(&self.pool, case_id).await? {
            info!(case_id = %case_id, "case deleted");
            Ok(())
        } else {
            Err(ServiceError::case_not_found())
        }
    }
}

fn stored_case(row: CaseRow) -> anyhow::Result<StoredCase> {
    let input: CaseInput =
        serde_json::from_value(row.input).with_context(|| format!("decode case {}", row.id))?;
    let relevant_documents = serde_json::from_value(row.relevant_documents)
        .with_context(|| format!("decode documents of case {}", row.id))?;
    Ok(StoredCase {
        id: row.id,
        input,
        content: GeneratedContent {
            formal_letter: row.formal_letter,
            legal_arguments: row.legal_arguments,
            supporting_sections: row.supporting_sections,
            relevant_documents,
        },
        created_at: row.created_at,
    })
}
