use crate::models::{CaseInput, GeneratedContent};
use crate::prompt;
use crate::rag::RagSystem;
use std::sync::Arc;
use tracing::{debug, info};

/// Drafts the demand letter and the supporting argument memo for a case.
#[derive(Clone)]
pub struct LetterGenerator {
    rag: Arc<RagSystem>,
}

impl LetterGenerator {
    pub fn new(rag: Arc<RagSystem>) -> Self {
        Self { rag }
    }

    pub async fn generate(&self, case: &CaseInput) -> anyhow::Result<GeneratedContent> {
        let retrieval = &self.rag.config().retrieval;
        let query = prompt::search_query(case);
        let relevant = self.rag.similarity_search(&query, retrieval.top_k).await?;
        debug!(hits = relevant.len(), "retrieved provisions for case");

        let context = prompt::format_context(&relevant, retrieval.context_chars);
        let letter_prompt = prompt::letter_prompt(case, &context);
        let arguments_prompt = prompt::arguments_prompt(case, &context);
        let (formal_letter, legal_arguments) = tokio::try_join!(
            self.rag.generate_response(&letter_prompt, &relevant),
            self.rag.generate_response(&arguments_prompt, &relevant),
        )?;

        let supporting_sections = relevant
            .iter()
            .take(retrieval.supporting_sections)
            .map(|c| c.citation())
            .collect();
        info!(case = %case.case_title, "generated letter and arguments");

        Ok(GeneratedContent {
            formal_letter,
            legal_arguments,
            supporting_sections,
            relevant_documents: relevant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{sample_case, Section};
    use crate::vectorstore::FlatIndex;
    use providers::local::HashingEmbedder;
    use providers::{Completion, CompletionRequest, LlmProvider, ProviderError, ProviderRegistry};

    /// Answers letter prompts and argument prompts differently.
    struct Drafter;

    #[async_trait::async_trait]
    impl LlmProvider for Drafter {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
            let content = if request.prompt.contains("formal legal letter") {
                "LETTER"
            } else {
                "ARGUMENTS"
            };
            Ok(Completion {
                content: content.into(),
            })
        }
    }

    struct Offline;

    #[async_trait::async_trait]
    impl LlmProvider for Offline {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, ProviderError> {
            Err(ProviderError::RequestFailed("connection refused".into()))
        }
    }

    async fn indexed(llm: Arc<dyn LlmProvider>, sections: usize) -> Arc<RagSystem> {
        let registry = ProviderRegistry::new()
            .with_embedding("local", Arc::new(HashingEmbedder::new(64)))
            .set_preferred_embedding("local")
            .with_llm("test", llm)
            .set_preferred_llm("test");
        let mut rag = RagSystem::new(AppConfig::default(), registry, Box::new(FlatIndex::new()));
        let sections: Vec<Section> = (1..=sections)
            .map(|i| Section {
                title: format!("Section {i}"),
                content: format!("Provision {i} about wages and salary withheld by employers."),
                page_number: i as u32 + 10,
                source: "act.txt".into(),
            })
            .collect();
        rag.process_documents(&sections);
        rag.create_vector_store().await.unwrap();
        Arc::new(rag)
    }

    #[tokio::test]
    async fn generates_both_documents_and_citations() {
        let generator = LetterGenerator::new(indexed(Arc::new(Drafter), 9).await);
        let content = generator.generate(&sample_case()).await.unwrap();

        assert_eq!(content.formal_letter, "LETTER");
        assert_eq!(content.legal_arguments, "ARGUMENTS");
        assert_eq!(content.relevant_documents.len(), 7);
        assert_eq!(content.supporting_sections.len(), 5);
        let first = &content.relevant_documents[0];
        assert_eq!(
            content.supporting_sections[0],
            format!("{} (Page {})", first.chunk.section_title, first.chunk.page_number)
        );
    }

    #[tokio::test]
    async fn small_corpus_cites_what_it_has() {
        let generator = LetterGenerator::new(indexed(Arc::new(Drafter), 2).await);
        let content = generator.generate(&sample_case()).await.unwrap();
        assert_eq!(content.relevant_documents.len(), 2);
        assert_eq!(content.supporting_sections.len(), 2);
    }

    #[tokio::test]
    async fn llm_failure_is_an_error() {
        let generator = LetterGenerator::new(indexed(Arc::new(Offline), 3).await);
        let err = generator.generate(&sample_case()).await.unwrap_err();
        assert!(format!("{err:#}").contains("connection refused"));
    }
}
