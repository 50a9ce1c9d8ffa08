use crate::config::AppConfig;
use crate::rag::{IngestSummary, RagSystem};
use providers::local::HashingEmbedder;
use providers::openai::{OpenAiConfig, OpenAiProvider, DEFAULT_BASE_URL};
use providers::ProviderRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// Registers the providers available in this environment. The hashing
/// embedder is always present; OpenAI needs `OPENAI_API_KEY`.
pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_embedding(
        "local",
        Arc::new(HashingEmbedder::new(config.embeddings.dimension)),
    );

    if let Some(key) = std::env::var_os("OPENAI_API_KEY") {
        let base = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url: base,
            embedding_model: config.embeddings.model.clone(),
            chat_model: config.llm.model.clone(),
            temperature: config.llm.temperature,
        });
        reg = reg
            .with_embedding("openai", Arc::new(provider.clone()))
            .with_llm("openai", Arc::new(provider));
    }

    let reg = reg
        .set_preferred_embedding(&config.embeddings.provider)
        .set_preferred_llm(&config.llm.provider);
    if !reg.has_llm(None) {
        warn!(
            provider = %config.llm.provider,
            "llm provider is not available, letter generation will fail"
        );
    }
    reg
}

/// Rebuilds the vector store from the configured documents, ignoring any
/// saved copy.
pub async fn rebuild_index(config: AppConfig) -> anyhow::Result<IngestSummary> {
    let registry = build_registry(&config);
    let (_, summary) = RagSystem::bootstrap(config, registry, true).await?;
    let summary = summary.unwrap_or_default();
    info!(
        documents = summary.documents,
        sections = summary.sections,
        chunks = summary.chunks,
        "index rebuilt"
    );
    Ok(summary)
}
