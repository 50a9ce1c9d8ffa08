//! Retrieval-augmented generation over the legal corpus.
//!
//! `RagSystem` owns the chunked corpus and its vector index. It is built once
//! (from disk or by ingesting documents) and then only read, so the service
//! shares it behind an `Arc`.

use crate::chunker::{self, TextSplitter};
use crate::config::AppConfig;
use crate::documents;
use crate::embeddings;
use crate::models::{Chunk, RetrievedChunk, Section};
use crate::prompt;
use crate::sections;
use crate::vectorstore::{build_vector_store, VectorRecord, VectorStore};
use anyhow::Context;
use chrono::{DateTime, Utc};
use providers::{CompletionRequest, ProviderRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DOCUMENTS_FILE: &str = "documents.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const DIMENSION_CHECK: &str = "legal provision";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub fingerprint: Option<String>,
    pub chunk_count: usize,
    pub dimension: Option<usize>,
    pub embedding_provider: String,
    #[serde(default)]
    pub embedding_model: String,
    pub vector_provider: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub documents: usize,
    pub pages: usize,
    pub sections: usize,
    pub chunks: usize,
}

pub struct RagSystem {
    config: AppConfig,
    registry: ProviderRegistry,
    store: Box<dyn VectorStore>,
    documents: Vec<Chunk>,
    dimension: Option<usize>,
    indexed: bool,
}

impl RagSystem {
    pub fn new(config: AppConfig, registry: ProviderRegistry, store: Box<dyn VectorStore>) -> Self {
        Self {
            config,
            registry,
            store,
            documents: Vec::new(),
            dimension: None,
            indexed: false,
        }
    }

    pub fn documents(&self) -> &[Chunk] {
        &self.documents
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn process_documents(&mut self, sections: &[Section]) -> &[Chunk] {
        let splitter = TextSplitter::from_config(&self.config.chunking);
        self.documents = chunker::process_sections(&splitter, sections);
        self.indexed = false;
        info!("Processed {} document chunks", self.documents.len());
        &self.documents
    }

    pub async fn create_vector_store(&mut self) -> anyhow::Result<()> {
        if self.documents.is_empty() {
            anyhow::bail!("No documents processed. Call process_documents first.");
        }
        self.store.clear().await?;
        let batch_size = self.config.embeddings.batch_size.max(1);
        for (batch_no, batch) in self.documents.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = embeddings::embed_batched(&texts, &self.registry, batch_size).await?;
            if let Some(v) = vectors.first() {
                self.dimension = Some(v.len());
            }
            let offset = batch_no * batch_size;
            let records = batch
                .iter()
                .zip(vectors)
                .enumerate()
                .map(|(i, (chunk, vector))| VectorRecord {
                    id: (offset + i) as u64,
                    vector,
                    metadata: chunk_payload(chunk),
                })
                .collect();
            self.store.upsert(records).await?;
        }
        self.indexed = true;
        info!(
            "Created {} vector store with {} documents",
            self.store.kind(),
            self.documents.len()
        );
        Ok(())
    }

    pub async fn save_vector_store(
        &self,
        dir: &Path,
        fingerprint: Option<String>,
    ) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        write_json(&dir.join(DOCUMENTS_FILE), &self.documents)?;
        self.store.persist(dir).await?;
        let manifest = StoreManifest {
            fingerprint,
            chunk_count: self.documents.len(),
            dimension: self.dimension,
            embedding_provider: self.config.embeddings.provider.clone(),
            embedding_model: self.config.embeddings.model.clone(),
            vector_provider: self.store.kind().to_string(),
            created_at: Utc::now(),
        };
        write_json(&dir.join(MANIFEST_FILE), &manifest)?;
        info!("Vector store saved to {}", dir.display());
        Ok(())
    }

    /// Loads a previously saved store. Any failure leaves the system
    /// unindexed and returns false.
    pub async fn load_vector_store(&mut self, dir: &Path) -> bool {
        match self.try_load(dir).await {
            Ok(()) => {
                info!("Vector store loaded from {}", dir.display());
                true
            }
            Err(e) => {
                warn!("Error loading vector store: {e:#}");
                self.documents.clear();
                self.indexed = false;
                false
            }
        }
    }

    async fn try_load(&mut self, dir: &Path) -> anyhow::Result<()> {
        let documents: Vec<Chunk> = read_json(&dir.join(DOCUMENTS_FILE))?;
        if !self.store.restore(dir).await? {
            anyhow::bail!("no {} index found in {}", self.store.kind(), dir.display());
        }
        if self.store.kind() == "local" {
            let indexed = self.store.len().await?;
            if indexed != documents.len() {
                anyhow::bail!(
                    "index holds {indexed} vectors but {} documents were saved",
                    documents.len()
                );
            }
        }
        self.dimension = read_manifest(dir).and_then(|m| m.dimension);
        self.documents = documents;
        self.indexed = true;
        Ok(())
    }

    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> anyhow::Result<Vec<RetrievedChunk>> {
        if !self.indexed {
            anyhow::bail!("Vector store not initialized");
        }
        let vector = embeddings::embed_query(query, &self.registry).await?;
        let hits = self.store.search(&vector, k).await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                self.documents
                    .get(hit.id as usize)
                    .map(|chunk| RetrievedChunk {
                        chunk: chunk.clone(),
                        score: hit.score,
                    })
            })
            .collect())
    }

    pub async fn generate_response(
        &self,
        query: &str,
        context: &[RetrievedChunk],
    ) -> anyhow::Result<String> {
        let chunks: Vec<&Chunk> = context.iter().map(|c| &c.chunk).collect();
        let request = CompletionRequest {
            prompt: prompt::response_prompt(query, &prompt::full_context(&chunks)),
            model: Some(self.config.llm.model.clone()),
            temperature: Some(self.config.llm.temperature),
        };
        let llm = self.registry.llm(None)?;
        let completion = llm
            .complete(&request)
            .await
            .context("LLM generation failed")?;
        Ok(completion.content)
    }

    /// Reads, sections, chunks and indexes `paths`, then saves the store.
    pub async fn ingest(&mut self, paths: &[PathBuf]) -> anyhow::Result<IngestSummary> {
        let owned = paths.to_vec();
        let (pages, fingerprint) = tokio::task::spawn_blocking(move || {
            let mut pages = Vec::new();
            for path in &owned {
                pages.extend(documents::load_pages(path)?);
            }
            let fingerprint = documents::fingerprint(&owned)?;
            anyhow::Ok((pages, fingerprint))
        })
        .await??;

        let sections = sections::extract_sections(&pages);
        info!("Extracted {} sections from {} pages", sections.len(), pages.len());
        self.process_documents(&sections);
        self.create_vector_store().await?;
        let dir = PathBuf::from(&self.config.vectors.path);
        self.save_vector_store(&dir, Some(fingerprint)).await?;

        Ok(IngestSummary {
            documents: paths.len(),
            pages: pages.len(),
            sections: sections.len(),
            chunks: self.documents.len(),
        })
    }

    /// Startup path: reuse the saved store when it matches the current corpus
    /// and embedding provider, otherwise ingest from scratch.
    pub async fn bootstrap(
        config: AppConfig,
        registry: ProviderRegistry,
        force: bool,
    ) -> anyhow::Result<(Self, Option<IngestSummary>)> {
        let store = build_vector_store(&config);
        let mut rag = RagSystem::new(config, registry, store);
        let dir = PathBuf::from(&rag.config.vectors.path);

        let doc_cfg = rag.config.documents.clone();
        let discovered = tokio::task::spawn_blocking(move || {
            documents::discover(&doc_cfg.paths, &doc_cfg.exclude)
        })
        .await??;

        if !force {
            let current = if discovered.is_empty() {
                None
            } else {
                let owned = discovered.clone();
                Some(tokio::task::spawn_blocking(move || documents::fingerprint(&owned)).await??)
            };
            if rag.is_reusable(&dir, current.as_deref()).await && rag.load_vector_store(&dir).await
            {
                return Ok((rag, None));
            }
            info!("Vector store not found or stale. Processing documents...");
        }

        if discovered.is_empty() {
            anyhow::bail!(
                "no legal documents found under {:?}",
                rag.config.documents.paths
            );
        }
        let summary = rag.ingest(&discovered).await?;
        info!("RAG system initialized successfully");
        Ok((rag, Some(summary)))
    }

    /// A saved store is reusable when it was built by the same providers and
    /// embedding model, its vectors have the width the embedder produces now,
    /// and the corpus fingerprint is unchanged.
    async fn is_reusable(&self, dir: &Path, fingerprint: Option<&str>) -> bool {
        let Some(manifest) = read_manifest(dir) else {
            return false;
        };
        if manifest.embedding_provider != self.config.embeddings.provider
            || manifest.vector_provider != self.store.kind()
        {
            info!("vector store was built with a different provider");
            return false;
        }
        if manifest.embedding_model != self.config.embeddings.model {
            info!(
                saved = %manifest.embedding_model,
                current = %self.config.embeddings.model,
                "vector store was built with a different embedding model"
            );
            return false;
        }
        match embeddings::embed_query(DIMENSION_CHECK, &self.registry).await {
            Ok(v) if manifest.dimension == Some(v.len()) => {}
            Ok(v) => {
                info!(
                    saved = ?manifest.dimension,
                    current = v.len(),
                    "vector store dimension does not match the embedder"
                );
                return false;
            }
            Err(e) => {
                warn!("could not check embedding dimension: {e:#}");
                return false;
            }
        }
        match (fingerprint, manifest.fingerprint.as_deref()) {
            (Some(now), Some(then)) if now != then => {
                info!("legal documents changed since the vector store was built");
                false
            }
            _ => true,
        }
    }
}

fn chunk_payload(chunk: &Chunk) -> HashMap<String, serde_json::Value> {
    HashMap::from([
        ("chunk_id".to_string(), serde_json::json!(chunk.chunk_id)),
        ("section_title".to_string(), serde_json::json!(chunk.section_title)),
        ("page_number".to_string(), serde_json::json!(chunk.page_number)),
        ("source".to_string(), serde_json::json!(chunk.source)),
    ])
}

fn read_manifest(dir: &Path) -> Option<StoreManifest> {
    read_json(&dir.join(MANIFEST_FILE)).ok()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
