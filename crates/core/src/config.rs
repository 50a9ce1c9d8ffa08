use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub documents: DocumentConfig,
    pub chunking: ChunkingConfig,
    pub embeddings: EmbeddingConfig,
    pub vectors: VectorConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/lexdraft.db".to_string(),
        }
    }
}

/// Where the legal reference corpus lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub paths: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            paths: vec!["documents".to_string()],
            exclude: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 384,
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub provider: String,
    pub path: String,
    pub url: Option<String>,
    pub collection: String,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            path: "vector_store".to_string(),
            url: None,
            collection: "legal_sections".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub supporting_sections: usize,
    pub context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 7,
            supporting_sections: 5,
            context_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunking.chunk_size == 0 {
            anyhow::bail!("chunking.chunk_size must be greater than 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            anyhow::bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than 0");
        }
        if self.embeddings.dimension == 0 {
            anyhow::bail!("embeddings.dimension must be greater than 0");
        }
        if self.retrieval.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be greater than 0");
        }
        if self.retrieval.supporting_sections > self.retrieval.top_k {
            anyhow::bail!("retrieval.supporting_sections cannot exceed retrieval.top_k");
        }
        Ok(())
    }
}

/// Loads the TOML file, then `LEXDRAFT__*` environment overrides. Missing keys
/// fall back to the `Default` impls.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("LEXDRAFT")
            .separator("__")
            .try_parsing(true),
    );
    let cfg: AppConfig = settings.build()?.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_behaviour() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.chunking.chunk_size, 1000);
        assert_eq!(cfg.chunking.chunk_overlap, 200);
        assert_eq!(cfg.retrieval.top_k, 7);
        assert_eq!(cfg.retrieval.supporting_sections, 5);
        assert_eq!(cfg.server.port, 9000);
        assert!((cfg.llm.temperature - 0.3).abs() < f32::EPSILON);
        cfg.validate().unwrap();
    }

    #[test]
    fn file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexdraft.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[chunking]\nchunk_size = 400\nchunk_overlap = 50\n").unwrap();
        writeln!(f, "[server]\nport = 9100").unwrap();

        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 400);
        assert_eq!(cfg.chunking.chunk_overlap, 50);
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.retrieval.top_k, 7);
    }

    #[test]
    fn overlap_must_be_below_chunk_size() {
        let mut cfg = AppConfig::default();
        cfg.chunking.chunk_overlap = cfg.chunking.chunk_size;
        assert!(cfg.validate().is_err());
    }
}
