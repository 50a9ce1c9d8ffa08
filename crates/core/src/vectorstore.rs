use crate::config::AppConfig;
use anyhow::Context;
use providers::qdrant::{QdrantClient, QdrantConfig, QdrantPoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

pub const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: u64,
    pub score: f32,
}

#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn upsert(&mut self, records: Vec<VectorRecord>) -> anyhow::Result<()>;
    async fn search(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<VectorHit>>;
    async fn len(&self) -> anyhow::Result<usize>;
    async fn clear(&mut self) -> anyhow::Result<()>;
    /// Writes whatever the store keeps locally under `dir`.
    async fn persist(&self, dir: &Path) -> anyhow::Result<()>;
    /// Restores local state from `dir`; false when nothing usable is there.
    async fn restore(&mut self, dir: &Path) -> anyhow::Result<bool>;
}

/// Exact nearest-neighbour index over squared L2 distance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: Option<usize>,
    entries: BTreeMap<u64, Vec<f32>>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn check_dimension(&self, len: usize) -> anyhow::Result<()> {
        match self.dimension {
            Some(d) if d != len => {
                anyhow::bail!("vector dimension {len} does not match index dimension {d}")
            }
            _ => Ok(()),
        }
    }

    pub fn insert(&mut self, id: u64, vector: Vec<f32>) -> anyhow::Result<()> {
        self.check_dimension(vector.len())?;
        self.dimension = Some(vector.len());
        self.entries.insert(id, vector);
        Ok(())
    }

    /// Closest first; equal distances keep ascending id order.
    pub fn nearest(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<VectorHit>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query.len())?;
        let mut hits: Vec<VectorHit> = self
            .entries
            .iter()
            .map(|(id, v)| VectorHit {
                id: *id,
                score: squared_l2(query, v),
            })
            .collect();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score).then(a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join(INDEX_FILE);
        let file = std::fs::File::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait::async_trait]
impl VectorStore for FlatIndex {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn upsert(&mut self, records: Vec<VectorRecord>) -> anyhow::Result<()> {
        for r in records {
            self.insert(r.id, r.vector)?;
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<VectorHit>> {
        self.nearest(vector, k)
    }

    async fn len(&self) -> anyhow::Result<usize> {
        Ok(self.entries.len())
    }

    async fn clear(&mut self) -> anyhow::Result<()> {
        *self = Self::default();
        Ok(())
    }

    async fn persist(&self, dir: &Path) -> anyhow::Result<()> {
        self.save(dir)
    }

    async fn restore(&mut self, dir: &Path) -> anyhow::Result<bool> {
        if !dir.join(INDEX_FILE).exists() {
            return Ok(false);
        }
        *self = Self::load(dir)?;
        debug!(entries = self.entries.len(), "restored flat index");
        Ok(true)
    }
}

pub struct QdrantStore {
    client: QdrantClient,
    collection_ready: bool,
}

impl QdrantStore {
    pub fn new(client: QdrantClient) -> Self {
        Self {
            client,
            collection_ready: false,
        }
    }
}

#[async_trait::async_trait]
impl VectorStore for QdrantStore {
    fn kind(&self) -> &'static str {
        "qdrant"
    }

    async fn upsert(&mut self, records: Vec<VectorRecord>) -> anyhow::Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        if !self.collection_ready {
            self.client.ensure_collection(first.vector.len()).await?;
            self.collection_ready = true;
        }
        let points: Vec<QdrantPoint> = records
            .into_iter()
            .map(|r| QdrantPoint {
                id: r.id,
                vector: r.vector,
                payload: r.metadata,
            })
            .collect();
        self.client.upsert(points).await?;
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<VectorHit>> {
        let resp = self.client.search(vector.to_vec(), k as u64, None).await?;
        Ok(resp
            .result
            .into_iter()
            .filter_map(|r| {
                r.id.as_u64().map(|id| VectorHit {
                    id,
                    score: r.score,
                })
            })
            .collect())
    }

    async fn len(&self) -> anyhow::Result<usize> {
        Ok(self.client.count().await? as usize)
    }

    async fn clear(&mut self) -> anyhow::Result<()> {
        if self.client.count().await.is_ok() {
            self.client
                .delete_by_filter(serde_json::json!({ "must": [] }))
                .await?;
        }
        Ok(())
    }

    async fn persist(&self, _dir: &Path) -> anyhow::Result<()> {
        Ok(())
    }

    async fn restore(&mut self, _dir: &Path) -> anyhow::Result<bool> {
        let ready = self.client.count().await.map(|n| n > 0).unwrap_or(false);
        self.collection_ready = ready;
        Ok(ready)
    }
}

pub fn build_vector_store(config: &AppConfig) -> Box<dyn VectorStore> {
    match config.vectors.provider.as_str() {
        "qdrant" => {
            if let Some(url) = &config.vectors.url {
                let client = QdrantClient::new(QdrantConfig {
                    url: url.clone(),
                    collection: config.vectors.collection.clone(),
                    api_key: std::env::var("QDRANT_API_KEY").ok(),
                });
                info!(url = %url, collection = %config.vectors.collection, "using qdrant vector store");
                return Box::new(QdrantStore::new(client));
            }
            info!("qdrant selected without a url, falling back to local index");
            Box::new(FlatIndex::new())
        }
        _ => Box::new(FlatIndex::new()),
    }
}
