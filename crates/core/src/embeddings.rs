use providers::ProviderRegistry;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    pub texts: Vec<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub vectors: Vec<Vec<f32>>,
}

pub async fn embed(
    req: EmbeddingRequest,
    registry: &ProviderRegistry,
) -> anyhow::Result<EmbeddingResult> {
    let provider = registry.embedding(req.provider.as_deref())?;
    let resp = provider.embed(&req.texts).await?;
    if resp.vectors.len() != req.texts.len() {
        anyhow::bail!(
            "embedding provider returned {} vectors for {} texts",
            resp.vectors.len(),
            req.texts.len()
        );
    }
    Ok(EmbeddingResult {
        vectors: resp.vectors,
    })
}

/// Embeds `texts` in batches of `batch_size`, preserving order.
pub async fn embed_batched(
    texts: &[String],
    registry: &ProviderRegistry,
    batch_size: usize,
) -> anyhow::Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());
    for (i, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        let result = embed(
            EmbeddingRequest {
                texts: batch.to_vec(),
                provider: None, // Use preferred provider
            },
            registry,
        )
        .await?;
        debug!(batch = i, size = batch.len(), "embedded batch");
        vectors.extend(result.vectors);
    }
    Ok(vectors)
}

pub async fn embed_query(query: &str, registry: &ProviderRegistry) -> anyhow::Result<Vec<f32>> {
    let result = embed(
        EmbeddingRequest {
            texts: vec![query.to_string()],
            provider: None,
        },
        registry,
    )
    .await?;
    result
        .vectors
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("embedding provider returned no vector"))
}
