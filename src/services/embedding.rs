use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig};

/// Dimension of AllMiniLM-L6-v2 sentence embeddings.
pub const MINILM_DIMENSION: usize = 384;

/// Turns text into fixed-length vectors. Implementations are CPU-bound and
/// are called from the blocking pool.
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .pop()
            .context("Embedder returned no vector")
    }
}

pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Hashing => {
            tracing::info!("Using hashing embedder ({MINILM_DIMENSION} dims)");
            Ok(Arc::new(HashingEmbedder::new(MINILM_DIMENSION)))
        }
        #[cfg(feature = "fastembed")]
        EmbeddingBackend::Fastembed => {
            let embedder = FastEmbedder::new(config.cache_dir.as_deref())?;
            tracing::info!("AllMiniLML6V2 embedding model loaded");
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "fastembed"))]
        EmbeddingBackend::Fastembed => Err(anyhow::anyhow!(
            "embedding.backend = \"fastembed\" requires the `fastembed` cargo feature"
        )),
    }
}

/// `TextEmbedding::embed` needs exclusive access, so the model sits behind a mutex.
#[cfg(feature = "fastembed")]
pub struct FastEmbedder {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "fastembed")]
impl FastEmbedder {
    pub fn new(cache_dir: Option<&str>) -> Result<Self> {
        let mut options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(std::path::PathBuf::from(dir));
        }

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| anyhow::anyhow!("Failed to load AllMiniLML6V2: {e}"))?;

        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "fastembed")]
impl Embedder for FastEmbedder {
    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow::anyhow!("Embedding model mutex poisoned"))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| anyhow::anyhow!("Embedding failed: {e}"))
    }
}

/// Bag-of-words feature hashing. Texts sharing words land close together,
/// which is enough for offline use and tests.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
