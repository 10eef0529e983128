use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

use crate::services::embedding::Embedder;
use crate::services::pdf::chunk_text;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    /// Squared L2 distance.
    pub distance: f32,
}

/// Exact nearest-neighbour search over vectors stored row-major in one buffer.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().position(|v| v.len() != self.dimension) {
            anyhow::bail!(
                "Vector {bad} has dimension {}, index expects {}",
                vectors[bad].len(),
                self.dimension
            );
        }
        self.data.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// The `min(k, len)` closest vectors, nearest first, ties by lower index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            anyhow::bail!(
                "Query has dimension {}, index expects {}",
                query.len(),
                self.dimension
            );
        }
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(index, row)| Neighbor {
                index,
                distance: squared_l2(row, query),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RetrievedChunk {
    pub index: usize,
    pub distance: f32,
    pub text: String,
}

/// A processed document: its text, word chunks and their embeddings.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    pub text: String,
    pub chunk_size: usize,
    pub chunks: Vec<String>,
    pub fingerprint: String,
    index: FlatL2Index,
}

impl DocumentIndex {
    pub fn build(
        text: String,
        chunk_size: usize,
        embedder: &dyn Embedder,
    ) -> Result<Self> {
        let chunks = chunk_text(&text, chunk_size);
        let mut index = FlatL2Index::new(embedder.dimension());

        if !chunks.is_empty() {
            let embeddings = embedder
                .embed(&chunks)
                .context("Failed to embed document chunks")?;
            if embeddings.len() != chunks.len() {
                anyhow::bail!(
                    "Embedder returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                );
            }
            index.add(&embeddings)?;
        }

        Ok(Self {
            fingerprint: fingerprint(&text),
            text,
            chunk_size,
            chunks,
            index,
        })
    }

    pub fn vector_count(&self) -> usize {
        self.index.len()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// The first `max_chars` characters of the document text.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &self.text[..byte_idx],
            None => &self.text,
        }
    }

    pub fn retrieve(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn Embedder,
    ) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embedder.embed_one(query)?;
        let neighbors = self.index.search(&query_embedding, k)?;

        Ok(neighbors
            .into_iter()
            .map(|n| RetrievedChunk {
                index: n.index,
                distance: n.distance,
                text: self.chunks[n.index].clone(),
            })
            .collect())
    }
}

pub fn fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
