//! Embedding Index - 정확한 L2 최근접 이웃 검색
//!
//! 문서당 청크 수가 작으므로 ANN 없이 전수 비교합니다.
//! 청크 목록과 벡터 인덱스는 `DocumentIndex` 하나로 묶여 함께 교체됩니다.

use crate::embedding::{squared_l2, EmbeddingProvider};
use crate::error::{AssistError, AssistResult};

use super::Chunk;

// ============================================================================
// FlatL2Index
// ============================================================================

/// 검색 결과 (청크 위치 + 제곱 L2 거리)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// 전수 비교 L2 인덱스
#[derive(Debug, Clone, Default)]
pub struct FlatL2Index {
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// 거리 오름차순 상위 `min(k, len)`개 (동거리면 위치 순)
    pub fn query(&self, embedding: &[f32], k: usize) -> Vec<Neighbor> {
        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| Neighbor {
                position,
                distance: squared_l2(embedding, v),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);
        neighbors
    }
}

// ============================================================================
// DocumentIndex
// ============================================================================

/// 청크 + 인덱스 (항상 같은 길이)
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    chunks: Vec<Chunk>,
    index: FlatL2Index,
}

impl DocumentIndex {
    /// 청크를 임베딩하여 인덱스 생성
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> AssistResult<Self> {
        if chunks.is_empty() {
            return Err(AssistError::EmptyDocument);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder
            .embed_batch(&texts)
            .await
            .map_err(AssistError::inference)?;

        tracing::debug!(
            "Indexed {} chunks with {} ({} dims)",
            chunks.len(),
            embedder.name(),
            embedder.dimension()
        );

        Self::from_parts(chunks, FlatL2Index::new(vectors))
    }

    /// 길이 불변식을 검사하며 조립
    pub fn from_parts(chunks: Vec<Chunk>, index: FlatL2Index) -> AssistResult<Self> {
        if chunks.len() != index.len() {
            return Err(AssistError::IndexMismatch {
                chunks: chunks.len(),
                vectors: index.len(),
            });
        }
        Ok(Self { chunks, index })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// 가까운 청크 순으로 `(청크, 거리)` 반환
    pub fn search(&self, embedding: &[f32], k: usize) -> Vec<(&Chunk, f32)> {
        self.index
            .query(embedding, k)
            .into_iter()
            .map(|n| (&self.chunks[n.position], n.distance))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
