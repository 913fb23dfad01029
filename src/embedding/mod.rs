//! 임베딩 모듈 - 텍스트 벡터화
//!
//! 청크 인덱싱, 질문 검색, 답안 채점이 모두 이 트레이트를 통해
//! 벡터를 얻습니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = HashingEmbedding::new();
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::gemini::GeminiClient;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 고정 차원 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Local Hashing Embedding
// ============================================================================

/// 로컬 임베딩 기본 차원
pub const HASHING_DIMENSION: usize = 256;

/// Feature hashing 임베딩
///
/// 토큰을 `[0, dimension)` 버킷으로 해싱한 TF 벡터를 L2 정규화합니다.
/// 어휘 사전이 없고 결정적이라 같은 텍스트는 항상 같은 벡터가 됩니다.
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    pub fn new() -> Self {
        Self::with_dimension(HASHING_DIMENSION)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// SHA-256 앞 8바이트(빅엔디언)를 차원으로 나눈 나머지
    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(head) % self.dimension as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut tf = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            tf[self.bucket(&token)] += 1.0;
        }

        let norm: f32 = tf.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut tf {
                *x /= norm;
            }
        }

        tf
    }
}

impl Default for HashingEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "feature-hashing"
    }
}

/// 소문자 영숫자 토큰으로 분리
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

// ============================================================================
// Google Gemini Embedding
// ============================================================================

/// Gemini 기본 임베딩 차원
pub const GEMINI_DIMENSION: usize = 768;

/// Google Gemini 임베딩 구현체
///
/// source: https://ai.google.dev/gemini-api/docs/embeddings
#[derive(Debug, Clone)]
pub struct GeminiEmbedding {
    client: GeminiClient,
    dimension: usize,
}

impl GeminiEmbedding {
    pub fn new(client: GeminiClient) -> Result<Self> {
        Self::with_dimension(client, GEMINI_DIMENSION)
    }

    /// 차원을 지정하여 생성 (768, 1536, 3072 중 선택)
    pub fn with_dimension(client: GeminiClient, dimension: usize) -> Result<Self> {
        if ![768, 1536, 3072].contains(&dimension) {
            anyhow::bail!(
                "Invalid dimension: {}. Must be 768, 1536, or 3072",
                dimension
            );
        }

        Ok(Self { client, dimension })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        let values = self
            .client
            .embed(text, self.dimension)
            .await
            .context("Gemini embedding failed")?;

        if values.len() != self.dimension {
            anyhow::bail!(
                "Gemini returned {} dimensions, expected {}",
                values.len(),
                self.dimension
            );
        }

        Ok(values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Gemini는 배치 API가 없으므로 순차 처리 (Rate limiter가 자동으로 조절)
        let mut results = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            tracing::debug!("Embedding batch {}/{}", i + 1, texts.len());
            results.push(self.embed(text).await?);
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "gemini-embedding-001"
    }
}

// ============================================================================
// Vector Utilities
// ============================================================================

/// 코사인 유사도 (-1.0 ~ 1.0)
///
/// 길이가 다르거나 영벡터면 0.0을 반환합니다.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// 제곱 L2 거리
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================
