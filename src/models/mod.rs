//! 모델 기능 모듈
//!
//! 추출형 QA, 요약, 키프레이즈 추출, 문항 생성을 좁은 트레이트 뒤에 둡니다.
//! 프로세스 시작 시 한 번 생성되어 읽기 전용으로 공유됩니다.
//!
//! - `local`: 오프라인 휴리스틱 구현
//! - `gemini`: Gemini API 구현

pub mod gemini;
pub mod local;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Backend;
use crate::embedding::{EmbeddingProvider, GeminiEmbedding, HashingEmbedding};
use crate::error::{AssistError, AssistResult};
use crate::gemini::GeminiClient;

pub use gemini::{GeminiQa, GeminiQuestionGenerator, GeminiSummarizer};
pub use local::{EmbeddingKeyphrases, OverlapQa, FrequencySummarizer};

// ============================================================================
// Capability Types
// ============================================================================

/// 요약 길이 범위 (단어 수)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLength {
    pub min_words: usize,
    pub max_words: usize,
}

/// 키프레이즈 추출 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyphraseParams {
    /// n-gram 최대 길이 (1 ~ max_ngram 단어)
    pub max_ngram: usize,
    /// 반환할 후보 수
    pub top_n: usize,
    /// MMR 다양성 (0.0이면 점수순)
    pub diversity: f32,
}

impl Default for KeyphraseParams {
    fn default() -> Self {
        Self {
            max_ngram: 3,
            top_n: 10,
            diversity: 0.7,
        }
    }
}

/// 관련도 점수가 붙은 키프레이즈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPhrase {
    pub phrase: String,
    pub score: f32,
}

impl ScoredPhrase {
    pub fn new(phrase: impl Into<String>, score: f32) -> Self {
        Self {
            phrase: phrase.into(),
            score,
        }
    }
}

/// 문항 생성 디코딩 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_length: u32,
    pub num_beams: u32,
    pub do_sample: bool,
    pub temperature: f32,
}

// ============================================================================
// Capability Traits
// ============================================================================

/// 추출형 질의응답: 컨텍스트에서 답 구간을 선택
#[async_trait]
pub trait ExtractiveQa: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// 요약기
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String>;

    fn name(&self) -> &str;
}

/// 키프레이즈 추출기
#[async_trait]
pub trait KeyphraseExtractor: Send + Sync {
    async fn extract(&self, text: &str, params: KeyphraseParams) -> Result<Vec<ScoredPhrase>>;

    fn name(&self) -> &str;
}

/// 문항 생성기: (컨텍스트, 정답) → 질문
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        context: &str,
        answer: &str,
        params: &GenerationParams,
    ) -> Result<String>;

    fn name(&self) -> &str;
}

// ============================================================================
// Models Registry
// ============================================================================

/// 모델 묶음
///
/// 초기화에 실패한 기능은 `None`으로 남고, 사용 시
/// `AssistError::ModelUnavailable`을 돌려줍니다. 문항 생성기가 없으면
/// 퀴즈는 템플릿 문항으로 대체됩니다.
#[derive(Clone, Default)]
pub struct Models {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    qa: Option<Arc<dyn ExtractiveQa>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    keyphrases: Option<Arc<dyn KeyphraseExtractor>>,
    question_generator: Option<Arc<dyn QuestionGenerator>>,
}

impl Models {
    /// 비어있는 묶음 (모든 기능 비활성)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 오프라인 로컬 모델
    pub fn local() -> Self {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedding::new());
        Self {
            keyphrases: Some(Arc::new(EmbeddingKeyphrases::new(embedder.clone()))),
            embedder: Some(embedder),
            qa: Some(Arc::new(OverlapQa)),
            summarizer: Some(Arc::new(FrequencySummarizer)),
            question_generator: None,
        }
    }

    /// Gemini 모델 (클라이언트 공유)
    pub fn gemini(client: GeminiClient) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(GeminiEmbedding::new(client.clone())?);
        Ok(Self {
            keyphrases: Some(Arc::new(EmbeddingKeyphrases::new(embedder.clone()))),
            embedder: Some(embedder),
            qa: Some(Arc::new(GeminiQa::new(client.clone()))),
            summarizer: Some(Arc::new(GeminiSummarizer::new(client.clone()))),
            question_generator: Some(Arc::new(GeminiQuestionGenerator::new(client))),
        })
    }

    /// 백엔드 설정에 따라 로드
    ///
    /// Gemini 초기화에 실패하면 프로세스를 중단하지 않고 모든 기능을
    /// 비활성 상태로 둡니다.
    pub fn load(backend: Backend) -> Self {
        match backend {
            Backend::Local => {
                tracing::info!("Using local models");
                Self::local()
            }
            Backend::Gemini => match GeminiClient::from_env().and_then(Self::gemini) {
                Ok(models) => {
                    tracing::info!("Using Gemini models");
                    models
                }
                Err(e) => {
                    tracing::error!("Failed to initialize Gemini models: {:#}", e);
                    Self::empty()
                }
            },
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_qa(mut self, qa: Arc<dyn ExtractiveQa>) -> Self {
        self.qa = Some(qa);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_keyphrases(mut self, keyphrases: Arc<dyn KeyphraseExtractor>) -> Self {
        self.keyphrases = Some(keyphrases);
        self
    }

    pub fn with_question_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.question_generator = Some(generator);
        self
    }

    pub fn without_question_generator(mut self) -> Self {
        self.question_generator = None;
        self
    }

    pub fn embedder(&self) -> AssistResult<&dyn EmbeddingProvider> {
        self.embedder
            .as_deref()
            .ok_or(AssistError::ModelUnavailable("embedding"))
    }

    pub fn qa(&self) -> AssistResult<&dyn ExtractiveQa> {
        self.qa
            .as_deref()
            .ok_or(AssistError::ModelUnavailable("question-answering"))
    }

    pub fn summarizer(&self) -> AssistResult<&dyn Summarizer> {
        self.summarizer
            .as_deref()
            .ok_or(AssistError::ModelUnavailable("summarization"))
    }

    pub fn keyphrases(&self) -> AssistResult<&dyn KeyphraseExtractor> {
        self.keyphrases
            .as_deref()
            .ok_or(AssistError::ModelUnavailable("keyphrase"))
    }

    /// 선택 기능: 없으면 템플릿 문항 사용
    pub fn question_generator(&self) -> Option<&dyn QuestionGenerator> {
        self.question_generator.as_deref()
    }

    /// 로드된 기능 이름 목록 (상태 출력용)
    pub fn describe(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("embedding", self.embedder.as_ref().map(|m| m.name().to_string())),
            ("question-answering", self.qa.as_ref().map(|m| m.name().to_string())),
            ("summarization", self.summarizer.as_ref().map(|m| m.name().to_string())),
            ("keyphrase", self.keyphrases.as_ref().map(|m| m.name().to_string())),
            (
                "question-generation",
                self.question_generator.as_ref().map(|m| m.name().to_string()),
            ),
        ]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_models_report_unavailable() {
        let models = Models::empty();
        assert!(matches!(
            models.embedder(),
            Err(AssistError::ModelUnavailable("embedding"))
        ));
        assert!(matches!(
            models.summarizer(),
            Err(AssistError::ModelUnavailable("summarization"))
        ));
        assert!(models.question_generator().is_none());
    }

    #[test]
    fn test_local_models_have_no_question_generator() {
        let models = Models::local();
        assert!(models.embedder().is_ok());
        assert!(models.qa().is_ok());
        assert!(models.summarizer().is_ok());
        assert!(models.keyphrases().is_ok());
        assert!(models.question_generator().is_none());

        let described = models.describe();
        assert_eq!(described.len(), 5);
        assert_eq!(described[0].1.as_deref(), Some("feature-hashing"));
    }

    #[test]
    fn test_gemini_models_share_client() {
        let client = GeminiClient::new("fake_key".to_string()).unwrap();
        let models = Models::gemini(client).unwrap();
        assert!(models.question_generator().is_some());
        assert_eq!(models.embedder().unwrap().dimension(), 768);
    }
}
