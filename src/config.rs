//! 설정 모듈
//!
//! 기본값은 원래 서비스에서 쓰던 상수들입니다.
//! 환경변수로 일부 값을 덮어쓸 수 있습니다.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.doc-tutor/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".doc-tutor")
}

// ============================================================================
// Backend
// ============================================================================

/// 모델 백엔드 선택
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// 오프라인 휴리스틱 모델 (기본값)
    #[default]
    Local,
    /// Gemini API
    Gemini,
}

impl Backend {
    /// 문자열에서 파싱 (대소문자 무시)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" => Some(Backend::Local),
            "gemini" => Some(Backend::Gemini),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Gemini => "gemini",
        }
    }
}

// ============================================================================
// Config Types
// ============================================================================

/// 전체 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub backend: Backend,
    /// 업로드 파일 저장 위치
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// 질의응답 시 가져올 청크 수
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub grading: GradingConfig,
}

fn default_upload_dir() -> PathBuf {
    get_data_dir().join("uploads")
}

fn default_top_k() -> usize {
    3
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            upload_dir: default_upload_dir(),
            top_k: default_top_k(),
            cache: CacheConfig::default(),
            summary: SummaryConfig::default(),
            quiz: QuizConfig::default(),
            grading: GradingConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// 기본값에 환경변수를 덮어써서 생성
    ///
    /// - `DOC_TUTOR_BACKEND`: `local` | `gemini`
    /// - `DOC_TUTOR_UPLOAD_DIR`: 업로드 디렉토리
    /// - `DOC_TUTOR_TOP_K`: 검색 청크 수
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("DOC_TUTOR_BACKEND") {
            match Backend::parse(&value) {
                Some(backend) => config.backend = backend,
                None => tracing::warn!("Ignoring unknown DOC_TUTOR_BACKEND: {}", value),
            }
        }

        if let Ok(dir) = std::env::var("DOC_TUTOR_UPLOAD_DIR") {
            if !dir.is_empty() {
                config.upload_dir = PathBuf::from(dir);
            }
        }

        if let Ok(value) = std::env::var("DOC_TUTOR_TOP_K") {
            match value.parse::<usize>() {
                Ok(k) if k > 0 => config.top_k = k,
                _ => tracing::warn!("Ignoring invalid DOC_TUTOR_TOP_K: {}", value),
            }
        }

        config
    }
}

/// 캐시 용량
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 추출 텍스트 캐시
    pub text_capacity: usize,
    /// 문서 인덱스 캐시
    pub index_capacity: usize,
    /// 요약/질의응답/퀴즈 응답 캐시 (각각)
    pub response_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            text_capacity: 50,
            index_capacity: 10,
            response_capacity: 100,
        }
    }
}

/// 요약 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// 이보다 짧으면 요약하지 않음 (공백 제거 후 문자 수)
    pub min_input_chars: usize,
    /// 모델에 넘기는 최대 문자 수 (초과분은 잘라냄)
    pub max_input_chars: usize,
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_input_chars: 50,
            max_input_chars: 1000,
            min_words: 100,
            max_words: 150,
        }
    }
}

/// 퀴즈 생성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    pub min_input_chars: usize,
    pub max_input_chars: usize,
    /// 키프레이즈 후보 수
    pub candidate_phrases: usize,
    /// 키프레이즈 다양성 (MMR, 0.0 ~ 1.0)
    pub diversity: f32,
    /// 이 점수 이하의 키프레이즈는 버림
    pub min_phrase_score: f32,
    /// 다양성 필터 후 유지할 최대 키프레이즈 수
    pub max_phrases: usize,
    /// 출제 문항 수
    pub question_count: usize,
    /// 문항 생성 시 세그먼트에서 사용할 최대 문자 수
    pub segment_chars: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            min_input_chars: 50,
            max_input_chars: 2000,
            candidate_phrases: 10,
            diversity: 0.7,
            min_phrase_score: 0.3,
            max_phrases: 5,
            question_count: 3,
            segment_chars: 800,
        }
    }
}

/// 채점 설정 (정답 임계값 0.6은 고정 상수)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    /// 근거 문장으로 인정할 최소 길이
    pub min_sentence_chars: usize,
    /// 의미 유사도 근거 검색의 최소 유사도
    pub min_context_similarity: f32,
    /// 근거로 인용할 최대 문장 수
    pub max_context_sentences: usize,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            min_sentence_chars: 10,
            min_context_similarity: 0.3,
            max_context_sentences: 2,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
