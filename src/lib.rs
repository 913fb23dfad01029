//! doc-tutor - 문서 기반 학습 어시스턴트
//!
//! 업로드한 문서(.txt / .pdf)에 대해 요약, 질의응답,
//! 퀴즈 출제와 채점을 제공합니다.
//!
//! 세션별로 추출 텍스트, 검색 인덱스, 모델 응답을 캐시하며
//! 모델 백엔드는 로컬 휴리스틱 또는 Gemini API 중에서 선택합니다.

pub mod cache;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod gemini;
pub mod knowledge;
pub mod models;
pub mod qa;
pub mod quiz;
pub mod session;
pub mod summary;
pub mod text;

// Re-exports
pub use config::{get_data_dir, AssistantConfig, Backend};
pub use embedding::{EmbeddingProvider, GeminiEmbedding, HashingEmbedding};
pub use error::{AssistError, AssistResult};
pub use extractor::{DocumentHandle, FileType};
pub use gemini::{get_api_key, has_api_key};
pub use models::Models;
pub use qa::Answer;
pub use quiz::{GradeResult, QuizItem, QuizQuestion};
pub use session::{Assistant, Session};
