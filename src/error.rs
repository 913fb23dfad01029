//! 에러 타입
//!
//! 코어 연산이 반환하는 에러 분류입니다.
//! 대부분은 사용자가 조치할 수 있는 상태(문서 없음, 너무 짧음 등)이며
//! 경계 연산(`Assistant`)에서 표시용 문자열로 변환됩니다.
//! `IndexMismatch`만 구조적 불변식 위반으로 그대로 전파됩니다.

use thiserror::Error;

/// 코어 Result 별칭
pub type AssistResult<T> = std::result::Result<T, AssistError>;

/// 어시스턴트 에러
#[derive(Error, Debug)]
pub enum AssistError {
    /// 아직 처리된 문서가 없음
    #[error("no document has been processed yet")]
    NoDocument,

    /// 지원하지 않는 확장자
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// 추출된 텍스트가 비어있음
    #[error("document has no usable content")]
    EmptyDocument,

    /// 요청한 작업을 하기에 텍스트가 너무 짧음
    #[error("document is shorter than {min_chars} characters")]
    DocumentTooShort { min_chars: usize },

    /// 퀴즈가 생성되기 전에 채점 요청
    #[error("no quiz has been generated for the current document")]
    NoQuiz,

    /// 모델 초기화 실패로 비활성화된 기능
    #[error("{0} model is not available")]
    ModelUnavailable(&'static str),

    /// 단일 모델 호출 실패
    #[error("inference failed: {0}")]
    Inference(String),

    /// 텍스트 추출 실패
    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 청크 수와 인덱스 벡터 수 불일치 (불변식 위반)
    #[error("index/chunk mismatch: {chunks} chunks vs {vectors} vectors")]
    IndexMismatch { chunks: usize, vectors: usize },
}

impl AssistError {
    /// anyhow 에러를 추론 실패로 변환
    pub fn inference(err: anyhow::Error) -> Self {
        AssistError::Inference(format!("{:#}", err))
    }

    /// 경계에서 문자열로 강등 가능한지 여부
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AssistError::IndexMismatch { .. })
    }

    /// 사용자 표시용 메시지
    pub fn user_message(&self) -> String {
        match self {
            AssistError::NoDocument => "Please upload a document first.".to_string(),
            AssistError::UnsupportedFormat(_) => "Unsupported file format.".to_string(),
            AssistError::EmptyDocument => {
                "Could not extract meaningful content from the document.".to_string()
            }
            AssistError::DocumentTooShort { .. } => {
                "Document is too short to process meaningfully.".to_string()
            }
            AssistError::NoQuiz => "No questions available for evaluation.".to_string(),
            AssistError::ModelUnavailable(capability) => {
                format!("The {} model is not available.", capability)
            }
            AssistError::Inference(msg) => format!("Error: {}", msg),
            AssistError::Extraction(msg) => format!("Error extracting text: {}", msg),
            AssistError::Io(_) => "File not found.".to_string(),
            AssistError::IndexMismatch { .. } => "Internal index error.".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_index_mismatch_is_fatal() {
        assert!(AssistError::NoDocument.is_recoverable());
        assert!(AssistError::NoQuiz.is_recoverable());
        assert!(AssistError::Inference("boom".to_string()).is_recoverable());
        assert!(!AssistError::IndexMismatch { chunks: 2, vectors: 3 }.is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AssistError::NoDocument.user_message(),
            "Please upload a document first."
        );
        assert_eq!(
            AssistError::UnsupportedFormat("docx".to_string()).user_message(),
            "Unsupported file format."
        );
        assert!(AssistError::ModelUnavailable("summarization")
            .user_message()
            .contains("summarization"));
    }

    #[test]
    fn test_inference_keeps_context_chain() {
        let err = anyhow::anyhow!("timeout").context("Gemini request failed");
        let converted = AssistError::inference(err);
        let text = converted.to_string();
        assert!(text.contains("Gemini request failed"));
        assert!(text.contains("timeout"));
    }
}
