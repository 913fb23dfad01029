//! 퀴즈 모듈 - 문항 출제와 답안 채점
//!
//! - Generator: 키프레이즈 추출 → 세그먼트별 문항 생성 → 중복 시 템플릿 대체
//! - Grader: 임베딩 유사도 채점 + 문서 근거 문장 인용

mod generator;
mod grader;

use serde::{Deserialize, Serialize};

use crate::config::QuizConfig;
use crate::error::AssistResult;
use crate::models::Models;

pub use generator::{
    context_segments, fallback_question, select_diverse_phrases, QuizGenerator,
    FALLBACK_TEMPLATES, GENERATION_PARAMS,
};
pub use grader::{passes_threshold, AnswerGrader, GradeResult, MatchQuality, CORRECT_THRESHOLD};

/// 문서 텍스트로 퀴즈 생성
///
/// 세션의 답안 키 교체는 호출 측(`Assistant`)이 담당합니다.
pub async fn generate_quiz(text: &str, models: &Models, config: &QuizConfig) -> AssistResult<Vec<QuizItem>> {
    QuizGenerator::new(models, config).generate(text).await
}

/// 출제 문항 + 정답 (답안 키)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    /// 정답으로 쓰이는 키프레이즈
    pub expected_answer: String,
}

impl QuizItem {
    pub fn new(question: impl Into<String>, expected_answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            expected_answer: expected_answer.into(),
        }
    }
}

/// 사용자에게 보여주는 문항 (정답 제외)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
}

impl From<&QuizItem> for QuizQuestion {
    fn from(item: &QuizItem) -> Self {
        Self {
            question: item.question.clone(),
        }
    }
}
