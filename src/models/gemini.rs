//! Gemini 기반 모델 구현
//!
//! 모두 `GeminiClient::generate`를 사용하며 프롬프트만 다릅니다.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ExtractiveQa, GenerationParams, QuestionGenerator, SummaryLength, Summarizer};
use crate::gemini::{GenerationConfig, GeminiClient};

const QA_PROMPT: &str = "Answer the question using only a short span copied verbatim from the context. \
Reply with the span only.";

const SUMMARY_PROMPT: &str = "Summarize the following text in plain prose.";

const QUESTION_PROMPT: &str = "Write one question about the context whose answer is the given answer. \
Reply with the question only.";

/// 요약 단어 수를 출력 토큰 상한으로 환산 (단어당 약 2토큰)
fn summary_token_budget(length: SummaryLength) -> u32 {
    (length.max_words.saturating_mul(2)).clamp(64, 1024) as u32
}

/// 디코딩 파라미터 → Gemini 생성 설정
///
/// 샘플링을 끄면 temperature 0으로 결정적 생성을 요청합니다.
/// 빔 수는 Gemini API에 대응 항목이 없어 무시됩니다.
pub fn generation_config(params: &GenerationParams) -> GenerationConfig {
    GenerationConfig {
        temperature: if params.do_sample {
            params.temperature
        } else {
            0.0
        },
        max_output_tokens: params.max_length,
    }
}

fn qa_prompt(question: &str, context: &str) -> String {
    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}\nAnswer:",
        QA_PROMPT, context, question
    )
}

fn summary_prompt(text: &str, length: SummaryLength) -> String {
    format!(
        "{} Use between {} and {} words.\n\n{}",
        SUMMARY_PROMPT, length.min_words, length.max_words, text
    )
}

fn question_prompt(context: &str, answer: &str) -> String {
    format!(
        "{}\n\nanswer: {}\ncontext: {}\nQuestion:",
        QUESTION_PROMPT, answer, context
    )
}

// ============================================================================
// GeminiQa
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiQa {
    client: GeminiClient,
}

impl GeminiQa {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractiveQa for GeminiQa {
    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        self.client
            .generate(&qa_prompt(question, context), GenerationConfig::default())
            .await
            .context("Gemini question answering failed")
    }

    fn name(&self) -> &str {
        "gemini-qa"
    }
}

// ============================================================================
// GeminiSummarizer
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    client: GeminiClient,
}

impl GeminiSummarizer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
        let config = GenerationConfig {
            temperature: 0.0,
            max_output_tokens: summary_token_budget(length),
        };
        self.client
            .generate(&summary_prompt(text, length), config)
            .await
            .context("Gemini summarization failed")
    }

    fn name(&self) -> &str {
        "gemini-summarizer"
    }
}

// ============================================================================
// GeminiQuestionGenerator
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiQuestionGenerator {
    client: GeminiClient,
}

impl GeminiQuestionGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuestionGenerator for GeminiQuestionGenerator {
    async fn generate(
        &self,
        context: &str,
        answer: &str,
        params: &GenerationParams,
    ) -> Result<String> {
        tracing::debug!(
            "Generating question (beams={}, sample={})",
            params.num_beams,
            params.do_sample
        );
        self.client
            .generate(&question_prompt(context, answer), generation_config(params))
            .await
            .context("Gemini question generation failed")
    }

    fn name(&self) -> &str {
        "gemini-question-generator"
    }
}

// ============================================================================
// Tests
// ============================================================================
