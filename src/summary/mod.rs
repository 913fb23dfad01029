//! 문서 요약

use crate::config::SummaryConfig;
use crate::error::{AssistError, AssistResult};
use crate::models::{Models, SummaryLength};
use crate::text::truncate_with_ellipsis;

/// 문서 텍스트 요약
///
/// 공백 제거 후 `min_input_chars`보다 짧으면 모델을 호출하지 않습니다.
/// `max_input_chars`를 넘는 입력은 문자 단위로 잘라 `...`를 붙입니다.
pub async fn summarize(text: &str, models: &Models, config: &SummaryConfig) -> AssistResult<String> {
    if text.trim().chars().count() < config.min_input_chars {
        return Err(AssistError::DocumentTooShort {
            min_chars: config.min_input_chars,
        });
    }

    let summarizer = models.summarizer()?;
    let input = truncate_with_ellipsis(text, config.max_input_chars);
    let length = SummaryLength {
        min_words: config.min_words,
        max_words: config.max_words,
    };

    let summary = summarizer
        .summarize(&input, length)
        .await
        .map_err(AssistError::inference)?;

    tracing::debug!(
        "Summarized {} chars into {} words with {}",
        input.chars().count(),
        summary.split_whitespace().count(),
        summarizer.name()
    );
    Ok(summary)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Summarizer;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// 받은 입력을 기록하는 요약기
    #[derive(Default)]
    struct RecordingSummarizer {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
            self.inputs.lock().unwrap().push(text.to_string());
            Ok(format!("summary {}-{}", length.min_words, length.max_words))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_short_text_rejected_without_model_call() {
        let recorder = Arc::new(RecordingSummarizer::default());
        let models = Models::empty().with_summarizer(recorder.clone());

        let err = summarize("   too short   ", &models, &SummaryConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::DocumentTooShort { min_chars: 50 }));
        assert!(recorder.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_long_text_truncated() {
        let recorder = Arc::new(RecordingSummarizer::default());
        let models = Models::empty().with_summarizer(recorder.clone());
        let text = "word ".repeat(400);

        let summary = summarize(&text, &models, &SummaryConfig::default())
            .await
            .unwrap();
        assert_eq!(summary, "summary 100-150");

        let inputs = recorder.inputs.lock().unwrap();
        assert_eq!(inputs[0].chars().count(), 1003);
        assert!(inputs[0].ends_with("..."));
    }

    #[tokio::test]
    async fn test_missing_summarizer() {
        let text = "a".repeat(100);
        let err = summarize(&text, &Models::empty(), &SummaryConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::ModelUnavailable("summarization")));
    }

    #[tokio::test]
    async fn test_local_summary_is_bounded() {
        let text = "Rust guarantees memory safety. The borrow checker enforces ownership. \
                    Ownership rules prevent data races. Lifetimes track references. "
            .repeat(10);
        let config = SummaryConfig {
            max_words: 20,
            ..SummaryConfig::default()
        };
        let summary = summarize(&text, &Models::local(), &config).await.unwrap();
        assert!(!summary.is_empty());
        assert!(summary.split_whitespace().count() <= 20);
    }
}
