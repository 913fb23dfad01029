//! 답안 채점
//!
//! 사용자 답과 정답 키프레이즈의 임베딩 코사인 유사도로 채점하고,
//! 문서에서 정답을 뒷받침하는 문장을 찾아 근거로 붙입니다.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::GradingConfig;
use crate::embedding::{cosine_similarity, tokenize};
use crate::error::{AssistError, AssistResult};
use crate::models::Models;
use crate::text::period_sentences;

use super::QuizItem;

/// 정답 판정 임계값 (이상이면 정답)
pub const CORRECT_THRESHOLD: f32 = 0.6;

/// 정답 여부
pub fn passes_threshold(similarity: f32) -> bool {
    similarity >= CORRECT_THRESHOLD
}

// ============================================================================
// Types
// ============================================================================

/// 유사도 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    Excellent,
    Good,
    Partial,
    Poor,
}

impl MatchQuality {
    pub fn from_similarity(similarity: f32) -> Self {
        if similarity >= 0.8 {
            MatchQuality::Excellent
        } else if similarity >= CORRECT_THRESHOLD {
            MatchQuality::Good
        } else if similarity >= 0.4 {
            MatchQuality::Partial
        } else {
            MatchQuality::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchQuality::Excellent => "Excellent match!",
            MatchQuality::Good => "Good match!",
            MatchQuality::Partial => "Partial match.",
            MatchQuality::Poor => "Poor match.",
        }
    }
}

/// 문항별 채점 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    pub question: String,
    pub expected_answer: String,
    pub user_answer: String,
    pub is_correct: bool,
    /// 0.0 ~ 1.0
    pub similarity: f32,
    pub justification: String,
}

// ============================================================================
// AnswerGrader
// ============================================================================

/// 답안 채점기
pub struct AnswerGrader<'a> {
    models: &'a Models,
    config: &'a GradingConfig,
}

impl<'a> AnswerGrader<'a> {
    pub fn new(models: &'a Models, config: &'a GradingConfig) -> Self {
        Self { models, config }
    }

    /// 답안 키 순서대로 채점
    ///
    /// 답이 모자라면 빈 답으로 채점하고, 남는 답은 무시합니다.
    /// 한 문항의 실패는 해당 문항의 오답 결과로만 남습니다.
    pub async fn grade(
        &self,
        user_answers: &[String],
        answer_key: &[QuizItem],
        document: &str,
    ) -> AssistResult<Vec<GradeResult>> {
        if answer_key.is_empty() {
            return Err(AssistError::NoQuiz);
        }
        if user_answers.len() > answer_key.len() {
            tracing::warn!(
                "Ignoring {} extra answers",
                user_answers.len() - answer_key.len()
            );
        }

        let sentences = period_sentences(document, self.config.min_sentence_chars);
        let mut results = Vec::with_capacity(answer_key.len());

        for (i, item) in answer_key.iter().enumerate() {
            let user_answer = user_answers.get(i).map(String::as_str).unwrap_or_default();

            if user_answer.trim().is_empty() {
                results.push(unanswered(item, user_answer));
                continue;
            }

            let result = match self.grade_item(item, user_answer, &sentences).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Grading failed for '{}': {}", item.question, e);
                    GradeResult {
                        question: item.question.clone(),
                        expected_answer: item.expected_answer.clone(),
                        user_answer: user_answer.to_string(),
                        is_correct: false,
                        similarity: 0.0,
                        justification: format!(
                            "Your answer: {}\nExpected answer: {}\nError: Evaluation failed: {}",
                            user_answer,
                            item.expected_answer,
                            e.user_message()
                        ),
                    }
                }
            };
            results.push(result);
        }

        Ok(results)
    }

    async fn grade_item(
        &self,
        item: &QuizItem,
        user_answer: &str,
        sentences: &[String],
    ) -> AssistResult<GradeResult> {
        let embedder = self.models.embedder()?;
        let user_embedding = embedder
            .embed(user_answer)
            .await
            .map_err(AssistError::inference)?;
        let expected_embedding = embedder
            .embed(&item.expected_answer)
            .await
            .map_err(AssistError::inference)?;

        let similarity = cosine_similarity(&user_embedding, &expected_embedding).clamp(0.0, 1.0);
        let quality = MatchQuality::from_similarity(similarity);

        let mut justification = self
            .justification(sentences, &item.expected_answer, user_answer)
            .await;
        justification.push_str(&format!(
            "\n\nSimilarity Score: {:.2} - {}",
            similarity,
            quality.label()
        ));

        Ok(GradeResult {
            question: item.question.clone(),
            expected_answer: item.expected_answer.clone(),
            user_answer: user_answer.to_string(),
            is_correct: passes_threshold(similarity),
            similarity,
            justification,
        })
    }

    /// 근거 문장 인용
    async fn justification(&self, sentences: &[String], expected: &str, user_answer: &str) -> String {
        match self.supporting_sentences(sentences, expected).await {
            Ok(found) if !found.is_empty() => {
                let quoted = found
                    .iter()
                    .enumerate()
                    .map(|(i, s)| format!("{}. {}.", i + 1, s.trim()))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "Context from document:\n{}\n\nExpected answer: {}\nYour answer: {}",
                    quoted, expected, user_answer
                )
            }
            Ok(_) => format!(
                "Your answer: {}\nExpected answer: {}\nNote: Specific context not found in document",
                user_answer, expected
            ),
            Err(e) => format!(
                "Your answer: {}\nExpected answer: {}\nError: Could not extract justification: {}",
                user_answer,
                expected,
                e.user_message()
            ),
        }
    }

    /// 세 단계로 근거 문장 탐색: 부분 문자열 → 단어 겹침 → 임베딩 유사도
    async fn supporting_sentences(&self, sentences: &[String], expected: &str) -> AssistResult<Vec<String>> {
        let limit = self.config.max_context_sentences;

        let expected_lower = expected.to_lowercase();
        let substring: Vec<String> = sentences
            .iter()
            .filter(|s| s.to_lowercase().contains(&expected_lower))
            .take(limit)
            .cloned()
            .collect();
        if !substring.is_empty() {
            return Ok(substring);
        }

        let expected_words: HashSet<String> = tokenize(expected).into_iter().collect();
        let overlapping: Vec<String> = sentences
            .iter()
            .filter(|s| tokenize(s).iter().any(|w| expected_words.contains(w)))
            .take(limit)
            .cloned()
            .collect();
        if !overlapping.is_empty() {
            return Ok(overlapping);
        }

        if sentences.is_empty() {
            return Ok(vec![]);
        }

        let embedder = self.models.embedder()?;
        let expected_embedding = embedder
            .embed(expected)
            .await
            .map_err(AssistError::inference)?;
        let sentence_embeddings = embedder
            .embed_batch(sentences)
            .await
            .map_err(AssistError::inference)?;

        let mut ranked: Vec<(usize, f32)> = sentence_embeddings
            .iter()
            .map(|e| cosine_similarity(&expected_embedding, e))
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(ranked
            .into_iter()
            .take(limit)
            .filter(|&(_, score)| score > self.config.min_context_similarity)
            .map(|(i, _)| sentences[i].clone())
            .collect())
    }
}

/// 빈 답: 모델 호출 없이 오답 처리
fn unanswered(item: &QuizItem, user_answer: &str) -> GradeResult {
    GradeResult {
        question: item.question.clone(),
        expected_answer: item.expected_answer.clone(),
        user_answer: user_answer.to_string(),
        is_correct: false,
        similarity: 0.0,
        justification: format!(
            "No answer provided.\nExpected answer: {}\nHint: Try to provide an answer based on the document content.",
            item.expected_answer
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingProvider, HashingEmbedding};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 정해진 텍스트에 정해진 벡터를 돌려주는 임베더 (호출 수 기록)
    struct TableEmbedding {
        table: Vec<(&'static str, Vec<f32>)>,
        calls: AtomicUsize,
    }

    impl TableEmbedding {
        fn new(table: Vec<(&'static str, Vec<f32>)>) -> Self {
            Self {
                table,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| anyhow::anyhow!("no vector for {}", text))
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    fn key() -> Vec<QuizItem> {
        vec![QuizItem::new("What is mitosis?", "mitosis")]
    }

    const DOC: &str = "Cells divide by mitosis in the body. Plants need light to grow.";

    #[test]
    fn test_threshold_boundary() {
        assert!(passes_threshold(0.6));
        assert!(!passes_threshold(0.5999));
        assert_eq!(MatchQuality::from_similarity(0.8), MatchQuality::Excellent);
        assert_eq!(MatchQuality::from_similarity(0.6), MatchQuality::Good);
        assert_eq!(MatchQuality::from_similarity(0.45), MatchQuality::Partial);
        assert_eq!(MatchQuality::from_similarity(0.1), MatchQuality::Poor);
    }

    #[tokio::test]
    async fn test_similarity_exactly_at_threshold_is_correct() {
        let embedder = Arc::new(TableEmbedding::new(vec![
            ("mitosis", vec![1.0, 0.0]),
            ("cell division", vec![0.6, 0.8]),
        ]));
        let models = Models::empty().with_embedder(embedder);
        let config = GradingConfig::default();

        let results = AnswerGrader::new(&models, &config)
            .grade(&["cell division".to_string()], &key(), DOC)
            .await
            .unwrap();

        assert!((results[0].similarity - 0.6).abs() < 1e-6);
        assert!(results[0].is_correct);
        assert!(results[0].justification.contains("Good match!"));
        assert!(results[0].justification.contains("Cells divide by mitosis in the body."));
    }

    #[tokio::test]
    async fn test_empty_answer_skips_model() {
        let embedder = Arc::new(TableEmbedding::new(vec![]));
        let models = Models::empty().with_embedder(embedder.clone());
        let config = GradingConfig::default();

        let results = AnswerGrader::new(&models, &config)
            .grade(&["   \t".to_string()], &key(), DOC)
            .await
            .unwrap();

        assert_eq!(results[0].similarity, 0.0);
        assert!(!results[0].is_correct);
        assert!(results[0].justification.contains("No answer provided"));
        assert!(results[0].justification.contains("mitosis"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_answers_graded_empty_and_extra_ignored() {
        let models = Models::local();
        let config = GradingConfig::default();
        let answer_key = vec![
            QuizItem::new("Q1?", "mitosis"),
            QuizItem::new("Q2?", "light"),
        ];

        let short = AnswerGrader::new(&models, &config)
            .grade(&["mitosis".to_string()], &answer_key, DOC)
            .await
            .unwrap();
        assert_eq!(short.len(), 2);
        assert!(short[0].is_correct);
        assert!(!short[1].is_correct);
        assert_eq!(short[1].user_answer, "");

        let long = AnswerGrader::new(&models, &config)
            .grade(
                &["mitosis".to_string(), "light".to_string(), "extra".to_string()],
                &answer_key,
                DOC,
            )
            .await
            .unwrap();
        assert_eq!(long.len(), 2);
    }

    #[tokio::test]
    async fn test_item_failure_does_not_abort_batch() {
        // "unknown"에 대한 벡터가 없어 첫 문항만 실패
        let embedder = Arc::new(TableEmbedding::new(vec![
            ("mitosis", vec![1.0, 0.0]),
            ("light", vec![0.0, 1.0]),
        ]));
        let models = Models::empty().with_embedder(embedder);
        let config = GradingConfig::default();
        let answer_key = vec![
            QuizItem::new("Q1?", "mitosis"),
            QuizItem::new("Q2?", "light"),
        ];

        let results = AnswerGrader::new(&models, &config)
            .grade(&["unknown".to_string(), "light".to_string()], &answer_key, DOC)
            .await
            .unwrap();

        assert!(!results[0].is_correct);
        assert!(results[0].justification.contains("Evaluation failed"));
        assert!(results[1].is_correct);
        assert!((results[1].similarity - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_no_quiz() {
        let models = Models::local();
        let config = GradingConfig::default();
        let err = AnswerGrader::new(&models, &config)
            .grade(&["a".to_string()], &[], DOC)
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::NoQuiz));
    }

    #[tokio::test]
    async fn test_justification_strategies() {
        let embedder = Arc::new(TableEmbedding::new(vec![
            ("Cells divide by mitosis in the body", vec![0.0, 1.0]),
            ("Plants need light to grow", vec![0.9, 0.1]),
            ("photosynthesis", vec![1.0, 0.0]),
            ("quantum", vec![-1.0, 0.0]),
        ]));
        let models = Models::empty().with_embedder(embedder);
        let config = GradingConfig::default();
        let grader = AnswerGrader::new(&models, &config);
        let sentences = period_sentences(
            "Cells divide by mitosis in the body. Plants need light to grow. Short",
            10,
        );

        let substring = grader.supporting_sentences(&sentences, "MITOSIS").await.unwrap();
        assert_eq!(substring, vec!["Cells divide by mitosis in the body"]);

        let overlap = grader
            .supporting_sentences(&sentences, "grow quickly")
            .await
            .unwrap();
        assert_eq!(overlap, vec!["Plants need light to grow"]);

        // 의미 유사도 0.3 초과만 인용
        let semantic = grader
            .supporting_sentences(&sentences, "photosynthesis")
            .await
            .unwrap();
        assert_eq!(semantic, vec!["Plants need light to grow"]);

        let none = grader.supporting_sentences(&sentences, "quantum").await.unwrap();
        assert!(none.is_empty());

        let text = grader.justification(&sentences, "quantum", "atoms").await;
        assert!(text.contains("Specific context not found"));
    }

    #[tokio::test]
    async fn test_identical_answer_is_excellent() {
        let models = Models::empty().with_embedder(Arc::new(HashingEmbedding::new()));
        let config = GradingConfig::default();
        let results = AnswerGrader::new(&models, &config)
            .grade(&["Mitosis".to_string()], &key(), DOC)
            .await
            .unwrap();
        assert!(results[0].is_correct);
        assert!(results[0].justification.contains("Similarity Score: 1.00 - Excellent match!"));
    }
}
