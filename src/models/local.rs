//! 로컬 모델 구현
//!
//! 네트워크 없이 동작하는 결정적 휴리스틱입니다.
//! - `OverlapQa`: 질문 단어와 가장 많이 겹치는 문장을 답으로 선택
//! - `FrequencySummarizer`: 단어 빈도 점수가 높은 문장을 원래 순서대로 이어붙임
//! - `EmbeddingKeyphrases`: n-gram 후보를 문서 임베딩과 비교하고 MMR로 다양화

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ExtractiveQa, KeyphraseExtractor, KeyphraseParams, ScoredPhrase, SummaryLength, Summarizer};
use crate::embedding::{cosine_similarity, tokenize, EmbeddingProvider};
use crate::text::{content_words, is_stopword, split_sentences};

// ============================================================================
// OverlapQa
// ============================================================================

/// 단어 겹침 기반 추출형 QA
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapQa;

#[async_trait]
impl ExtractiveQa for OverlapQa {
    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let sentences = split_sentences(context);
        if sentences.is_empty() {
            anyhow::bail!("Context is empty");
        }

        let question_words: HashSet<String> = content_words(question).into_iter().collect();

        let mut best_idx = 0;
        let mut best_score = 0.0f32;

        for (i, sentence) in sentences.iter().enumerate() {
            if question_words.is_empty() {
                break;
            }
            let words: HashSet<String> = content_words(sentence).into_iter().collect();
            let overlap = question_words.intersection(&words).count();
            let score = overlap as f32 / question_words.len() as f32;

            // 동점이면 앞 문장 유지
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
        }

        tracing::debug!("OverlapQa picked sentence {} (score {:.2})", best_idx, best_score);
        Ok(sentences[best_idx].clone())
    }

    fn name(&self) -> &str {
        "overlap-qa"
    }
}

// ============================================================================
// FrequencySummarizer
// ============================================================================

/// 단어 빈도 기반 추출 요약
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencySummarizer;

#[async_trait]
impl Summarizer for FrequencySummarizer {
    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            anyhow::bail!("Nothing to summarize");
        }

        let mut freq: HashMap<String, f32> = HashMap::new();
        for word in content_words(text) {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        // 문장 점수 = 내용어 빈도 합 / 문장 길이
        let mut ranked: Vec<(usize, f32)> = sentences
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let words = content_words(s);
                let score = if words.is_empty() {
                    0.0
                } else {
                    words.iter().map(|w| freq.get(w).copied().unwrap_or(0.0)).sum::<f32>()
                        / words.len() as f32
                };
                (i, score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        // 최소 단어 수까지는 순위대로 채우고, 그 뒤로는 최대치를 넘지 않는 문장만 추가
        let mut chosen = Vec::new();
        let mut word_count = 0;
        for (i, _) in ranked {
            let n = sentences[i].split_whitespace().count();
            if word_count >= length.min_words && word_count + n > length.max_words {
                continue;
            }
            word_count += n;
            chosen.push(i);
            if word_count >= length.max_words {
                break;
            }
        }
        chosen.sort_unstable();

        let joined = chosen
            .iter()
            .map(|&i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let words: Vec<&str> = joined.split_whitespace().collect();
        if words.len() > length.max_words {
            Ok(words[..length.max_words].join(" "))
        } else {
            Ok(joined)
        }
    }

    fn name(&self) -> &str {
        "frequency-summarizer"
    }
}

// ============================================================================
// EmbeddingKeyphrases
// ============================================================================

/// 임베딩 유사도 기반 키프레이즈 추출기
///
/// 불용어로 끊기지 않는 1~N 단어 후보를 만들고, 문서 임베딩과의 코사인
/// 유사도를 관련도로 씁니다. `diversity > 0`이면 MMR로 선택합니다.
pub struct EmbeddingKeyphrases {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingKeyphrases {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl KeyphraseExtractor for EmbeddingKeyphrases {
    async fn extract(&self, text: &str, params: KeyphraseParams) -> Result<Vec<ScoredPhrase>> {
        let candidates = candidate_phrases(text, params.max_ngram.max(1));
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let doc_embedding = self
            .embedder
            .embed(text)
            .await
            .context("Failed to embed document for keyphrase scoring")?;
        let candidate_embeddings = self
            .embedder
            .embed_batch(&candidates)
            .await
            .context("Failed to embed keyphrase candidates")?;

        let scores: Vec<f32> = candidate_embeddings
            .iter()
            .map(|e| cosine_similarity(&doc_embedding, e))
            .collect();

        let selected = if params.diversity > 0.0 {
            mmr_select(&scores, &candidate_embeddings, params.top_n, params.diversity)
        } else {
            top_by_score(&scores, params.top_n)
        };

        Ok(selected
            .into_iter()
            .map(|i| ScoredPhrase::new(candidates[i].clone(), scores[i]))
            .collect())
    }

    fn name(&self) -> &str {
        "embedding-keyphrases"
    }
}

/// 불용어/짧은 토큰에서 끊기는 1~max_ngram 단어 후보 (첫 등장 순서)
fn candidate_phrases(text: &str, max_ngram: usize) -> Vec<String> {
    let mut runs: Vec<Vec<String>> = vec![Vec::new()];
    for token in tokenize(text) {
        if is_stopword(&token) || token.chars().count() < 2 {
            runs.push(Vec::new());
        } else if let Some(run) = runs.last_mut() {
            run.push(token);
        }
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for run in runs.iter().filter(|r| !r.is_empty()) {
        for n in 1..=max_ngram {
            for window in run.windows(n) {
                let phrase = window.join(" ");
                if seen.insert(phrase.clone()) {
                    candidates.push(phrase);
                }
            }
        }
    }
    candidates
}

fn top_by_score(scores: &[f32], top_n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(top_n);
    order
}

/// Maximal Marginal Relevance 선택
///
/// mmr = (1 - diversity) * 문서 유사도 - diversity * max(선택된 후보와의 유사도)
fn mmr_select(scores: &[f32], embeddings: &[Vec<f32>], top_n: usize, diversity: f32) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..scores.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(top_n);

    while selected.len() < top_n && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_value = f32::NEG_INFINITY;

        for (pos, &candidate) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(&embeddings[candidate], &embeddings[s]))
                .fold(0.0f32, f32::max);
            let value = if selected.is_empty() {
                scores[candidate]
            } else {
                (1.0 - diversity) * scores[candidate] - diversity * redundancy
            };
            if value > best_value {
                best_value = value;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    selected
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedding;

    #[tokio::test]
    async fn test_overlap_qa_picks_matching_sentence() {
        let context = "The sky is blue.\nMitochondria produce energy for the cell.\nRivers flow downhill.";
        let answer = OverlapQa
            .answer("What do mitochondria produce?", context)
            .await
            .unwrap();
        assert_eq!(answer, "Mitochondria produce energy for the cell.");
    }

    #[tokio::test]
    async fn test_overlap_qa_empty_context_fails() {
        assert!(OverlapQa.answer("anything?", "   ").await.is_err());
    }

    #[tokio::test]
    async fn test_frequency_summarizer_respects_max_words() {
        let text = "Rust is fast. Rust is safe. Rust has ownership. Cats sleep a lot. \
                    Ownership makes Rust memory safe without a garbage collector.";
        let summary = FrequencySummarizer
            .summarize(
                text,
                SummaryLength {
                    min_words: 3,
                    max_words: 8,
                },
            )
            .await
            .unwrap();
        assert!(summary.split_whitespace().count() <= 8);
        assert!(summary.contains("Rust"));
    }

    #[tokio::test]
    async fn test_frequency_summarizer_reaches_min_words() {
        let text = "Rust is fast. Rust is safe. Rust has ownership. Cats sleep a lot. \
                    Ownership makes Rust memory safe without a garbage collector.";
        let summary = FrequencySummarizer
            .summarize(
                text,
                SummaryLength {
                    min_words: 5,
                    max_words: 8,
                },
            )
            .await
            .unwrap();
        let count = summary.split_whitespace().count();
        assert!((5..=8).contains(&count), "{} words: {}", count, summary);

        // 텍스트 전체가 최소보다 짧으면 전부 반환
        let short = FrequencySummarizer
            .summarize(
                "Rust is fast.",
                SummaryLength {
                    min_words: 10,
                    max_words: 20,
                },
            )
            .await
            .unwrap();
        assert_eq!(short, "Rust is fast.");
    }

    #[test]
    fn test_candidate_phrases_break_on_stopwords() {
        let candidates = candidate_phrases("The neural network and the gradient descent", 3);
        assert!(candidates.contains(&"neural network".to_string()));
        assert!(candidates.contains(&"gradient descent".to_string()));
        assert!(!candidates.iter().any(|c| c.contains("and")));
        assert!(!candidates.contains(&"network gradient".to_string()));
    }

    #[test]
    fn test_mmr_prefers_diverse_candidates() {
        // 0과 1은 같은 방향, 2는 다른 방향
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let scores = vec![0.9, 0.85, 0.5];

        let diverse = mmr_select(&scores, &embeddings, 2, 0.7);
        assert_eq!(diverse, vec![0, 2]);

        let plain = top_by_score(&scores, 2);
        assert_eq!(plain, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_keyphrases_scored_against_document() {
        let extractor = EmbeddingKeyphrases::new(Arc::new(HashingEmbedding::new()));
        let text = "Photosynthesis converts light. Photosynthesis happens in chloroplasts. \
                    Chloroplasts contain chlorophyll.";
        let phrases = extractor
            .extract(text, KeyphraseParams::default())
            .await
            .unwrap();

        assert!(!phrases.is_empty());
        assert!(phrases.len() <= 10);
        assert!(phrases.iter().all(|p| (-1.0..=1.0).contains(&p.score)));
        assert!(phrases.iter().any(|p| p.phrase.contains("photosynthesis")));
    }
}
