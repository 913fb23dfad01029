//! 퀴즈 문항 생성

use std::collections::HashSet;

use crate::config::QuizConfig;
use crate::error::{AssistError, AssistResult};
use crate::models::{GenerationParams, KeyphraseParams, Models, QuestionGenerator, ScoredPhrase};
use crate::text::{char_window, take_chars, truncate_with_ellipsis};

use super::QuizItem;

/// 대체 문항 템플릿 (`{}` 자리에 키프레이즈)
pub const FALLBACK_TEMPLATES: [&str; 8] = [
    "What is {}?",
    "How would you define {}?",
    "Explain the concept of {}.",
    "What does {} refer to?",
    "Describe {} in your own words.",
    "What is the significance of {}?",
    "How is {} used in this context?",
    "What are the key characteristics of {}?",
];

/// 문항별 디코딩 파라미터 (i mod 3)
pub const GENERATION_PARAMS: [GenerationParams; 3] = [
    GenerationParams {
        max_length: 64,
        num_beams: 4,
        do_sample: false,
        temperature: 1.0,
    },
    GenerationParams {
        max_length: 72,
        num_beams: 3,
        do_sample: true,
        temperature: 0.8,
    },
    GenerationParams {
        max_length: 56,
        num_beams: 5,
        do_sample: true,
        temperature: 1.2,
    },
];

/// 세그먼트가 부족할 때 쓰는 고정 문자 창 `[start, end)`
const FALLBACK_WINDOWS: [(usize, usize); 3] = [(0, 800), (400, 1200), (800, 1600)];

/// 템플릿 `index mod 8`로 문항 생성
pub fn fallback_question(phrase: &str, index: usize) -> String {
    FALLBACK_TEMPLATES[index % FALLBACK_TEMPLATES.len()].replace("{}", phrase)
}

/// 점수 필터 + 어휘 다양성 선택
///
/// `min_score`를 넘는 구문 중, 이미 고른 구문과 단어가 겹치면 건너뜁니다.
/// 단 처음 두 개는 겹쳐도 받아들입니다.
pub fn select_diverse_phrases(phrases: &[ScoredPhrase], min_score: f32, max: usize) -> Vec<String> {
    let mut selected = Vec::new();
    let mut seen_words: HashSet<String> = HashSet::new();

    for candidate in phrases.iter().filter(|p| p.score > min_score) {
        if selected.len() >= max {
            break;
        }

        let words: HashSet<String> = candidate
            .phrase
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        if words.is_disjoint(&seen_words) || selected.len() < 2 {
            selected.push(candidate.phrase.clone());
            seen_words.extend(words);
        }
    }

    selected
}

/// 문서를 문장 경계 기준 3개 세그먼트로 분할
///
/// 비어있지 않은 세그먼트가 3개 미만이면 고정 문자 창으로 대체합니다.
pub fn context_segments(text: &str) -> Vec<String> {
    let sentences: Vec<&str> = text.split('.').collect();
    let segment_size = sentences.len() / 3;

    let segments: Vec<String> = (0..3)
        .filter_map(|i| {
            let start = i * segment_size;
            let end = if i < 2 {
                (i + 1) * segment_size
            } else {
                sentences.len()
            };
            let segment = sentences[start..end].join(". ").trim().to_string();
            (!segment.is_empty()).then_some(segment)
        })
        .collect();

    if segments.len() >= 3 {
        return segments;
    }

    let windows: Vec<String> = FALLBACK_WINDOWS
        .iter()
        .map(|&(start, end)| char_window(text, start, end).to_string())
        .filter(|w| !w.trim().is_empty())
        .collect();

    if windows.is_empty() {
        vec![text.to_string()]
    } else {
        windows
    }
}

// ============================================================================
// QuizGenerator
// ============================================================================

/// 퀴즈 생성기
pub struct QuizGenerator<'a> {
    models: &'a Models,
    config: &'a QuizConfig,
}

impl<'a> QuizGenerator<'a> {
    pub fn new(models: &'a Models, config: &'a QuizConfig) -> Self {
        Self { models, config }
    }

    /// 문서 텍스트로 퀴즈 생성
    pub async fn generate(&self, text: &str) -> AssistResult<Vec<QuizItem>> {
        if text.trim().chars().count() < self.config.min_input_chars {
            return Err(AssistError::DocumentTooShort {
                min_chars: self.config.min_input_chars,
            });
        }

        let context = truncate_with_ellipsis(text, self.config.max_input_chars);

        let params = KeyphraseParams {
            top_n: self.config.candidate_phrases,
            diversity: self.config.diversity,
            ..KeyphraseParams::default()
        };
        let raw_phrases = self
            .models
            .keyphrases()?
            .extract(&context, params)
            .await
            .map_err(AssistError::inference)?;

        let phrases = select_diverse_phrases(
            &raw_phrases,
            self.config.min_phrase_score,
            self.config.max_phrases,
        );
        tracing::info!(
            "Selected {} of {} key phrases: {:?}",
            phrases.len(),
            raw_phrases.len(),
            phrases
        );

        match self.models.question_generator() {
            Some(generator) if !phrases.is_empty() => {
                Ok(self.generate_with_model(generator, &context, &phrases).await)
            }
            _ => {
                tracing::warn!("Falling back to template questions");
                self.template_quiz(&raw_phrases)
            }
        }
    }

    /// 모델로 문항 생성 (실패/중복 시 템플릿 대체)
    async fn generate_with_model(
        &self,
        generator: &dyn QuestionGenerator,
        context: &str,
        phrases: &[String],
    ) -> Vec<QuizItem> {
        let segments = context_segments(context);
        let mut items: Vec<QuizItem> = Vec::new();

        for (i, phrase) in phrases.iter().take(self.config.question_count).enumerate() {
            let segment = take_chars(&segments[i % segments.len()], self.config.segment_chars);
            let params = &GENERATION_PARAMS[i % GENERATION_PARAMS.len()];

            let generated = match generator.generate(segment, phrase, params).await {
                Ok(raw) => normalize_question(&raw),
                Err(e) => {
                    tracing::warn!("Question generation failed for '{}': {:#}", phrase, e);
                    None
                }
            };

            let question = match generated {
                Some(q) if !is_duplicate(&items, &q) => q,
                Some(q) => {
                    tracing::debug!("Duplicate question replaced: {}", q);
                    match unique_fallback(&items, phrase, i) {
                        Some(q) => q,
                        None => continue,
                    }
                }
                None => match unique_fallback(&items, phrase, i) {
                    Some(q) => q,
                    None => continue,
                },
            };

            items.push(QuizItem::new(question, phrase.clone()));
        }

        items
    }

    /// 템플릿만으로 문항 생성 (템플릿 `2i mod 8`)
    fn template_quiz(&self, raw_phrases: &[ScoredPhrase]) -> AssistResult<Vec<QuizItem>> {
        let mut items: Vec<QuizItem> = Vec::new();

        for (i, phrase) in raw_phrases
            .iter()
            .take(self.config.question_count)
            .enumerate()
        {
            if let Some(question) = unique_fallback(&items, &phrase.phrase, i * 2) {
                items.push(QuizItem::new(question, phrase.phrase.clone()));
            }
        }

        if items.is_empty() {
            return Err(AssistError::EmptyDocument);
        }
        Ok(items)
    }
}

/// 트림 + 물음표 보정 (빈 출력은 None)
fn normalize_question(raw: &str) -> Option<String> {
    let question = raw.trim();
    if question.is_empty() {
        return None;
    }
    if question.ends_with('?') {
        Some(question.to_string())
    } else {
        Some(format!("{}?", question))
    }
}

fn is_duplicate(items: &[QuizItem], question: &str) -> bool {
    items.iter().any(|item| item.question == question)
}

/// `start`번 템플릿부터 순서대로, 아직 없는 문항을 찾음
fn unique_fallback(items: &[QuizItem], phrase: &str, start: usize) -> Option<String> {
    (0..FALLBACK_TEMPLATES.len())
        .map(|offset| fallback_question(phrase, start + offset))
        .find(|q| !is_duplicate(items, q))
}

// ============================================================================
// Tests
// ============================================================================
