//! 텍스트 유틸리티
//!
//! 문자 단위 자르기, 문장 분리, 불용어 처리.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::embedding::tokenize;

/// 영어 불용어
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "etc", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is",
    "it", "its", "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself",
    "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "same", "shall", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
    "they", "this", "those", "through", "thus", "to", "too", "under", "until", "up", "upon",
    "us", "very", "was", "we", "were", "what", "when", "where", "whether", "which", "while",
    "who", "whom", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// 불용어 여부
pub fn is_stopword(word: &str) -> bool {
    stopword_set().contains(word)
}

/// 불용어를 제외한 소문자 토큰
pub fn content_words(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .collect()
}

/// 앞에서부터 `max_chars` 문자만 남김 (UTF-8 안전)
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// 문자 범위 `[start, end)` 슬라이스 (UTF-8 안전, 범위 밖이면 빈 문자열)
pub fn char_window(text: &str, start: usize, end: usize) -> &str {
    let rest = match text.char_indices().nth(start) {
        Some((byte_idx, _)) => &text[byte_idx..],
        None => return "",
    };
    take_chars(rest, end.saturating_sub(start))
}

/// `max_chars`를 넘으면 잘라내고 `...`를 붙임
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let head = take_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// 종결 부호(. ! ?) 또는 줄바꿈 기준 문장 분리
pub fn split_sentences(text: &str) -> Vec<String> {
    static SENTENCE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SENTENCE_RE.get_or_init(|| {
        Regex::new(r"[^.!?\n]+[.!?]*").expect("sentence regex is valid")
    });

    re.find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect()
}

/// 마침표 기준 분리 후, `min_chars`보다 긴 조각만 유지
pub fn period_sentences(text: &str, min_chars: usize) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > min_chars)
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_chars_unicode() {
        assert_eq!(take_chars("안녕하세요 세계", 5), "안녕하세요");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("abc", 0), "");
    }

    #[test]
    fn test_char_window() {
        let text = "0123456789";
        assert_eq!(char_window(text, 2, 5), "234");
        assert_eq!(char_window(text, 8, 20), "89");
        assert_eq!(char_window(text, 20, 30), "");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello world", 5), "hello...");
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("First one. Second one? Third!\nFourth line");
        assert_eq!(
            sentences,
            vec!["First one.", "Second one?", "Third!", "Fourth line"]
        );
        assert!(split_sentences(" ... ").is_empty());
    }

    #[test]
    fn test_period_sentences_filters_short_fragments() {
        let text = "Short. This sentence is long enough. Tiny";
        assert_eq!(period_sentences(text, 10), vec!["This sentence is long enough"]);
    }

    #[test]
    fn test_content_words() {
        assert_eq!(
            content_words("What is the role of mitochondria?"),
            vec!["role", "mitochondria"]
        );
    }
}
