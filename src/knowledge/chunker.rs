//! Text Chunking Module
//!
//! 줄 단위 문단 분할을 제공합니다.
//! 번호 붙은 제목 줄("1. Introduction")을 섹션 경계로 인식하고,
//! 나머지 비어있지 않은 줄을 하나의 청크로 만듭니다.

use serde::{Deserialize, Serialize};

// ============================================================================
// Chunk
// ============================================================================

/// 문단 청크
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 소속 섹션 제목 (첫 제목 이전이면 None)
    pub section: Option<String>,
    /// 섹션 내 문단 번호 (1부터)
    pub paragraph_number: usize,
    pub text: String,
}

impl Chunk {
    /// 사용자 표시용 섹션 이름
    pub fn section_label(&self) -> &str {
        self.section.as_deref().unwrap_or("Unknown")
    }
}

// ============================================================================
// Section Detection
// ============================================================================

/// 섹션 제목 판별 전략
pub trait SectionDetector: Send + Sync {
    /// 트림된 줄이 섹션 제목인지 판별
    fn is_heading(&self, line: &str) -> bool;
}

/// 번호 제목 판별: 첫 글자가 숫자이고 앞 5글자 안에 `.`이 있음
///
/// "1. Intro", "2.3 Methods"는 제목, "2023 was a year."는 본문입니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedHeading;

impl SectionDetector for NumberedHeading {
    fn is_heading(&self, line: &str) -> bool {
        let starts_with_digit = line.chars().next().is_some_and(|c| c.is_ascii_digit());
        starts_with_digit && line.chars().take(5).any(|c| c == '.')
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<Chunk>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// SectionChunker
// ============================================================================

/// 섹션 인식 줄 단위 청커
pub struct SectionChunker<D: SectionDetector = NumberedHeading> {
    detector: D,
}

impl SectionChunker<NumberedHeading> {
    /// 번호 제목 판별기로 생성
    pub fn with_defaults() -> Self {
        Self::new(NumberedHeading)
    }
}

impl<D: SectionDetector> SectionChunker<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }
}

impl<D: SectionDetector> Chunker for SectionChunker<D> {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut section: Option<String> = None;
        let mut paragraph_number = 0;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if self.detector.is_heading(line) {
                section = Some(line.to_string());
                paragraph_number = 0;
                continue;
            }

            paragraph_number += 1;
            chunks.push(Chunk {
                section: section.clone(),
                paragraph_number,
                text: line.to_string(),
            });
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "SectionChunker"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SectionChunker::with_defaults())
}

// ============================================================================
// Tests
// ============================================================================
