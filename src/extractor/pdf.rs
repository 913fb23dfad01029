//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 텍스트를 추출합니다.
//! 동기 함수이므로 호출 측에서 `spawn_blocking`으로 감싸야 합니다.

use anyhow::{Context, Result};

/// PDF 바이트에서 텍스트 추출
///
/// 페이지 구분(폼피드)은 줄바꿈으로 바꾸고, 각 줄의 끝 공백을 제거합니다.
/// 텍스트 레이어가 없는 스캔 문서는 빈 문자열을 반환합니다.
pub fn extract_text_from_pdf(bytes: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes).context("Failed to extract text from PDF")?;

    if text.trim().is_empty() {
        tracing::warn!("No text extracted from PDF. It might be a scanned document.");
        return Ok(String::new());
    }

    Ok(normalize_pdf_text(&text))
}

/// 폼피드 → 줄바꿈, 줄 끝 공백 제거
fn normalize_pdf_text(text: &str) -> String {
    text.replace('\x0c', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
