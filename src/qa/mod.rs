//! 검색 증강 질의응답
//!
//! 질문을 임베딩해 가까운 청크 k개를 찾고, 그 텍스트를 이어붙인 컨텍스트에서
//! 추출형 QA로 답을 뽑습니다. 근거는 가장 가까운 청크 하나의 위치 정보와
//! 사용한 컨텍스트 전체입니다.

use serde::{Deserialize, Serialize};

use crate::error::{AssistError, AssistResult};
use crate::knowledge::{Chunk, DocumentIndex};
use crate::models::Models;

/// 기본 검색 청크 수
pub const DEFAULT_TOP_K: usize = 3;

/// 답변 + 근거
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub justification: String,
}

/// 문서 인덱스에 대해 질문에 답변
pub async fn answer(
    question: &str,
    index: &DocumentIndex,
    models: &Models,
    k: usize,
) -> AssistResult<Answer> {
    if index.is_empty() {
        return Err(AssistError::NoDocument);
    }

    let embedder = models.embedder()?;
    let qa = models.qa()?;

    let query = embedder
        .embed(question)
        .await
        .map_err(AssistError::inference)?;

    let hits = index.search(&query, k.max(1));
    let Some(&(best, distance)) = hits.first() else {
        return Err(AssistError::NoDocument);
    };
    tracing::debug!(
        "Retrieved {} chunks, nearest distance {:.4}",
        hits.len(),
        distance
    );

    let context = hits
        .iter()
        .map(|(chunk, _)| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let span = qa
        .answer(question, &context)
        .await
        .map_err(AssistError::inference)?;

    Ok(Answer {
        answer: span,
        justification: justification(best, &context),
    })
}

/// 근거 문자열: 최근접 청크의 문단 번호/섹션 + 사용한 컨텍스트
fn justification(best: &Chunk, context: &str) -> String {
    format!(
        "Justification:\n- Paragraph Number: {}\n- Section: {}\n- Context used:\n\n{}",
        best.paragraph_number,
        best.section_label(),
        context.trim()
    )
}

// ============================================================================
// Tests
// ============================================================================
