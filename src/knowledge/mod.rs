//! Knowledge 모듈 - 문서 청킹과 임베딩 인덱스
//!
//! - Chunker: 번호 제목 인식 줄 단위 분할
//! - Index: 정확한 L2 최근접 이웃 검색

mod chunker;
mod index;

// Re-exports
pub use chunker::{
    Chunk, Chunker, SectionChunker, SectionDetector, NumberedHeading,
    default_chunker,
};
pub use index::{DocumentIndex, FlatL2Index, Neighbor};
