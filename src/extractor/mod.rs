//! 콘텐츠 추출 모듈
//!
//! 업로드된 문서에서 텍스트를 추출합니다.
//! - 텍스트 파일(.txt): 직접 읽기
//! - PDF 파일: pdf-extract로 텍스트 추출 (blocking 스레드)

pub mod pdf;
pub mod store;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{AssistError, AssistResult};

pub use store::{StoredUpload, UploadStore};

// ============================================================================
// File Type
// ============================================================================

/// 지원하는 문서 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// 일반 텍스트
    Text,
    /// PDF
    Pdf,
}

impl FileType {
    /// 확장자로 파일 타입 결정
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(FileType::Text),
            "pdf" => Some(FileType::Pdf),
            _ => None,
        }
    }

    /// 파일 경로에서 타입 결정 (지원하지 않으면 `UnsupportedFormat`)
    pub fn from_path(path: &Path) -> AssistResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| AssistError::UnsupportedFormat(ext.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Pdf => "pdf",
        }
    }
}

// ============================================================================
// Document Identity
// ============================================================================

/// 저장된 문서의 식별자 (경로 + 수정 시각 + 크기)
///
/// 같은 경로라도 내용이 바뀌면 수정 시각이나 크기가 달라져 다른 키가 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub size: u64,
}

impl DocumentKey {
    /// 파일 메타데이터로 키 생성
    pub async fn from_path(path: &Path) -> AssistResult<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: metadata.modified().ok(),
            size: metadata.len(),
        })
    }
}

/// 처리된 문서 핸들
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHandle {
    pub key: DocumentKey,
    /// 내용 SHA-256 (응답 캐시 키)
    pub content_hash: String,
    pub file_type: FileType,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentHandle {
    /// 파일을 읽어 핸들 생성
    pub async fn open(path: &Path) -> AssistResult<Self> {
        let file_type = FileType::from_path(path)?;
        let key = DocumentKey::from_path(path).await?;
        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            key,
            content_hash: content_digest(&bytes),
            file_type,
            uploaded_at: Utc::now(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.key.path
    }

    pub fn size(&self) -> u64 {
        self.key.size
    }

    pub fn file_name(&self) -> String {
        self.key
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 바이트 내용의 SHA-256 (소문자 hex)
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Text Extractor
// ============================================================================

/// 텍스트 추출기 트레이트
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path, file_type: FileType) -> AssistResult<String>;
}

/// 파일 시스템 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentExtractor;

#[async_trait]
impl TextExtractor for ContentExtractor {
    async fn extract(&self, path: &Path, file_type: FileType) -> AssistResult<String> {
        match file_type {
            FileType::Text => extract_text(path).await,
            FileType::Pdf => extract_pdf(path).await,
        }
    }
}

/// 텍스트 파일에서 추출 (잘못된 UTF-8은 대체 문자로)
async fn extract_text(path: &Path) -> AssistResult<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// PDF 파일에서 추출
async fn extract_pdf(path: &Path) -> AssistResult<String> {
    // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
    let bytes = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&bytes))
        .await
        .map_err(|e| AssistError::Extraction(format!("PDF extraction task failed: {}", e)))?
        .map_err(|e| AssistError::Extraction(format!("{:#}", e)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path(Path::new("a/notes.TXT")).unwrap(), FileType::Text);
        assert_eq!(FileType::from_path(Path::new("paper.pdf")).unwrap(), FileType::Pdf);
        assert!(matches!(
            FileType::from_path(Path::new("slides.docx")),
            Err(AssistError::UnsupportedFormat(ext)) if ext == "docx"
        ));
        assert!(FileType::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_content_digest() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_open_and_extract_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Line one.\nLine two.").unwrap();

        let handle = DocumentHandle::open(&path).await.unwrap();
        assert_eq!(handle.file_type, FileType::Text);
        assert_eq!(handle.size(), 19);
        assert_eq!(handle.file_name(), "notes.txt");
        assert_eq!(handle.content_hash, content_digest(b"Line one.\nLine two."));

        let text = ContentExtractor.extract(&path, FileType::Text).await.unwrap();
        assert_eq!(text, "Line one.\nLine two.");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = DocumentHandle::open(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::Io(_)));
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = ContentExtractor.extract(&path, FileType::Pdf).await.unwrap_err();
        assert!(matches!(err, AssistError::Extraction(_)));
    }
}
