//! 업로드 저장소
//!
//! 업로드 파일을 업로드 디렉토리에 복사합니다. 같은 이름으로 동일한
//! 내용이 이미 있으면 쓰지 않고, 내용이 바뀌었는지 여부를 함께 알려줍니다.

use std::path::{Path, PathBuf};

use crate::error::AssistResult;

use super::{content_digest, FileType};

/// 저장 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// 업로드 디렉토리 안의 경로
    pub path: PathBuf,
    /// 새 내용의 SHA-256
    pub content_hash: String,
    /// 기존 파일과 내용이 달랐는지 (새 파일 포함)
    pub changed: bool,
    /// 덮어쓰기 전 기존 파일의 SHA-256
    pub previous_hash: Option<String>,
}

/// 업로드 디렉토리
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 로컬 파일을 업로드 디렉토리로 복사
    pub async fn save_file(&self, source: &Path) -> AssistResult<StoredUpload> {
        FileType::from_path(source)?;
        let bytes = tokio::fs::read(source).await?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.save(&name, &bytes).await
    }

    /// 바이트 내용을 `name`으로 저장
    pub async fn save(&self, name: &str, bytes: &[u8]) -> AssistResult<StoredUpload> {
        let file_name = sanitize_file_name(name);
        let target = self.dir.join(&file_name);
        FileType::from_path(&target)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let content_hash = content_digest(bytes);
        let previous_hash = match tokio::fs::read(&target).await {
            Ok(existing) => Some(content_digest(&existing)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let changed = previous_hash.as_deref() != Some(content_hash.as_str());
        if changed {
            tokio::fs::write(&target, bytes).await?;
            tracing::info!("Stored upload {:?} ({} bytes)", target, bytes.len());
        } else {
            tracing::info!("Upload {:?} unchanged, skipping write", target);
        }

        Ok(StoredUpload {
            path: target,
            content_hash,
            changed,
            previous_hash,
        })
    }
}

/// 경로 구성요소를 제거하고 안전한 문자만 남김
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistError;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd.txt"), "passwd.txt");
        assert_eq!(sanitize_file_name("my notes (v2).txt"), "my_notes__v2_.txt");
        assert_eq!(sanitize_file_name("C:\\docs\\paper.pdf"), "paper.pdf");
        assert_eq!(sanitize_file_name("..."), "upload");
    }

    #[tokio::test]
    async fn test_identical_upload_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let first = store.save("notes.txt", b"hello").await.unwrap();
        assert!(first.changed);
        assert!(first.previous_hash.is_none());

        let second = store.save("notes.txt", b"hello").await.unwrap();
        assert!(!second.changed);
        assert_eq!(second.previous_hash.as_deref(), Some(first.content_hash.as_str()));

        let third = store.save("notes.txt", b"hello again").await.unwrap();
        assert!(third.changed);
        assert_eq!(third.previous_hash, Some(first.content_hash));
        assert_eq!(std::fs::read(&third.path).unwrap(), b"hello again");
    }

    #[tokio::test]
    async fn test_unsupported_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let err = store.save("slides.pptx", b"data").await.unwrap_err();
        assert!(matches!(err, AssistError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_save_file_copies_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, "content").unwrap();

        let store = UploadStore::new(dir.path().join("uploads"));
        let stored = store.save_file(&source).await.unwrap();
        assert_eq!(stored.path, dir.path().join("uploads").join("source.txt"));
        assert!(stored.changed);
    }
}
