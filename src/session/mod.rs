//! 세션과 어시스턴트
//!
//! `Session`은 현재 문서, 캐시, 퀴즈 답안 키 등 변하는 상태를 모두 담고,
//! `Assistant`는 읽기 전용 모델/설정을 들고 세션에 대해 연산을 수행합니다.
//!
//! 상태 잠금은 `.await` 너머로 유지하지 않습니다. 캐시 확인 → 잠금 해제 →
//! 계산 → 다시 잠가서 저장하는 순서이며, 동시 저장은 마지막 쓰기가 이깁니다.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use uuid::Uuid;

use crate::cache::BoundedCache;
use crate::config::{AssistantConfig, CacheConfig};
use crate::error::{AssistError, AssistResult};
use crate::extractor::{
    content_digest, ContentExtractor, DocumentHandle, DocumentKey, TextExtractor, UploadStore,
};
use crate::knowledge::{default_chunker, Chunker, DocumentIndex};
use crate::models::Models;
use crate::qa::{self, Answer};
use crate::quiz::{self, AnswerGrader, GradeResult, QuizItem, QuizQuestion};
use crate::summary;

// ============================================================================
// Session
// ============================================================================

/// 세션 상태
struct SessionState {
    current: Option<DocumentHandle>,
    texts: BoundedCache<DocumentKey, Arc<String>>,
    indexes: BoundedCache<DocumentKey, Arc<DocumentIndex>>,
    /// 내용 해시 → 요약
    summaries: BoundedCache<String, String>,
    /// (내용 해시, 질문 해시) → 답변
    answers: BoundedCache<(String, String), Answer>,
    /// 내용 해시 → 퀴즈
    quizzes: BoundedCache<String, Vec<QuizItem>>,
    answer_key: Vec<QuizItem>,
}

impl SessionState {
    fn new(config: &CacheConfig) -> Self {
        Self {
            current: None,
            texts: BoundedCache::new(config.text_capacity),
            indexes: BoundedCache::new(config.index_capacity),
            summaries: BoundedCache::new(config.response_capacity),
            answers: BoundedCache::new(config.response_capacity),
            quizzes: BoundedCache::new(config.response_capacity),
            answer_key: Vec::new(),
        }
    }

    /// 특정 내용 해시의 응답 캐시 제거
    fn invalidate_digest(&mut self, digest: &str) {
        self.summaries.remove(&digest.to_string());
        self.quizzes.remove(&digest.to_string());
        self.answers.retain(|(doc, _), _| doc != digest);
    }

    /// 같은 경로의 이전 버전 텍스트/인덱스 제거
    fn drop_stale_versions(&mut self, key: &DocumentKey) {
        self.texts.retain(|k, _| k.path != key.path || k == key);
        self.indexes.retain(|k, _| k.path != key.path || k == key);
    }
}

/// 사용자 세션
pub struct Session {
    id: Uuid,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(SessionState::new(config)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 현재 문서
    pub fn current_document(&self) -> Option<DocumentHandle> {
        self.lock().current.clone()
    }

    /// 현재 답안 키 (복사본)
    pub fn answer_key(&self) -> Vec<QuizItem> {
        self.lock().answer_key.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // 패닉으로 오염되어도 캐시 상태는 일관적이므로 계속 사용
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_current(&self) -> AssistResult<DocumentHandle> {
        self.current_document().ok_or(AssistError::NoDocument)
    }
}

// ============================================================================
// Assistant
// ============================================================================

/// 문서 QA + 퀴즈 어시스턴트
pub struct Assistant {
    config: AssistantConfig,
    models: Models,
    extractor: Arc<dyn TextExtractor>,
    chunker: Box<dyn Chunker>,
}

impl Assistant {
    pub fn new(config: AssistantConfig, models: Models) -> Self {
        Self {
            config,
            models,
            extractor: Arc::new(ContentExtractor),
            chunker: default_chunker(),
        }
    }

    /// 설정의 백엔드로 모델을 로드하여 생성
    pub fn from_config(config: AssistantConfig) -> Self {
        let models = Models::load(config.backend);
        Self::new(config, models)
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_chunker(mut self, chunker: Box<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    pub fn new_session(&self) -> Session {
        Session::new(&self.config.cache)
    }

    pub fn upload_store(&self) -> UploadStore {
        UploadStore::new(&self.config.upload_dir)
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// 파일을 업로드 디렉토리에 저장하고 현재 문서로 설정
    ///
    /// 같은 이름의 파일 내용이 바뀌었으면 이전 내용의 응답 캐시를 버립니다.
    pub async fn upload(&self, session: &Session, source: &Path) -> AssistResult<DocumentHandle> {
        let stored = self.upload_store().save_file(source).await?;

        if stored.changed {
            if let Some(previous) = &stored.previous_hash {
                tracing::info!(session = %session.id(), "Upload replaced existing content, invalidating caches");
                session.lock().invalidate_digest(previous);
            }
        }

        self.process_upload(session, &stored.path).await
    }

    /// 저장된 문서를 현재 문서로 설정
    ///
    /// 표시용 대체값이 없으므로 형식/파일 오류도 그대로 반환합니다.
    pub async fn process_upload(&self, session: &Session, path: &Path) -> AssistResult<DocumentHandle> {
        let handle = DocumentHandle::open(path).await?;

        let mut state = session.lock();
        if let Some(previous) = state.current.take() {
            if previous.key != handle.key {
                state.answer_key.clear();
            }
            if previous.key.path == handle.key.path && previous.content_hash != handle.content_hash {
                tracing::info!(session = %session.id(), "Document content changed: {:?}", path);
                state.invalidate_digest(&previous.content_hash);
            }
        }
        state.drop_stale_versions(&handle.key);
        state.current = Some(handle.clone());
        drop(state);

        tracing::info!(
            session = %session.id(),
            "Processed upload {} ({}, {} bytes)",
            handle.file_name(),
            handle.file_type.as_str(),
            handle.size()
        );
        Ok(handle)
    }

    // ========================================================================
    // Cached Artifacts
    // ========================================================================

    /// 현재 문서 핸들 (파일이 제자리에서 바뀌었으면 다시 읽어 교체)
    ///
    /// 매 연산마다 경로를 다시 stat 하고, 수정 시각이나 크기가 달라졌으면
    /// 해시를 다시 계산합니다. 내용이 바뀌었으면 이전 해시의 응답 캐시와
    /// 답안 키를 버립니다.
    async fn current_handle(&self, session: &Session) -> AssistResult<DocumentHandle> {
        let handle = session.require_current()?;
        let key = DocumentKey::from_path(handle.path()).await?;
        if key == handle.key {
            return Ok(handle);
        }

        let mut refreshed = DocumentHandle::open(handle.path()).await?;
        refreshed.uploaded_at = handle.uploaded_at;

        let mut state = session.lock();
        if state.current.as_ref() != Some(&handle) {
            // 다른 연산이 먼저 교체함
            return state.current.clone().ok_or(AssistError::NoDocument);
        }
        if refreshed.content_hash != handle.content_hash {
            tracing::info!(
                session = %session.id(),
                "Document changed on disk: {}",
                handle.file_name()
            );
            state.invalidate_digest(&handle.content_hash);
            state.answer_key.clear();
        }
        state.drop_stale_versions(&refreshed.key);
        state.current = Some(refreshed.clone());
        Ok(refreshed)
    }

    /// 현재 문서 텍스트 (문서 키 기준 캐시)
    async fn document_text(&self, session: &Session) -> AssistResult<(DocumentHandle, Arc<String>)> {
        let handle = self.current_handle(session).await?;

        let cached = session.lock().texts.get(&handle.key).cloned();
        if let Some(text) = cached {
            tracing::debug!("Text cache hit: {}", handle.file_name());
            return Ok((handle, text));
        }

        let start = Instant::now();
        let text = self
            .extractor
            .extract(handle.path(), handle.file_type)
            .await?;
        if text.trim().is_empty() {
            return Err(AssistError::EmptyDocument);
        }
        tracing::info!(
            "Extracted {} chars from {} in {:?}",
            text.chars().count(),
            handle.file_name(),
            start.elapsed()
        );

        let text = Arc::new(text);
        session.lock().texts.insert(handle.key.clone(), text.clone());
        Ok((handle, text))
    }

    /// 현재 문서 인덱스 (문서 키 기준 캐시, 청크와 함께 원자적으로 교체)
    async fn document_index(&self, session: &Session) -> AssistResult<Arc<DocumentIndex>> {
        let handle = self.current_handle(session).await?;

        let cached = session.lock().indexes.get(&handle.key).cloned();
        if let Some(index) = cached {
            tracing::debug!("Index cache hit: {}", handle.file_name());
            return Ok(index);
        }

        let (handle, text) = self.document_text(session).await?;
        let chunks = self.chunker.chunk(&text);
        let index = Arc::new(DocumentIndex::build(chunks, self.models.embedder()?).await?);
        tracing::info!(
            "Built index for {} ({} chunks, {})",
            handle.file_name(),
            index.len(),
            self.chunker.name()
        );

        session.lock().indexes.insert(handle.key.clone(), index.clone());
        Ok(index)
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// 현재 문서 요약
    pub async fn summarize_current(&self, session: &Session) -> AssistResult<String> {
        let handle = self.current_handle(session).await?;
        let cached = session.lock().summaries.get(&handle.content_hash).cloned();
        if let Some(summary) = cached {
            tracing::info!("Summary cache hit: {}", handle.file_name());
            return Ok(summary);
        }

        let (handle, text) = self.document_text(session).await?;
        let summary = summary::summarize(&text, &self.models, &self.config.summary).await?;

        session
            .lock()
            .summaries
            .insert(handle.content_hash.clone(), summary.clone());
        Ok(summary)
    }

    /// 현재 문서에 대해 질문
    pub async fn answer_current(&self, session: &Session, question: &str) -> AssistResult<Answer> {
        let handle = self.current_handle(session).await?;
        let cache_key = (handle.content_hash.clone(), content_digest(question.as_bytes()));

        let cached = session.lock().answers.get(&cache_key).cloned();
        if let Some(answer) = cached {
            tracing::info!("Answer cache hit: {}", question);
            return Ok(answer);
        }

        let index = self.document_index(session).await?;
        let answer = qa::answer(question, &index, &self.models, self.config.top_k).await?;

        session.lock().answers.insert(cache_key, answer.clone());
        Ok(answer)
    }

    /// 현재 문서로 퀴즈 생성 (답안 키 교체)
    pub async fn generate_quiz_current(&self, session: &Session) -> AssistResult<Vec<QuizItem>> {
        let handle = self.current_handle(session).await?;

        {
            let mut state = session.lock();
            if let Some(items) = state.quizzes.get(&handle.content_hash).cloned() {
                tracing::info!("Quiz cache hit: {}", handle.file_name());
                state.answer_key = items.clone();
                return Ok(items);
            }
        }

        let (handle, text) = self.document_text(session).await?;
        let items = quiz::generate_quiz(&text, &self.models, &self.config.quiz).await?;
        tracing::info!("Generated {} quiz questions for {}", items.len(), handle.file_name());

        let mut state = session.lock();
        state.quizzes.insert(handle.content_hash.clone(), items.clone());
        state.answer_key = items.clone();
        Ok(items)
    }

    /// 현재 답안 키로 채점
    pub async fn grade_current(&self, session: &Session, user_answers: &[String]) -> AssistResult<Vec<GradeResult>> {
        if session.answer_key().is_empty() {
            return Err(AssistError::NoQuiz);
        }

        // 파일이 바뀌었으면 여기서 답안 키가 비워짐
        let (_, text) = self.document_text(session).await?;
        let answer_key = session.answer_key();
        if answer_key.is_empty() {
            return Err(AssistError::NoQuiz);
        }

        AnswerGrader::new(&self.models, &self.config.grading)
            .grade(user_answers, &answer_key, &text)
            .await
    }

    // ========================================================================
    // Boundary Operations (recoverable errors → displayable results)
    // ========================================================================

    /// 요약 (실패 시 설명 문자열)
    pub async fn get_summary(&self, session: &Session) -> AssistResult<String> {
        degrade(self.summarize_current(session).await, |e| match e {
            AssistError::DocumentTooShort { .. } => {
                "Document is too short to generate a meaningful summary.".to_string()
            }
            AssistError::Inference(msg) => format!("Error generating summary: {}", msg),
            other => other.user_message(),
        })
    }

    /// 질문 답변 (실패 시 설명 답변)
    pub async fn ask(&self, session: &Session, question: &str) -> AssistResult<Answer> {
        degrade(self.answer_current(session, question).await, |e| Answer {
            answer: e.user_message(),
            justification: match e {
                AssistError::NoDocument => "No document available.".to_string(),
                _ => "Unable to answer the question.".to_string(),
            },
        })
    }

    /// 퀴즈 시작 (실패 시 이유를 담은 문항 하나)
    pub async fn start_quiz(&self, session: &Session) -> AssistResult<Vec<QuizQuestion>> {
        let result = self.generate_quiz_current(session).await;
        if result.is_err() {
            // 안내 문항은 채점 대상이 아니므로 이전 답안 키도 비움
            session.lock().answer_key.clear();
        }

        degrade(
            result.map(|items| items.iter().map(QuizQuestion::from).collect()),
            |e| {
                let question = match e {
                    AssistError::DocumentTooShort { .. } => {
                        "Document is too short to generate meaningful questions.".to_string()
                    }
                    AssistError::EmptyDocument => {
                        "Could not extract meaningful topics from the document.".to_string()
                    }
                    AssistError::Inference(msg) => format!("Error generating questions: {}", msg),
                    other => other.user_message(),
                };
                vec![QuizQuestion { question }]
            },
        )
    }

    /// 채점 (실패 시 이유를 담은 결과 하나)
    pub async fn grade_quiz(&self, session: &Session, user_answers: &[String]) -> AssistResult<Vec<GradeResult>> {
        degrade(self.grade_current(session, user_answers).await, |e| {
            vec![GradeResult {
                question: e.user_message(),
                expected_answer: String::new(),
                user_answer: String::new(),
                is_correct: false,
                similarity: 0.0,
                justification: "No document or questions available".to_string(),
            }]
        })
    }
}

/// 복구 가능한 에러를 표시용 값으로 바꿈 (불변식 위반은 그대로 전파)
fn degrade<T>(result: AssistResult<T>, render: impl FnOnce(&AssistError) -> T) -> AssistResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_recoverable() => {
            tracing::warn!("Degraded error: {}", e);
            Ok(render(&e))
        }
        Err(e) => {
            tracing::error!("Invariant violation: {}", e);
            Err(e)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
