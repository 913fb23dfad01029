//! CLI 모듈
//!
//! doc-tutor CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{AssistantConfig, Backend};
use crate::gemini::has_api_key;
use crate::quiz::{GradeResult, QuizQuestion};
use crate::session::{Assistant, Session};
use crate::text::truncate_with_ellipsis;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "doc-tutor")]
#[command(version, about = "문서 질의응답 + 퀴즈 어시스턴트", long_about = None)]
pub struct Cli {
    /// 모델 백엔드 (local | gemini)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// 업로드 디렉토리
    #[arg(long, global = true)]
    pub upload_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 문서를 업로드 디렉토리에 저장
    Upload {
        /// 문서 경로 (.txt, .pdf)
        file: PathBuf,
    },

    /// 문서 요약
    Summary {
        /// 문서 경로
        file: PathBuf,
    },

    /// 문서에 대해 질문
    Ask {
        /// 문서 경로
        file: PathBuf,

        /// 질문
        question: String,

        /// 검색할 청크 수
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// 퀴즈 출제 및 채점
    Quiz {
        /// 문서 경로
        file: PathBuf,

        /// 답안 (지정하지 않으면 표준 입력에서 한 줄씩 읽음)
        #[arg(short, long, num_args = 1..)]
        answers: Vec<String>,
    },

    /// 상태 확인
    Status,
}

fn parse_backend(value: &str) -> std::result::Result<Backend, String> {
    Backend::parse(value).ok_or_else(|| format!("알 수 없는 백엔드: {} (local | gemini)", value))
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AssistantConfig::from_env();
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = cli.upload_dir {
        config.upload_dir = dir;
    }

    match cli.command {
        Commands::Upload { file } => cmd_upload(config, &file).await,
        Commands::Summary { file } => cmd_summary(config, &file).await,
        Commands::Ask { file, question, k } => {
            if let Some(k) = k {
                config.top_k = k.max(1);
            }
            cmd_ask(config, &file, &question).await
        }
        Commands::Quiz { file, answers } => cmd_quiz(config, &file, answers).await,
        Commands::Status => cmd_status(config).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 어시스턴트 생성 + 문서 업로드
async fn open_document(config: AssistantConfig, file: &Path) -> Result<(Assistant, Session)> {
    let assistant = Assistant::from_config(config);
    let session = assistant.new_session();

    println!("[*] 문서 처리 중: {}", file.display());
    let handle = assistant
        .upload(&session, file)
        .await
        .with_context(|| format!("문서 업로드 실패: {}", file.display()))?;
    println!(
        "[OK] {} ({}, {})",
        handle.file_name(),
        handle.file_type.as_str(),
        format_bytes(handle.size() as usize)
    );

    Ok((assistant, session))
}

/// 업로드 명령어 (upload)
async fn cmd_upload(config: AssistantConfig, file: &Path) -> Result<()> {
    let (_, session) = open_document(config, file).await?;
    let handle = session
        .current_document()
        .context("업로드된 문서를 찾을 수 없습니다")?;

    println!("     경로: {}", handle.path().display());
    println!("     SHA-256: {}", handle.content_hash);
    println!(
        "     업로드 시각: {}",
        handle.uploaded_at.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}

/// 요약 명령어 (summary)
async fn cmd_summary(config: AssistantConfig, file: &Path) -> Result<()> {
    let (assistant, session) = open_document(config, file).await?;

    println!("[*] 요약 생성 중...");
    let summary = assistant.get_summary(&session).await.context("요약 실패")?;

    println!("\n{}", summary);
    Ok(())
}

/// 질문 명령어 (ask)
async fn cmd_ask(config: AssistantConfig, file: &Path, question: &str) -> Result<()> {
    let (assistant, session) = open_document(config, file).await?;

    println!("[*] 질문: \"{}\"", question);
    let answer = assistant
        .ask(&session, question)
        .await
        .context("질의응답 실패")?;

    println!("\n[OK] 답변: {}\n", answer.answer);
    println!("{}", answer.justification);
    Ok(())
}

/// 퀴즈 명령어 (quiz)
async fn cmd_quiz(config: AssistantConfig, file: &Path, answers: Vec<String>) -> Result<()> {
    let (assistant, session) = open_document(config, file).await?;

    println!("[*] 퀴즈 생성 중...");
    let questions = assistant
        .start_quiz(&session)
        .await
        .context("퀴즈 생성 실패")?;

    if session.answer_key().is_empty() {
        // 안내 문항만 있는 경우
        for q in &questions {
            println!("[!] {}", q.question);
        }
        return Ok(());
    }

    let answers = if answers.is_empty() {
        read_answers(&questions).await?
    } else {
        print_questions(&questions);
        answers
    };

    let results = assistant
        .grade_quiz(&session, &answers)
        .await
        .context("채점 실패")?;

    print_results(&results);
    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(config: AssistantConfig) -> Result<()> {
    println!("doc-tutor v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 백엔드: {}", config.backend.as_str());
    println!("[*] 업로드 디렉토리: {}", config.upload_dir.display());
    println!("[*] 검색 청크 수: {}", config.top_k);

    // API 키 상태
    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    let assistant = Assistant::from_config(config);
    println!();
    println!("[*] 모델:");
    for (capability, name) in assistant.models().describe() {
        match name {
            Some(name) => println!("    {:<20} {}", capability, name),
            None => println!("    {:<20} (사용 불가)", capability),
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn print_questions(questions: &[QuizQuestion]) {
    println!();
    for (i, q) in questions.iter().enumerate() {
        println!("Q{}. {}", i + 1, q.question);
    }
}

/// 문항을 하나씩 보여주고 표준 입력에서 답을 읽음
async fn read_answers(questions: &[QuizQuestion]) -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut answers = Vec::with_capacity(questions.len());

    println!();
    for (i, q) in questions.iter().enumerate() {
        println!("Q{}. {}", i + 1, q.question);
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout()).context("stdout flush 실패")?;

        let line = lines
            .next_line()
            .await
            .context("답안 읽기 실패")?
            .unwrap_or_default();
        answers.push(line.trim().to_string());
    }

    Ok(answers)
}

fn print_results(results: &[GradeResult]) {
    println!();
    for (i, r) in results.iter().enumerate() {
        let mark = if r.is_correct { "[OK]" } else { "[X]" };
        println!("{} Q{}. {}", mark, i + 1, r.question);
        println!("     답안: {}", truncate_with_ellipsis(r.user_answer.trim(), 80));
        println!("     정답: {}", r.expected_answer);
        println!("     유사도: {:.2}", r.similarity);
        for line in r.justification.lines() {
            println!("     {}", line);
        }
        println!();
    }

    let correct = results.iter().filter(|r| r.is_correct).count();
    println!("[*] 점수: {}/{}", correct, results.len());
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "doc-tutor",
            "ask",
            "notes.txt",
            "What is DNA?",
            "-k",
            "5",
            "--backend",
            "gemini",
        ])
        .unwrap();
        assert_eq!(cli.backend, Some(Backend::Gemini));
        match cli.command {
            Commands::Ask { question, k, .. } => {
                assert_eq!(question, "What is DNA?");
                assert_eq!(k, Some(5));
            }
            _ => panic!("expected ask"),
        }

        assert!(Cli::try_parse_from(["doc-tutor", "--backend", "openai", "status"]).is_err());
    }

    #[test]
    fn test_parse_quiz_answers() {
        let cli = Cli::try_parse_from(["doc-tutor", "quiz", "notes.txt", "--answers", "a", "b"])
            .unwrap();
        match cli.command {
            Commands::Quiz { answers, .. } => assert_eq!(answers, vec!["a", "b"]),
            _ => panic!("expected quiz"),
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }
}
