//! 업로드 → 요약 → 질문 → 퀴즈 → 채점 전체 흐름

use doc_tutor::{Assistant, AssistantConfig, Models};

const NOTES: &str = "Photosynthesis lets green plants convert sunlight into chemical energy stored as glucose.\n\
    \n\
    Cellular respiration breaks glucose down inside mitochondria and releases usable energy for the cell.\n\
    \n\
    Enzymes are proteins that speed up chemical reactions without being consumed by those reactions.\n";

fn assistant(dir: &tempfile::TempDir) -> Assistant {
    let config = AssistantConfig {
        upload_dir: dir.path().join("uploads"),
        ..AssistantConfig::default()
    };
    Assistant::new(config, Models::local())
}

#[tokio::test]
async fn test_text_document_full_flow() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("biology.txt");
    std::fs::write(&source, NOTES).unwrap();

    let assistant = assistant(&dir);
    let session = assistant.new_session();

    let handle = assistant.upload(&session, &source).await.unwrap();
    assert_eq!(handle.file_name(), "biology.txt");
    assert!(handle.path().starts_with(dir.path().join("uploads")));
    assert_eq!(handle.content_hash.len(), 64);

    let summary = assistant.get_summary(&session).await.unwrap();
    assert!(!summary.is_empty());
    assert!(!summary.starts_with("Error"));

    let answer = assistant
        .ask(&session, "Where does cellular respiration break down glucose?")
        .await
        .unwrap();
    assert!(answer.answer.contains("mitochondria"));
    assert!(answer.justification.starts_with("Justification:"));
    assert!(answer.justification.contains("- Section: Unknown"));

    let questions = assistant.start_quiz(&session).await.unwrap();
    assert_eq!(questions.len(), 3);
    let key = session.answer_key();
    assert_eq!(key.len(), 3);

    let answers = vec![
        String::new(),
        "wrong".to_string(),
        key[2].expected_answer.clone(),
    ];
    let results = assistant.grade_quiz(&session, &answers).await.unwrap();
    assert_eq!(results.len(), 3);

    assert!(!results[0].is_correct);
    assert_eq!(results[0].similarity, 0.0);
    assert!(results[0].justification.starts_with("No answer provided."));

    assert_eq!(results[1].user_answer, "wrong");

    assert!(results[2].is_correct);
    assert!((results[2].similarity - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_unsupported_file_keeps_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("notes.txt");
    let bad = dir.path().join("notes.docx");
    std::fs::write(&good, NOTES).unwrap();
    std::fs::write(&bad, "binary").unwrap();

    let assistant = assistant(&dir);
    let session = assistant.new_session();

    assistant.upload(&session, &good).await.unwrap();
    assert!(assistant.upload(&session, &bad).await.is_err());

    let current = session.current_document().unwrap();
    assert_eq!(current.file_name(), "notes.txt");
}
