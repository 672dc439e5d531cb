//! Error handling tests

use reading_companion::capture;
use reading_companion::error::AssistError;
use reading_companion::scanner;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result, Err(AssistError::FolderNotFound(_))));
}

#[test]
fn test_scan_folder_without_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path()).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_load_missing_image() {
    let result = capture::load_image_file(Path::new("/nonexistent/page.png"));
    assert!(matches!(result, Err(AssistError::FileNotFound(_))));
}

#[test]
fn test_load_corrupt_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let result = capture::load_image_file(&path);
    assert!(matches!(result, Err(AssistError::ImageLoad(_))));
}

#[test]
fn test_error_display() {
    let errors = vec![
        AssistError::Config("bad temperature".to_string()),
        AssistError::MissingApiKey,
        AssistError::CaptureEmpty,
        AssistError::Clipboard("no display".to_string()),
        AssistError::FileNotFound("page.png".to_string()),
        AssistError::FolderNotFound("/book".to_string()),
        AssistError::ImageLoad("truncated".to_string()),
        AssistError::TranscriptionFailed {
            page: 3,
            reason: "tesseract exited with 1".to_string(),
        },
        AssistError::Ocr("not installed".to_string()),
        AssistError::answer_unavailable("timeout", None),
        AssistError::Browser("no such element".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "Error display should not be empty");
    }
}

#[test]
fn test_transcription_failed_names_the_page() {
    let err = AssistError::TranscriptionFailed {
        page: 7,
        reason: "engine crashed".to_string(),
    };
    assert_eq!(err.to_string(), "Transcription failed for page 7: engine crashed");
}

#[test]
fn test_raw_response_only_on_answer_unavailable() {
    let err = AssistError::answer_unavailable("unmatched", Some("Maybe D?".to_string()));
    assert_eq!(err.raw_response(), Some("Maybe D?"));
    assert_eq!(AssistError::CaptureEmpty.raw_response(), None);
}

#[test]
fn test_error_conversions() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: AssistError = io_err.into();
    assert!(matches!(err, AssistError::Io(_)));

    let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
    let err: AssistError = json_err.into();
    assert!(matches!(err, AssistError::JsonParse(_)));

    let common_err = reading_companion_common::Error::Parse("no options".to_string());
    let err: AssistError = common_err.into();
    assert_eq!(err.to_string(), "Parse error: no options");
}
