use std::io::Write;

use ollama_chat::{json, ToolExecutionError, ToolOutput, ToolRegistry};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn read_file_returns_contents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "line one\nline two\n").unwrap();

    let registry = ToolRegistry::with_common_tools();
    let output = registry
        .execute("read_file", &json!({"filename": file.path().to_str().unwrap()}))
        .await
        .unwrap();

    assert_eq!(output, ToolOutput::Text("line one\nline two\n".into()));
}

#[tokio::test]
async fn read_file_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.txt");
    let missing = missing.to_str().unwrap();

    let registry = ToolRegistry::with_common_tools();
    let err = registry
        .execute("read_file", &json!({"filename": missing}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolExecutionError::ExecutionFailed(_)));
    assert!(err.to_string().contains(&format!("File not found: {missing}")));
}

#[tokio::test]
async fn read_file_rejects_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap();

    let err = ToolRegistry::with_common_tools()
        .execute("read_file", &json!({"filename": path}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("File not readable"), "{err}");
}

#[tokio::test]
async fn calculator_and_string_length() {
    let registry = ToolRegistry::with_common_tools();

    let sum = registry
        .execute("calculate", &json!({"expression": "(2 + 3) * 4 - 6 / 2"}))
        .await
        .unwrap();
    assert_eq!(sum, ToolOutput::Float(17.0));

    let len = registry
        .execute("string_length", &json!({"text": "héllo"}))
        .await
        .unwrap();
    assert_eq!(len, ToolOutput::Integer(5));
}

#[tokio::test]
async fn current_time_uses_the_given_format() {
    let output = ToolRegistry::with_common_tools()
        .execute("get_current_time", &json!({"format": "%Y"}))
        .await
        .unwrap();

    let ToolOutput::Text(year) = output else {
        panic!("expected text, got {output:?}");
    };
    assert_eq!(year.len(), 4);
    assert!(year.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn calculator_rejects_runaway_nesting() {
    let registry = ToolRegistry::with_common_tools();
    let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
    let signs = format!("{}1", "-".repeat(100_000));

    for expression in [parens, signs] {
        let err = registry
            .execute("calculate", &json!({ "expression": expression }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolExecutionError::ExecutionFailed(_)), "{err:?}");
        assert!(err.to_string().contains("nested deeper than 256"), "{err}");
    }
}
