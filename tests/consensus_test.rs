use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quorum::backend::codex::CodexBackend;
use quorum::backend::gemini::GeminiBackend;
use quorum::backend::mock::MockBackend;
use quorum::backend::{Backend, Depth, Outcome, ReasoningRequest};
use quorum::consensus;
use quorum::server::Server;

fn stub(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("codex-stub");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn keyless_gemini() -> GeminiBackend {
    GeminiBackend::new(reqwest::Client::new(), None, "gemini-2.5-flash".to_string())
}

#[tokio::test]
async fn real_backends_one_up_one_down() {
    // A working codex stub next to a Gemini backend with no credential:
    // the aggregate succeeds, with the missing key surfaced in the note.
    let dir = tempfile::tempdir().unwrap();
    let program = stub(&dir, r"printf 'codex\nstub says hello\ntokens used 1\n'");
    let backends: [Arc<dyn Backend>; 2] = [
        Arc::new(CodexBackend::new(program, dir.path().to_path_buf())),
        Arc::new(keyless_gemini()),
    ];

    let request = ReasoningRequest::new("q", Depth::High, Duration::from_secs(5));
    let result = consensus::consult(&backends, &request).await;

    assert!(result.succeeded());
    let combined = result.combined.unwrap();
    assert!(combined.contains("## CHATGPT\n\nstub says hello"));
    assert!(combined.contains("*Note: gemini: GEMINI_API_KEY not set*"));
}

#[tokio::test]
async fn real_backends_both_down_aggregate_fails() {
    let backends: [Arc<dyn Backend>; 2] = [
        Arc::new(CodexBackend::new(
            PathBuf::from("/nonexistent/quorum-codex"),
            std::env::temp_dir().join("quorum-it-scratch"),
        )),
        Arc::new(keyless_gemini()),
    ];

    let request = ReasoningRequest::new("q", Depth::High, Duration::from_secs(5));
    let result = consensus::consult(&backends, &request).await;

    assert!(!result.succeeded());
    match result.into_outcome() {
        Outcome::Failure(reason) => {
            assert!(reason.contains("chatgpt:"), "{reason}");
            assert!(reason.contains("not found"), "{reason}");
            assert!(reason.contains("gemini: GEMINI_API_KEY not set"), "{reason}");
        }
        Outcome::Answer(_) => panic!("expected failure"),
    }
}

#[tokio::test]
async fn slow_backend_times_out_without_stalling_the_fast_one() {
    let backends: [Arc<dyn Backend>; 2] = [
        Arc::new(MockBackend::answering("chatgpt", "never").with_delay(Duration::from_secs(30))),
        Arc::new(MockBackend::answering("gemini", "prompt reply")),
    ];

    let request = ReasoningRequest::new("q", Depth::High, Duration::from_secs(1));
    let start = std::time::Instant::now();
    let result = consensus::consult(&backends, &request).await;

    // Bounded by the deadline, not the slow backend.
    assert!(start.elapsed() < Duration::from_secs(3));
    let combined = result.combined.unwrap();
    assert!(combined.contains("## GEMINI\n\nprompt reply"));
    assert!(combined.contains("chatgpt: timed out after 1s"));
}

#[tokio::test]
async fn server_end_to_end_over_a_stub() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub(
        &dir,
        r"printf 'banner\nworkdir: /tmp\ncodex\nThe answer is 42.\ntokens used 10\n'",
    );
    let server = Server::new(
        Arc::new(CodexBackend::new(program, dir.path().to_path_buf())),
        Arc::new(keyless_gemini()),
        Duration::from_secs(5),
    );

    let response = server
        .handle_line(r#"{"tool": "chatgpt", "reasoning_input": "what is the answer?", "depth": "high", "mode": "quick"}"#)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["text"], "The answer is 42.");
}

#[tokio::test]
async fn server_consensus_end_to_end_reports_partial_failure() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub(&dir, r"printf 'codex\npartial view\ntokens used 2\n'");
    let server = Server::new(
        Arc::new(CodexBackend::new(program, dir.path().to_path_buf())),
        Arc::new(keyless_gemini()),
        Duration::from_secs(5),
    );

    let response = server
        .handle_line(r#"{"tool": "consensus", "reasoning_input": "compare"}"#)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&response).unwrap();
    let text = value["text"].as_str().unwrap();
    assert!(text.contains("## CHATGPT"));
    assert!(text.contains("GEMINI_API_KEY not set"));
    assert!(!text.starts_with("Error:"));
}
