use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::extract::ExtractRules;
use super::{Backend, Outcome, ReasoningRequest};

/// An LLM backend that shells out to the codex CLI.
///
/// Runs `codex exec` in a neutral scratch directory so the tool never picks
/// up the caller's project, with repo checks suppressed, a read-only
/// sandbox, and coloring off so stdout stays parseable.
pub struct CodexBackend {
    program: PathBuf,
    work_dir: PathBuf,
    rules: ExtractRules,
}

impl CodexBackend {
    pub fn new(program: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            program,
            work_dir,
            rules: ExtractRules::default(),
        }
    }

    /// Replace the stdout marker rules (newer codex builds drift).
    #[must_use]
    pub fn with_rules(mut self, rules: ExtractRules) -> Self {
        self.rules = rules;
        self
    }
}

#[async_trait]
impl Backend for CodexBackend {
    fn id(&self) -> &str {
        "chatgpt"
    }

    async fn invoke(&self, request: &ReasoningRequest) -> Outcome {
        let effort = request.depth.effort();

        if let Err(e) = tokio::fs::create_dir_all(&self.work_dir).await {
            return Outcome::Failure(format!(
                "cannot create scratch dir {}: {}",
                self.work_dir.display(),
                e
            ));
        }

        tracing::debug!(effort, "invoking codex");

        // kill_on_drop: when the deadline drops this future mid-flight,
        // the child is killed rather than left running unobserved.
        let result = Command::new(&self.program)
            .arg("exec")
            .arg("--skip-git-repo-check")
            .arg("-c")
            .arg(format!("model_reasoning_effort=\"{effort}\""))
            .arg("-s")
            .arg("read-only")
            .arg("--color")
            .arg("never")
            .arg(&request.prompt)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Outcome::Failure(format!(
                    "{} executable not found; is the codex CLI installed?",
                    self.program.display()
                ));
            }
            Err(e) => {
                return Outcome::Failure(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Outcome::Failure(if stderr.is_empty() {
                format!(
                    "codex exited with code {}",
                    output.status.code().unwrap_or(-1)
                )
            } else {
                stderr.to_string()
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let answer = self.rules.extract(&stdout);
        tracing::debug!(chars = answer.len(), "codex answered");
        Outcome::Answer(answer)
    }
}
