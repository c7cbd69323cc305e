//! Line-oriented JSON protocol over stdin/stdout.
//!
//! One request object per line in, one response object per line out. Stdout
//! carries nothing but responses; logs go to stderr. Failures are answered
//! as `"Error: <reason>"` text; a malformed line or unknown tool gets a
//! response, never a crash.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::backend::{Backend, Depth, Outcome, OutputMode, ReasoningRequest};
use crate::consensus;
use crate::deadline::invoke_with_deadline;
use crate::files;
use crate::prompt;

/// The protocol front-end. Owns the backends and the default call budget.
pub struct Server {
    codex: Arc<dyn Backend>,
    gemini: Arc<dyn Backend>,
    timeout: Duration,
}

impl Server {
    pub fn new(codex: Arc<dyn Backend>, gemini: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self {
            codex,
            gemini,
            timeout,
        }
    }

    /// Read request lines until EOF or ctrl-c.
    pub async fn run(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut stdout = tokio::io::stdout();

        loop {
            tokio::select! {
                result = lines.next_line() => {
                    match result {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            let response = self.handle_line(line).await?;
                            stdout.write_all(response.as_bytes()).await?;
                            stdout.write_all(b"\n").await?;
                            stdout.flush().await?;
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::error!("stdin error: {e}");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Handle one request line, returning the serialized response line.
    pub async fn handle_line(&self, line: &str) -> Result<String> {
        let outcome = match serde_json::from_str::<WireRequest>(line) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Outcome::Failure(format!("malformed request: {e}")),
        };

        let text = match outcome {
            Outcome::Answer(text) => text,
            Outcome::Failure(reason) => format!("Error: {reason}"),
        };
        Ok(serde_json::to_string(&WireResponse { text })?)
    }

    async fn dispatch(&self, request: WireRequest) -> Outcome {
        let depth = Depth::parse(request.depth.as_deref().unwrap_or("high"));
        let mode = OutputMode::parse(request.mode.as_deref().unwrap_or("memo"));
        tracing::info!(tool = %request.tool, ?depth, ?mode, "handling request");

        let attachments = files::read_attachments(&request.files.unwrap_or_default()).await;
        let full_prompt = prompt::build_prompt(
            &request.reasoning_input,
            mode,
            &attachments.blocks,
            &attachments.errors,
        );
        let reasoning = ReasoningRequest::new(full_prompt, depth, self.timeout);

        match request.tool.as_str() {
            "chatgpt" => {
                invoke_with_deadline(self.codex.as_ref(), &reasoning)
                    .await
                    .outcome
            }
            "gemini" => {
                invoke_with_deadline(self.gemini.as_ref(), &reasoning)
                    .await
                    .outcome
            }
            "consensus" => {
                let backends = [Arc::clone(&self.codex), Arc::clone(&self.gemini)];
                consensus::consult(&backends, &reasoning).await.into_outcome()
            }
            other => Outcome::Failure(format!("unknown tool: {other}")),
        }
    }
}

// --- wire types ---

#[derive(Deserialize)]
struct WireRequest {
    tool: String,
    reasoning_input: String,
    depth: Option<String>,
    mode: Option<String>,
    files: Option<Vec<String>>,
}

#[derive(Serialize)]
struct WireResponse {
    text: String,
}
