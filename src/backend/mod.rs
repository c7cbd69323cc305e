pub mod codex;
pub mod extract;
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use std::time::Duration;

/// Caller-selected reasoning effort. Each backend maps it to its own knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    Low,
    Medium,
    #[default]
    High,
}

impl Depth {
    /// Lenient parse: unrecognized strings fall back to High.
    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Depth::Low,
            "medium" => Depth::Medium,
            _ => Depth::High,
        }
    }

    /// Reasoning-effort label passed to the codex CLI.
    pub fn effort(self) -> &'static str {
        match self {
            Depth::Low => "low",
            Depth::Medium => "medium",
            Depth::High => "high",
        }
    }

    /// Thinking budget (tokens) passed to the Gemini API.
    pub fn thinking_budget(self) -> u32 {
        match self {
            Depth::Low => 1024,
            Depth::Medium => 8192,
            Depth::High => 24576,
        }
    }
}

/// How the model should shape its answer. Consumed during prompt assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Memo,
    Bullets,
    Questions,
    Quick,
}

impl OutputMode {
    /// Lenient parse: unrecognized strings fall back to Memo.
    pub fn parse(s: &str) -> Self {
        match s {
            "bullets" => OutputMode::Bullets,
            "questions" => OutputMode::Questions,
            "quick" => OutputMode::Quick,
            _ => OutputMode::Memo,
        }
    }
}

/// One logical reasoning call, ready to dispatch. The prompt is the fully
/// assembled blob (system instruction, format block, user input, attached
/// files); backends treat it as opaque. One instance is shared by every
/// backend the call fans out to.
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub prompt: String,
    pub depth: Depth,
    pub timeout: Duration,
}

impl ReasoningRequest {
    pub fn new(prompt: impl Into<String>, depth: Depth, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            depth,
            timeout,
        }
    }
}

/// What one backend invocation produced. Failures are information,
/// not faults. Invokers never propagate errors past this boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answer(String),
    Failure(String),
}

impl Outcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, Outcome::Answer(_))
    }
}

/// Outcome of one invocation attempt, tagged with the backend that made it.
#[derive(Debug, Clone)]
pub struct BackendResult {
    pub backend: String,
    pub outcome: Outcome,
}

/// One reasoning provider: a spawned CLI tool, a remote API, or a test script.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identifier used in aggregate sections and failure notes.
    fn id(&self) -> &str;

    /// Perform the call. Every failure mode (missing tool, bad exit,
    /// transport error, empty response) comes back as `Outcome::Failure`.
    async fn invoke(&self, request: &ReasoningRequest) -> Outcome;
}
