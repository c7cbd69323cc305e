use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quorum::backend::codex::CodexBackend;
use quorum::backend::gemini::{self, GeminiBackend};
use quorum::consts;
use quorum::server::Server;

#[derive(Parser)]
#[command(name = "quorum", version, about = "A second-opinion reasoning assistant.")]
struct Cli {
    /// Per-backend call timeout in seconds
    #[arg(short, long, default_value_t = consts::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Codex CLI program to spawn
    #[arg(long, default_value = "codex")]
    codex_program: PathBuf,

    /// Gemini model id
    #[arg(long, default_value = gemini::DEFAULT_MODEL)]
    gemini_model: String,

    /// Scratch directory for the subprocess backend
    #[arg(short, long)]
    work_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Stdout is the protocol stream; all logs go to stderr.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let work_dir = cli.work_dir.unwrap_or_else(consts::default_scratch_dir);

    // One client and one credential lookup for the whole process; the
    // backends get them injected.
    let client = reqwest::Client::new();
    let api_key = std::env::var(gemini::ENV_API_KEY)
        .ok()
        .filter(|key| !key.is_empty());
    if api_key.is_none() {
        tracing::warn!(
            "{} not set; gemini calls will report a configuration failure",
            gemini::ENV_API_KEY
        );
    }

    let codex = Arc::new(CodexBackend::new(cli.codex_program, work_dir));
    let gemini = Arc::new(GeminiBackend::new(client, api_key, cli.gemini_model));

    tracing::info!(timeout = cli.timeout, "quorum listening on stdio");
    Server::new(codex, gemini, Duration::from_secs(cli.timeout))
        .run()
        .await
}
