//! Attachment reading with path-safety checks.
//!
//! Callers hand over arbitrary path strings; everything that is not a plain
//! readable text file on the allow list comes back as an error note instead
//! of file content. Checks run against the canonicalized path, so symlinks
//! are judged by their target.

use std::path::{Path, PathBuf};

/// Path fragments that are never read, wherever they resolve.
const BLOCKED_PATTERNS: &[&str] = &[
    ".ssh",
    ".gnupg",
    ".aws",
    ".env",
    ".netrc",
    "credentials",
    "secrets",
    ".git/config",
    "id_rsa",
    "id_ed25519",
    "id_ecdsa",
    ".claude/settings.json",
];

/// Extensions (lowercase, no dot) considered safe text.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "md", "txt", "py", "js", "ts", "jsx", "tsx", "json", "yaml", "yml", "toml", "cfg", "ini",
    "html", "css", "csv", "xml", "rst", "org", "sh", "bash", "zsh", "fish", "go", "rs", "rb",
    "php", "java", "kt", "swift", "c", "h", "cpp", "hpp", "sql", "graphql", "proto", "tf", "hcl",
];

/// Extensionless basenames that are known-safe.
const ALLOWED_BASENAMES: &[&str] = &[
    "README",
    "LICENSE",
    "LICENCE",
    "Makefile",
    "Dockerfile",
    "Vagrantfile",
    "Gemfile",
    "Rakefile",
    "Procfile",
    "CHANGELOG",
    "CONTRIBUTING",
    "AUTHORS",
];

/// Resolved attachments: rendered blocks for readable files, one error
/// string per path that was blocked or unreadable.
#[derive(Debug, Default)]
pub struct Attachments {
    pub blocks: Vec<String>,
    pub errors: Vec<String>,
}

/// Validate a path against the deny and allow lists.
/// Returns the canonical path, or the reason it was rejected.
fn check_path(path: &str) -> Result<PathBuf, String> {
    let expanded = expand_home(path);
    let resolved = std::fs::canonicalize(&expanded)
        .map_err(|_| format!("File not found: {path}"))?;

    let lower = resolved.to_string_lossy().to_lowercase();
    for pattern in BLOCKED_PATTERNS {
        if lower.contains(pattern) {
            return Err(format!(
                "{path}: Blocked: path matches sensitive pattern '{pattern}'"
            ));
        }
    }

    let basename = resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = resolved
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    let allowed = match ext {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => ALLOWED_BASENAMES.contains(&basename.as_str()),
    };
    if !allowed {
        return Err(format!(
            "{path}: Blocked: '{basename}' not in allowed extensions or filenames"
        ));
    }

    Ok(resolved)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return Path::new(&home).join(rest);
    }
    PathBuf::from(path)
}

/// Read each path, collecting rendered file blocks and per-path errors.
/// Never fails as a whole: every problem becomes an error note.
pub async fn read_attachments(paths: &[String]) -> Attachments {
    let mut attachments = Attachments::default();

    for path in paths {
        let resolved = match check_path(path) {
            Ok(resolved) => resolved,
            Err(reason) => {
                tracing::warn!(%path, "blocked attachment: {reason}");
                attachments.errors.push(reason);
                continue;
            }
        };

        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                attachments.errors.push(format!("{path}: Not a regular file"));
                continue;
            }
            Err(e) => {
                attachments.errors.push(format!("Error reading {path}: {e}"));
                continue;
            }
        }

        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => {
                tracing::debug!(%path, chars = content.len(), "read attachment");
                attachments.blocks.push(format!(
                    "=== FILE: {path} ===\n{content}\n=== END FILE ==="
                ));
            }
            Err(e) => {
                attachments.errors.push(format!("Error reading {path}: {e}"));
            }
        }
    }

    attachments
}
