//! Recovers the model's answer from the codex CLI's stdout transcript.
//!
//! The transcript carries a metadata preamble (banner, `workdir:`/`model:`/…
//! lines, the echoed prompt under a bare `user` line), then a `thinking`
//! section, then the final `codex` section, then a `tokens used` accounting
//! line. Only the final section is the answer. The format is unversioned
//! upstream, so the marker lists live in [`ExtractRules`] rather than being
//! baked into the scan.

/// Lines that, trimmed, mark the start of a model output section.
/// The answer is whatever follows the last of these.
const ANSWER_MARKERS: &[&str] = &["thinking", "codex"];

/// First line starting with this ends the answer; it and the rest are dropped.
const TRAILER_PREFIX: &str = "tokens used";

/// Preamble line prefixes (trimmed) that are recognized metadata.
const METADATA_PREFIXES: &[&str] = &[
    "OpenAI Codex",
    "workdir:",
    "model:",
    "provider:",
    "approval:",
    "sandbox:",
    "reasoning effort:",
    "reasoning summaries:",
    "session id:",
];

/// Marker configuration for one extraction pass.
#[derive(Debug, Clone)]
pub struct ExtractRules {
    pub answer_markers: Vec<String>,
    pub trailer_prefix: String,
    pub metadata_prefixes: Vec<String>,
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self {
            answer_markers: ANSWER_MARKERS.iter().map(|m| m.to_string()).collect(),
            trailer_prefix: TRAILER_PREFIX.to_string(),
            metadata_prefixes: METADATA_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ExtractRules {
    fn is_answer_marker(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.answer_markers.iter().any(|m| m == trimmed)
    }

    fn is_metadata(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed == "user" || is_separator(trimmed) {
            return true;
        }
        self.metadata_prefixes
            .iter()
            .any(|p| trimmed.starts_with(p.as_str()))
    }

    /// Extract the answer from a raw transcript.
    ///
    /// Scans for the last answer-start marker before the trailer and returns
    /// the lines between them. Without any marker, the answer starts at the
    /// first non-blank line that is not recognized metadata. A scan that
    /// comes up empty returns the whole input trimmed: unexpected output
    /// formats degrade to raw text, never to a silently empty answer.
    pub fn extract(&self, raw: &str) -> String {
        let lines: Vec<&str> = raw.lines().collect();

        let mut start = None;
        let mut end = lines.len();
        for (i, line) in lines.iter().enumerate() {
            if self.is_answer_marker(line) {
                start = Some(i + 1);
                end = lines.len();
            } else if start.is_some() && line.starts_with(&self.trailer_prefix) {
                end = i;
                break;
            }
        }

        // No marker: fall back to the first line that isn't preamble,
        // still cutting the trailer if one shows up later.
        let start = start.or_else(|| {
            let first = lines
                .iter()
                .position(|line| !line.trim().is_empty() && !self.is_metadata(line))?;
            end = lines[first..]
                .iter()
                .position(|line| line.starts_with(&self.trailer_prefix))
                .map_or(lines.len(), |off| first + off);
            Some(first)
        });

        let body = match start {
            Some(s) if s <= end => lines[s..end].join("\n").trim().to_string(),
            _ => String::new(),
        };

        if body.is_empty() {
            raw.trim().to_string()
        } else {
            body
        }
    }
}

/// Banner separator: a run of 3+ dashes or equals signs and nothing else.
fn is_separator(line: &str) -> bool {
    line.len() >= 3
        && (line.chars().all(|c| c == '-') || line.chars().all(|c| c == '='))
}

/// Extract with the default codex marker set.
pub fn extract_answer(raw: &str) -> String {
    ExtractRules::default().extract(raw)
}
