//! Fan-out: one request, every backend, merged answer.

use std::sync::Arc;

use futures::future::join_all;

use crate::backend::{Backend, BackendResult, Outcome, ReasoningRequest};
use crate::deadline::invoke_with_deadline;

/// Divider between backend sections in the combined answer.
const SECTION_DIVIDER: &str = "\n\n---\n\n";

/// Merged outcome of dispatching one request to several backends.
///
/// `per_backend` keeps dispatch order. `combined` exists iff at least one
/// backend answered; its sections follow the dispatch (priority) order, not
/// completion order.
#[derive(Debug)]
pub struct AggregateResult {
    pub per_backend: Vec<BackendResult>,
    pub combined: Option<String>,
}

impl AggregateResult {
    pub fn succeeded(&self) -> bool {
        self.combined.is_some()
    }

    /// Collapse to a single outcome: the combined text, or, when every
    /// backend failed, a failure carrying all per-backend reasons.
    pub fn into_outcome(self) -> Outcome {
        match self.combined {
            Some(text) => Outcome::Answer(text),
            None => Outcome::Failure(join_failures(&self.per_backend)),
        }
    }
}

/// Dispatch the request to every backend concurrently and merge whatever
/// settles. Each invocation runs under its own deadline; one backend's
/// failure or timeout never disturbs the others.
pub async fn consult(
    backends: &[Arc<dyn Backend>],
    request: &ReasoningRequest,
) -> AggregateResult {
    tracing::info!(count = backends.len(), "consulting backends");

    let invocations = backends
        .iter()
        .map(|backend| invoke_with_deadline(backend.as_ref(), request));
    let per_backend = join_all(invocations).await;

    let combined = combine(&per_backend);
    let answered = per_backend.iter().filter(|r| r.outcome.is_answer()).count();
    tracing::info!(answered, total = per_backend.len(), "consensus settled");

    AggregateResult {
        per_backend,
        combined,
    }
}

/// Build the combined text: one `## ID` section per success in input order,
/// then a single note listing every failure. None if nothing succeeded.
fn combine(results: &[BackendResult]) -> Option<String> {
    let mut sections = Vec::new();
    let mut failures = Vec::new();

    for result in results {
        match &result.outcome {
            Outcome::Answer(text) => {
                sections.push(format!("## {}\n\n{}", result.backend.to_uppercase(), text));
            }
            Outcome::Failure(reason) => {
                failures.push(format!("{}: {}", result.backend, reason));
            }
        }
    }

    if sections.is_empty() {
        return None;
    }
    if !failures.is_empty() {
        sections.push(format!("\n---\n*Note: {}*", failures.join("; ")));
    }
    Some(sections.join(SECTION_DIVIDER))
}

fn join_failures(results: &[BackendResult]) -> String {
    results
        .iter()
        .filter_map(|r| match &r.outcome {
            Outcome::Failure(reason) => Some(format!("{}: {}", r.backend, reason)),
            Outcome::Answer(_) => None,
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Depth;
    use crate::backend::mock::MockBackend;
    use std::time::Duration;

    fn request(timeout: Duration) -> ReasoningRequest {
        ReasoningRequest::new("p", Depth::High, timeout)
    }

    fn backends(list: Vec<MockBackend>) -> Vec<Arc<dyn Backend>> {
        list.into_iter()
            .map(|b| Arc::new(b) as Arc<dyn Backend>)
            .collect()
    }

    #[tokio::test]
    async fn both_succeed_sections_in_priority_order() {
        let pair = backends(vec![
            MockBackend::answering("chatgpt", "alpha"),
            MockBackend::answering("gemini", "beta"),
        ]);
        let result = consult(&pair, &request(Duration::from_secs(5))).await;

        assert!(result.succeeded());
        let combined = result.combined.unwrap();
        assert_eq!(combined, "## CHATGPT\n\nalpha\n\n---\n\n## GEMINI\n\nbeta");
    }

    #[tokio::test]
    async fn completion_order_does_not_affect_section_order() {
        // First backend finishes last.
        let pair = backends(vec![
            MockBackend::answering("chatgpt", "slow answer")
                .with_delay(Duration::from_millis(300)),
            MockBackend::answering("gemini", "fast answer"),
        ]);
        let result = consult(&pair, &request(Duration::from_secs(5))).await;

        let combined = result.combined.unwrap();
        let chatgpt_at = combined.find("## CHATGPT").unwrap();
        let gemini_at = combined.find("## GEMINI").unwrap();
        assert!(chatgpt_at < gemini_at);
    }

    #[tokio::test]
    async fn one_failure_becomes_a_note() {
        let pair = backends(vec![
            MockBackend::answering("chatgpt", "the answer"),
            MockBackend::failing("gemini", "GEMINI_API_KEY not set"),
        ]);
        let result = consult(&pair, &request(Duration::from_secs(5))).await;

        assert!(result.succeeded());
        let combined = result.combined.unwrap();
        assert!(combined.contains("## CHATGPT"));
        assert!(combined.contains("*Note: gemini: GEMINI_API_KEY not set*"));
        assert!(!combined.contains("## GEMINI"));
    }

    #[tokio::test]
    async fn all_failures_aggregate_every_reason() {
        let pair = backends(vec![
            MockBackend::failing("chatgpt", "codex exited with code 2"),
            MockBackend::failing("gemini", "empty response"),
        ]);
        let result = consult(&pair, &request(Duration::from_secs(5))).await;

        assert!(!result.succeeded());
        match result.into_outcome() {
            Outcome::Failure(reason) => {
                assert!(reason.contains("chatgpt: codex exited with code 2"));
                assert!(reason.contains("gemini: empty response"));
            }
            Outcome::Answer(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn timeout_on_one_does_not_disturb_the_other() {
        let pair = backends(vec![
            MockBackend::answering("chatgpt", "never arrives")
                .with_delay(Duration::from_secs(30)),
            MockBackend::answering("gemini", "still here"),
        ]);
        let result = consult(&pair, &request(Duration::from_secs(1))).await;

        assert!(result.succeeded());
        let combined = result.combined.unwrap();
        assert!(combined.contains("## GEMINI\n\nstill here"));
        assert!(combined.contains("chatgpt: timed out after 1s"));
    }

    #[tokio::test]
    async fn per_backend_preserves_dispatch_order_and_ids() {
        let pair = backends(vec![
            MockBackend::failing("chatgpt", "x"),
            MockBackend::answering("gemini", "y"),
        ]);
        let result = consult(&pair, &request(Duration::from_secs(5))).await;
        let ids: Vec<&str> = result.per_backend.iter().map(|r| r.backend.as_str()).collect();
        assert_eq!(ids, ["chatgpt", "gemini"]);
    }

    #[tokio::test]
    async fn single_backend_degenerate_case() {
        let one = backends(vec![MockBackend::answering("gemini", "solo")]);
        let result = consult(&one, &request(Duration::from_secs(5))).await;
        assert_eq!(result.combined.unwrap(), "## GEMINI\n\nsolo");
    }

    #[test]
    fn combine_success_then_note_layout() {
        let results = vec![
            BackendResult {
                backend: "chatgpt".to_string(),
                outcome: Outcome::Answer("body".to_string()),
            },
            BackendResult {
                backend: "gemini".to_string(),
                outcome: Outcome::Failure("down".to_string()),
            },
        ];
        let combined = combine(&results).unwrap();
        assert_eq!(
            combined,
            "## CHATGPT\n\nbody\n\n---\n\n\n---\n*Note: gemini: down*"
        );
    }

    #[test]
    fn combine_nothing_succeeded_is_none() {
        let results = vec![BackendResult {
            backend: "chatgpt".to_string(),
            outcome: Outcome::Failure("down".to_string()),
        }];
        assert!(combine(&results).is_none());
    }
}
