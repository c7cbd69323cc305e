//! Wall-clock budget for a single backend invocation.

use crate::backend::{Backend, BackendResult, Outcome, ReasoningRequest};

/// Run one invocation under the request's deadline.
///
/// Exactly one of three outcomes comes back: the backend's answer, the
/// backend's own failure, or a timeout failure. On timeout the invocation
/// future is dropped, which cancels the in-flight work: a spawned child
/// process dies via kill_on_drop, an HTTP request is aborted with its
/// connection.
pub async fn invoke_with_deadline(
    backend: &dyn Backend,
    request: &ReasoningRequest,
) -> BackendResult {
    let outcome = match tokio::time::timeout(request.timeout, backend.invoke(request)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            let secs = request.timeout.as_secs();
            tracing::warn!(backend = backend.id(), secs, "backend timed out");
            Outcome::Failure(format!("timed out after {secs}s"))
        }
    };
    BackendResult {
        backend: backend.id().to_string(),
        outcome,
    }
}
