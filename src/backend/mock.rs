use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Backend, Outcome, ReasoningRequest};

/// A scripted backend for tests. Returns pre-defined outcomes in order,
/// optionally sleeping first to simulate a slow provider.
pub struct MockBackend {
    id: String,
    outcomes: Vec<Outcome>,
    delay: Option<Duration>,
    index: AtomicUsize,
}

impl MockBackend {
    pub fn new(id: impl Into<String>, outcomes: Vec<Outcome>) -> Self {
        Self {
            id: id.into(),
            outcomes,
            delay: None,
            index: AtomicUsize::new(0),
        }
    }

    /// Single fixed answer.
    pub fn answering(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, vec![Outcome::Answer(text.into())])
    }

    /// Single fixed failure.
    pub fn failing(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(id, vec![Outcome::Failure(reason.into())])
    }

    /// Sleep this long before producing each outcome.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times invoke() has been called.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _request: &ReasoningRequest) -> Outcome {
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcomes.get(i) {
            Some(outcome) => outcome.clone(),
            None => Outcome::Failure(format!("mock: no more outcomes (called {} times)", i + 1)),
        }
    }
}
