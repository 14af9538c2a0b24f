//! Scripted flow runner for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FlowError;
use crate::output::FlowOutput;
use crate::{FlowRunner, RunOptions};

/// A recorded call to [`MockFlowRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub flow_id: String,
    pub input: String,
    pub options: RunOptions,
}

/// Flow runner that replays scripted results.
///
/// Queued results are consumed in order; once the queue is empty every call
/// returns the fallback result.
pub struct MockFlowRunner {
    queue: Mutex<VecDeque<Result<FlowOutput, FlowError>>>,
    fallback: Result<FlowOutput, FlowError>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<RecordedRun>>,
}

impl MockFlowRunner {
    /// Every run answers with `text` as the chat output.
    pub fn replying(text: &str) -> Self {
        Self::with_fallback(Ok(FlowOutput::from_chat_text(text)))
    }

    /// Every run fails with `err`.
    pub fn failing(err: FlowError) -> Self {
        Self::with_fallback(Err(err))
    }

    pub fn with_fallback(fallback: Result<FlowOutput, FlowError>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-shot result ahead of the fallback.
    pub fn push(&self, result: Result<FlowOutput, FlowError>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(result);
        }
    }

    /// Number of runs so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every run so far, oldest first.
    pub fn recorded(&self) -> Vec<RecordedRun> {
        self.recorded.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FlowRunner for MockFlowRunner {
    async fn run(
        &self,
        flow_id: &str,
        input: &str,
        options: &RunOptions,
    ) -> Result<FlowOutput, FlowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(RecordedRun {
                flow_id: flow_id.to_string(),
                input: input.to_string(),
                options: options.clone(),
            });
        }

        let next = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_queue_then_fallback() {
        let mock = MockFlowRunner::replying("fallback");
        mock.push(Err(FlowError::Transport("down".to_string())));

        let first = mock.run("f", "a", &RunOptions::chat(None)).await;
        assert_eq!(first, Err(FlowError::Transport("down".to_string())));

        let second = mock.run("f", "b", &RunOptions::chat(None)).await.unwrap();
        assert_eq!(second.chat_output_text().as_deref(), Some("fallback"));

        assert_eq!(mock.calls(), 2);
        let recorded = mock.recorded();
        assert_eq!(recorded[0].input, "a");
        assert_eq!(recorded[1].input, "b");
    }
}
