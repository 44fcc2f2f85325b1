//! Generic polling loop trait and runner.
//!
//! The consumer side of the pipeline is a poll-process-sleep loop that must
//! survive any transient failure: a failed poll or a failed iteration is
//! logged and followed by the normal sleep, never a crash. The loop ends
//! only when the shutdown token fires.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Result of a single processing iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationResult {
    /// Items were processed.
    ProcessedItems,
    /// No items were available to process.
    NoItems,
}

/// Trait for implementing a polling-based processor.
#[async_trait]
pub trait PollingProcessor {
    /// The state type prepared for each iteration.
    type State: Send;
    /// The error type for this processor.
    type Error: std::error::Error + Send;

    /// Fetch work for one iteration.
    ///
    /// Returns `None` when there is nothing to do this cycle.
    async fn prepare(&mut self) -> Result<Option<Self::State>, Self::Error>;

    /// Process the prepared state.
    async fn process(&mut self, state: Self::State) -> Result<IterationResult, Self::Error>;
}

/// Run a polling loop with the given processor until shutdown.
///
/// Each cycle: `prepare()`, then `process()` if there is work, then sleep
/// for `poll_interval`. Errors from either phase are logged and absorbed;
/// unprocessed work is left where it is (for a queue consumer, unacked
/// entries redeliver on their own).
pub async fn run_polling_loop<P: PollingProcessor>(
    processor: &mut P,
    poll_interval: Duration,
    shutdown: CancellationToken,
) {
    loop {
        let state = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("Shutdown requested during poll");
                return;
            }

            result = processor.prepare() => match result {
                Ok(state) => state,
                Err(e) => {
                    error!(error = %e, "Poll failed, retrying after interval");
                    None
                }
            },
        };

        match state {
            Some(state) => match processor.process(state).await {
                Ok(IterationResult::ProcessedItems) => debug!("Iteration complete"),
                Ok(IterationResult::NoItems) => {}
                Err(e) => {
                    error!(error = %e, "Iteration failed, unacknowledged entries will redeliver")
                }
            },
            None => debug!(
                "No items, waiting {}s before next poll",
                poll_interval.as_secs()
            ),
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested during poll wait");
                return;
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct TestError;

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test error")
        }
    }

    impl std::error::Error for TestError {}

    /// Processor that follows a script of prepare outcomes and cancels the
    /// loop once the script is exhausted.
    struct Scripted {
        script: Vec<Result<Option<u32>, TestError>>,
        prepared: usize,
        processed: Vec<u32>,
        shutdown: CancellationToken,
    }

    #[async_trait]
    impl PollingProcessor for Scripted {
        type State = u32;
        type Error = TestError;

        async fn prepare(&mut self) -> Result<Option<u32>, TestError> {
            if self.prepared >= self.script.len() {
                self.shutdown.cancel();
                return Ok(None);
            }
            let step = self.script[self.prepared].as_ref();
            self.prepared += 1;
            match step {
                Ok(state) => Ok(*state),
                Err(_) => Err(TestError),
            }
        }

        async fn process(&mut self, state: u32) -> Result<IterationResult, TestError> {
            self.processed.push(state);
            if state == 99 {
                return Err(TestError);
            }
            Ok(IterationResult::ProcessedItems)
        }
    }

    #[tokio::test]
    async fn test_loop_processes_until_shutdown() {
        let shutdown = CancellationToken::new();
        let mut processor = Scripted {
            script: vec![Ok(Some(1)), Ok(None), Ok(Some(2))],
            prepared: 0,
            processed: Vec::new(),
            shutdown: shutdown.clone(),
        };

        run_polling_loop(&mut processor, Duration::from_millis(1), shutdown).await;

        assert_eq!(processor.prepared, 3);
        assert_eq!(processor.processed, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_loop_survives_errors() {
        let shutdown = CancellationToken::new();
        let mut processor = Scripted {
            script: vec![Err(TestError), Ok(Some(99)), Ok(Some(3))],
            prepared: 0,
            processed: Vec::new(),
            shutdown: shutdown.clone(),
        };

        run_polling_loop(&mut processor, Duration::from_millis(1), shutdown).await;

        // Both the poll error and the process error are absorbed.
        assert_eq!(processor.prepared, 3);
        assert_eq!(processor.processed, vec![99, 3]);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_immediately() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let mut processor = Scripted {
            script: vec![Ok(Some(1))],
            prepared: 0,
            processed: Vec::new(),
            shutdown: shutdown.clone(),
        };

        run_polling_loop(&mut processor, Duration::from_millis(1), shutdown).await;

        assert!(processor.processed.is_empty());
    }
}
