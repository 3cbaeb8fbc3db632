//! Queue drain monitor
//!
//! Blocks until the print queue has no pending jobs, a cancellation is
//! observed, or both. Query failures are expected while the spooler churns
//! (the queue object can vanish and reappear), so they are retried after a
//! backoff instead of being reported.

use crab_printer::{PrinterTarget, QueueStatusSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const RETRY_BACKOFF: Duration = Duration::from_millis(1000);

/// How a drain wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Drained,
    Cancelled,
}

pub struct QueueDrainMonitor {
    source: Arc<dyn QueueStatusSource>,
    poll_interval: Duration,
    retry_backoff: Duration,
}

impl QueueDrainMonitor {
    pub fn new(source: Arc<dyn QueueStatusSource>) -> Self {
        Self {
            source,
            poll_interval: POLL_INTERVAL,
            retry_backoff: RETRY_BACKOFF,
        }
    }

    pub fn with_intervals(mut self, poll_interval: Duration, retry_backoff: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.retry_backoff = retry_backoff;
        self
    }

    /// Wait for the queue to empty
    ///
    /// `on_job_count` fires only when the observed count differs from the
    /// previous poll (starting from zero), in observation order.
    /// `is_cancelled` is checked after every poll, successful or not.
    #[instrument(skip_all, fields(printer = %printer))]
    pub fn await_drain(
        &self,
        printer: &PrinterTarget,
        is_cancelled: impl Fn() -> bool,
        mut on_job_count: impl FnMut(u32),
    ) -> DrainOutcome {
        let mut last_count = 0u32;

        loop {
            match self.source.queue_status(printer) {
                Ok(status) => {
                    if status.pending_jobs != last_count {
                        last_count = status.pending_jobs;
                        on_job_count(last_count);
                    }
                    if last_count == 0 {
                        return DrainOutcome::Drained;
                    }
                    if is_cancelled() {
                        debug!(pending = last_count, "Drain wait cancelled");
                        return DrainOutcome::Cancelled;
                    }
                    std::thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    debug!(error = %e, "Queue status unavailable, retrying");
                    if is_cancelled() {
                        return DrainOutcome::Cancelled;
                    }
                    std::thread::sleep(self.retry_backoff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crab_printer::{PrintError, PrintResult, QueueStatus, SpoolOp};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted poll results, then reports an empty queue
    struct ScriptedQueue {
        script: Mutex<VecDeque<Option<u32>>>,
        polls: AtomicUsize,
    }

    impl ScriptedQueue {
        fn new(script: &[Option<u32>]) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.iter().copied().collect()),
                polls: AtomicUsize::new(0),
            })
        }
    }

    impl QueueStatusSource for ScriptedQueue {
        fn queue_status(&self, printer: &PrinterTarget) -> PrintResult<QueueStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(Some(pending_jobs)) => Ok(QueueStatus { pending_jobs }),
                Some(None) => Err(PrintError::Spooler {
                    printer: printer.name().to_string(),
                    op: SpoolOp::QueryStatus,
                    code: 1801,
                }),
                None => Ok(QueueStatus::default()),
            }
        }
    }

    fn monitor(source: Arc<ScriptedQueue>) -> QueueDrainMonitor {
        QueueDrainMonitor::new(source).with_intervals(Duration::from_millis(1), Duration::from_millis(1))
    }

    #[test]
    fn test_emits_only_changes() {
        let queue = ScriptedQueue::new(&[Some(3), Some(3), Some(2), Some(2), Some(1), Some(0)]);
        let mut seen = Vec::new();

        let outcome = monitor(queue.clone()).await_drain(&"p".into(), || false, |n| seen.push(n));

        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(seen, vec![3, 2, 1, 0]);
        assert_eq!(queue.polls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_already_empty_is_silent() {
        let queue = ScriptedQueue::new(&[]);
        let mut seen = Vec::new();

        let outcome = monitor(queue).await_drain(&"p".into(), || false, |n| seen.push(n));

        assert_eq!(outcome, DrainOutcome::Drained);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_query_failures_are_retried() {
        let queue = ScriptedQueue::new(&[None, Some(1), None, None, Some(0)]);
        let mut seen = Vec::new();

        let outcome = monitor(queue.clone()).await_drain(&"p".into(), || false, |n| seen.push(n));

        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(seen, vec![1, 0]);
        assert_eq!(queue.polls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_cancel_stops_stuck_queue() {
        let queue = ScriptedQueue::new(&[Some(4); 1000]);
        let polls = AtomicUsize::new(0);

        let outcome = monitor(queue).await_drain(
            &"p".into(),
            || polls.fetch_add(1, Ordering::SeqCst) >= 2,
            |_| {},
        );

        assert_eq!(outcome, DrainOutcome::Cancelled);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancel_during_failures() {
        let queue = ScriptedQueue::new(&[None; 1000]);

        let outcome = monitor(queue).await_drain(&"p".into(), || true, |_| {});

        assert_eq!(outcome, DrainOutcome::Cancelled);
    }
}
