use std::fmt;
use std::time::Duration;

/// A retry decision, reported right before the pause that precedes the next attempt.
#[derive(Clone, Copy)]
pub struct RetryEvent<'a> {
    /// Number of the attempt that just failed, starting at 1.
    pub attempt: u32,
    /// Kind of the failure that triggered the retry.
    pub kind: &'a dyn fmt::Debug,
    /// Message of the failure that triggered the retry.
    pub message: &'a dyn fmt::Display,
    /// Pause taken before the next attempt.
    pub wait: Duration,
}

impl fmt::Debug for RetryEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryEvent")
            .field("attempt", &self.attempt)
            .field("kind", self.kind)
            .field("message", &format_args!("{}", self.message))
            .field("wait", &self.wait)
            .finish()
    }
}

/// Hook notified on every retry decision.
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, event: &RetryEvent<'_>);
}

/// Ignores every retry decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn on_retry(&self, _event: &RetryEvent<'_>) {}
}

/// Reports retry decisions as `tracing` events at `INFO` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, event: &RetryEvent<'_>) {
        tracing::info!(
            attempt = event.attempt,
            kind = ?event.kind,
            wait_ms = event.wait.as_millis() as u64,
            "Retry due to failure: {}",
            event.message
        );
    }
}

impl<F> RetryObserver for F
where
    F: Fn(&RetryEvent<'_>) + Send + Sync,
{
    fn on_retry(&self, event: &RetryEvent<'_>) {
        self(event)
    }
}
