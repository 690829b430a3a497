use std::time::Instant;

/// A policy for deciding whether and when to retry.
pub trait RetryPolicy {
    /// Determine if a task should be retried according to a retry policy.
    ///
    /// `n_past_attempts` is the number of attempts already made in the current session.
    fn should_retry(&self, now: Instant, n_past_attempts: u32) -> RetryDecision;
}

/// Outcome of evaluating a retry policy for a failed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified instant.
    Retry { execute_after: Instant },
    /// Give up.
    DoNotRetry,
}
