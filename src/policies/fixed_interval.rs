use crate::time::instant_after;
use crate::{RetryDecision, RetryPolicy};
use std::time::{Duration, Instant};

/// Fixed-interval retries bounded by a number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct FixedInterval {
    /// Maximum number of attempts, the first one included.
    pub max_n_attempts: u32,
    /// Waiting time between two attempts.
    pub retry_interval: Duration,
}

/// Fixed-interval retries bounded by a total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedIntervalTimed {
    retry_interval: Duration,
    timeout: Duration,
}

/// Fixed-interval retries bounded by a total duration, for a task with a known start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedIntervalWithDeadline {
    retry_interval: Duration,
    deadline: Option<Instant>,
}

/// Builds a fixed-interval policy.
///
/// # Example
///
/// ```rust
/// use retry_executor::{RetryDecision, RetryPolicy};
/// use retry_executor::policies::FixedInterval;
/// use std::time::{Duration, Instant};
///
/// let started_at = Instant::now();
/// let policy = FixedInterval::builder()
///     .interval(Duration::from_millis(100))
///     .build_with_timeout(Duration::from_secs(5))
///     .for_task_started_at(started_at);
///
/// assert_eq!(
///     policy.should_retry(started_at, 1),
///     RetryDecision::Retry { execute_after: started_at + Duration::from_millis(100) }
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedIntervalBuilder {
    retry_interval: Duration,
}

impl FixedInterval {
    /// Returns a builder.
    ///
    /// # Example
    /// ```
    /// use retry_executor::policies::FixedInterval;
    /// use std::time::Duration;
    ///
    /// let policy = FixedInterval::builder()
    ///     .build_with_max_attempts(5);
    ///
    /// assert_eq!(policy.retry_interval, Duration::from_secs(1));
    /// assert_eq!(policy.max_n_attempts, 5);
    /// ```
    pub fn builder() -> FixedIntervalBuilder {
        <_>::default()
    }

    fn too_many_attempts(&self, n_past_attempts: u32) -> bool {
        self.max_n_attempts <= n_past_attempts
    }
}

impl RetryPolicy for FixedInterval {
    fn should_retry(&self, now: Instant, n_past_attempts: u32) -> RetryDecision {
        if self.too_many_attempts(n_past_attempts) {
            RetryDecision::DoNotRetry
        } else {
            RetryDecision::Retry {
                execute_after: instant_after(now, self.retry_interval),
            }
        }
    }
}

impl FixedIntervalTimed {
    /// Fix the deadline of a session that started at `started_at`.
    ///
    /// A timeout too large to be represented as an instant never expires.
    pub fn for_task_started_at(&self, started_at: Instant) -> FixedIntervalWithDeadline {
        FixedIntervalWithDeadline {
            retry_interval: self.retry_interval,
            deadline: started_at.checked_add(self.timeout),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl FixedIntervalWithDeadline {
    /// The instant after which no further retries are made, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn trying_for_too_long(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

impl RetryPolicy for FixedIntervalWithDeadline {
    fn should_retry(&self, now: Instant, _n_past_attempts: u32) -> RetryDecision {
        if self.trying_for_too_long(now) {
            RetryDecision::DoNotRetry
        } else {
            RetryDecision::Retry {
                execute_after: instant_after(now, self.retry_interval),
            }
        }
    }
}

impl Default for FixedIntervalBuilder {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(1),
        }
    }
}

impl FixedIntervalBuilder {
    /// Set the pause between two attempts. _Default 1s_.
    pub fn interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Builds a [`FixedInterval`] allowing at most `n` attempts.
    ///
    /// An `n` of zero still allows the first attempt.
    pub fn build_with_max_attempts(self, n: u32) -> FixedInterval {
        FixedInterval {
            max_n_attempts: n.max(1),
            retry_interval: self.retry_interval,
        }
    }

    /// Builds a [`FixedIntervalTimed`] that keeps retrying until `timeout` has elapsed
    /// since the start of the task.
    ///
    /// Requires the use of [`FixedIntervalTimed::for_task_started_at()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use retry_executor::{RetryDecision, RetryPolicy};
    /// use retry_executor::policies::FixedInterval;
    /// use std::time::{Duration, Instant};
    ///
    /// let policy = FixedInterval::builder()
    ///     .build_with_timeout(Duration::from_secs(60));
    ///
    /// let started_at = Instant::now();
    /// let later = started_at + Duration::from_secs(61);
    ///
    /// assert_eq!(
    ///     policy.for_task_started_at(started_at).should_retry(later, 1),
    ///     RetryDecision::DoNotRetry
    /// );
    /// ```
    pub fn build_with_timeout(self, timeout: Duration) -> FixedIntervalTimed {
        FixedIntervalTimed {
            retry_interval: self.retry_interval,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;

    fn get_retry_policy() -> FixedInterval {
        FixedInterval::builder()
            .interval(Duration::from_millis(250))
            .build_with_max_attempts(6)
    }

    #[test]
    fn if_n_past_attempts_is_below_maximum_it_decides_to_retry() {
        // Arrange
        let policy = get_retry_policy();
        let n_past_attempts = (1..policy.max_n_attempts).fake();
        let now = Instant::now();

        // Act
        let decision = policy.should_retry(now, n_past_attempts);

        // Assert
        assert_eq!(
            decision,
            RetryDecision::Retry {
                execute_after: now + policy.retry_interval
            }
        );
    }

    #[test]
    fn if_n_past_attempts_reaches_maximum_it_decides_to_give_up() {
        // Arrange
        let policy = get_retry_policy();
        let n_past_attempts = (policy.max_n_attempts..).fake();

        // Act
        let decision = policy.should_retry(Instant::now(), n_past_attempts);

        // Assert
        assert_eq!(decision, RetryDecision::DoNotRetry);
    }

    #[test]
    fn zero_max_attempts_still_allows_the_first_attempt() {
        let policy = FixedInterval::builder().build_with_max_attempts(0);

        assert_eq!(policy.max_n_attempts, 1);
        assert_eq!(
            policy.should_retry(Instant::now(), 1),
            RetryDecision::DoNotRetry
        );
    }

    #[test]
    fn retries_while_the_deadline_has_not_passed() {
        // Arrange
        let started_at = Instant::now();
        let policy = FixedInterval::builder()
            .interval(Duration::from_millis(100))
            .build_with_timeout(Duration::from_millis(500))
            .for_task_started_at(started_at);
        let elapsed_ms: u64 = (0u64..500).fake();
        let now = started_at + Duration::from_millis(elapsed_ms);

        // Act
        let decision = policy.should_retry(now, u32::MAX);

        // Assert
        assert_eq!(
            decision,
            RetryDecision::Retry {
                execute_after: now + Duration::from_millis(100)
            }
        );
    }

    #[test]
    fn does_not_retry_at_or_after_the_deadline() {
        let started_at = Instant::now();
        let policy = FixedInterval::builder()
            .build_with_timeout(Duration::from_millis(500))
            .for_task_started_at(started_at);

        let deadline = started_at + Duration::from_millis(500);

        assert_eq!(policy.deadline(), Some(deadline));
        assert_eq!(policy.should_retry(deadline, 1), RetryDecision::DoNotRetry);
        assert_eq!(
            policy.should_retry(deadline + Duration::from_secs(1), 1),
            RetryDecision::DoNotRetry
        );
    }

    #[test]
    fn zero_timeout_never_retries() {
        let started_at = Instant::now();
        let policy = FixedInterval::builder()
            .build_with_timeout(Duration::ZERO)
            .for_task_started_at(started_at);

        assert_eq!(
            policy.should_retry(started_at, 1),
            RetryDecision::DoNotRetry
        );
    }

    #[test]
    fn unrepresentable_timeout_never_expires() {
        // Arrange
        let started_at = Instant::now();
        let policy = FixedInterval::builder()
            .interval(Duration::from_millis(100))
            .build_with_timeout(Duration::MAX)
            .for_task_started_at(started_at);
        let now = started_at + Duration::from_secs(365 * 24 * 60 * 60);

        // Act
        let decision = policy.should_retry(now, 1);

        // Assert
        assert_eq!(policy.deadline(), None);
        assert_eq!(
            decision,
            RetryDecision::Retry {
                execute_after: now + Duration::from_millis(100)
            }
        );
    }

    #[test]
    fn huge_interval_is_capped_instead_of_overflowing() {
        let now = Instant::now();
        let policy = FixedInterval::builder()
            .interval(Duration::from_secs(u64::MAX))
            .build_with_max_attempts(3);

        match policy.should_retry(now, 1) {
            RetryDecision::Retry { execute_after } => assert!(execute_after > now),
            RetryDecision::DoNotRetry => panic!("Expected Retry decision."),
        }
    }
}
