use crate::error::TIMED_OUT_MESSAGE;
use crate::policies::FixedInterval;
use crate::time::{Clock, Interrupt, Sleeper, SystemClock, ThreadSleeper};
use crate::{
    Classify, NoopObserver, RetryDecision, RetryError, RetryEvent, RetryObserver, RetryOn,
    RetryPolicy,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Runs units of work in a bounded retry loop.
///
/// The executor holds no per-session state: it can be cloned and shared between threads,
/// and concurrent sessions do not interact.
///
/// # Example
///
/// ```rust
/// use retry_executor::{Failure, RetryExecutor, RetryOn};
/// use std::time::Duration;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Kind {
///     NoNode,
/// }
///
/// let executor = RetryExecutor::default();
/// let mut calls = 0;
/// let value = executor
///     .retry(
///         &RetryOn::kind(Kind::NoNode),
///         Duration::from_secs(1),
///         Duration::from_millis(1),
///         || {
///             calls += 1;
///             if calls < 3 {
///                 Err(Failure::msg(Kind::NoNode, "node not created yet"))
///             } else {
///                 Ok("created")
///             }
///         },
///     )
///     .unwrap();
///
/// assert_eq!(value, "created");
/// assert_eq!(calls, 3);
/// ```
#[derive(Clone)]
pub struct RetryExecutor {
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    interrupt: Option<Interrupt>,
    observer: Arc<dyn RetryObserver>,
}

/// Builds a [`RetryExecutor`].
pub struct RetryExecutorBuilder {
    clock: Arc<dyn Clock>,
    sleeper: Option<Arc<dyn Sleeper>>,
    interrupt: Interrupt,
    observer: Arc<dyn RetryObserver>,
}

/// Outcome of a boolean unit of work that returned `false`.
struct Unsuccessful;

impl Classify for Unsuccessful {
    type Kind = &'static str;

    fn kind(&self) -> &'static str {
        "unsuccessful"
    }
}

impl fmt::Display for Unsuccessful {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation returned false")
    }
}

impl RetryExecutor {
    pub fn builder() -> RetryExecutorBuilder {
        <_>::default()
    }

    /// Handle interrupting the pauses of this executor and of its clones.
    ///
    /// `None` when the executor was built with a custom [`Sleeper`].
    pub fn interrupt_handle(&self) -> Option<Interrupt> {
        self.interrupt.clone()
    }

    /// Retry `work` on failures of a kind in `retry_on`, pausing `interval` between attempts,
    /// until `timeout` has elapsed since the first attempt started.
    ///
    /// A failure of any other kind is returned straight away, whatever the time left. Once
    /// the timeout has elapsed the last failure is returned as is.
    pub fn retry<T, E, W>(
        &self,
        retry_on: &RetryOn<E::Kind>,
        timeout: Duration,
        interval: Duration,
        work: W,
    ) -> Result<T, RetryError<E>>
    where
        E: Classify + fmt::Display,
        W: FnMut() -> Result<T, E>,
    {
        let policy = FixedInterval::builder()
            .interval(interval)
            .build_with_timeout(timeout)
            .for_task_started_at(self.clock.now());

        self.run(&policy, work, |kind| retry_on.contains(kind))
    }

    /// [`retry`](Self::retry) for work that produces no value.
    pub fn retry_on_failure<E, W>(
        &self,
        retry_on: &RetryOn<E::Kind>,
        timeout: Duration,
        interval: Duration,
        work: W,
    ) -> Result<(), RetryError<E>>
    where
        E: Classify + fmt::Display,
        W: FnMut() -> Result<(), E>,
    {
        self.retry(retry_on, timeout, interval, work)
    }

    /// [`retry`](Self::retry) on a single kind of failure.
    pub fn retry_on_kind<T, E, W>(
        &self,
        kind: E::Kind,
        timeout: Duration,
        interval: Duration,
        work: W,
    ) -> Result<T, RetryError<E>>
    where
        E: Classify + fmt::Display,
        W: FnMut() -> Result<T, E>,
    {
        self.retry(&RetryOn::kind(kind), timeout, interval, work)
    }

    /// Call `work` until it returns `true`, at most `max_attempts` times, pausing `pause`
    /// between two calls.
    ///
    /// Fails with [`RetryError::ServerError`] carrying `message` when every attempt returned
    /// `false`.
    pub fn retry_until<M, W>(
        &self,
        message: M,
        max_attempts: u32,
        pause: Duration,
        mut work: W,
    ) -> Result<(), RetryError>
    where
        M: Into<String>,
        W: FnMut() -> bool,
    {
        let policy = FixedInterval::builder()
            .interval(pause)
            .build_with_max_attempts(max_attempts);

        self.run_bool(&policy, &mut work, message.into())
    }

    /// Call `work` until it returns `true`, pausing `interval` between two calls, until
    /// `timeout` has elapsed since the first call started.
    ///
    /// Fails with [`RetryError::ServerError`] and the message
    /// [`TIMED_OUT_MESSAGE`](crate::TIMED_OUT_MESSAGE) when the timeout elapses first.
    pub fn retry_on_bool<W>(
        &self,
        timeout: Duration,
        interval: Duration,
        mut work: W,
    ) -> Result<(), RetryError>
    where
        W: FnMut() -> bool,
    {
        let policy = FixedInterval::builder()
            .interval(interval)
            .build_with_timeout(timeout)
            .for_task_started_at(self.clock.now());

        self.run_bool(&policy, &mut work, TIMED_OUT_MESSAGE.to_owned())
    }

    fn run_bool<P, W>(&self, policy: &P, work: &mut W, message: String) -> Result<(), RetryError>
    where
        P: RetryPolicy,
        W: FnMut() -> bool,
    {
        let outcome = self.run(
            policy,
            || if work() { Ok(()) } else { Err(Unsuccessful) },
            |_: &&'static str| true,
        );

        match outcome {
            Ok(()) => Ok(()),
            Err(RetryError::Failed(Unsuccessful)) => {
                tracing::debug!(%message, "Giving up on unsuccessful operation");
                Err(RetryError::ServerError { message })
            }
            Err(RetryError::ServerError { message }) => Err(RetryError::ServerError { message }),
            Err(RetryError::Interrupted) => Err(RetryError::Interrupted),
        }
    }

    fn run<T, E, P, W, C>(
        &self,
        policy: &P,
        mut work: W,
        is_retryable: C,
    ) -> Result<T, RetryError<E>>
    where
        E: Classify + fmt::Display,
        P: RetryPolicy,
        W: FnMut() -> Result<T, E>,
        C: Fn(&E::Kind) -> bool,
    {
        let mut n_past_attempts: u32 = 0;
        loop {
            let failure = match work() {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };
            n_past_attempts = n_past_attempts.saturating_add(1);

            let kind = failure.kind();
            if !is_retryable(&kind) {
                return Err(RetryError::Failed(failure));
            }

            let now = self.clock.now();
            let execute_after = match policy.should_retry(now, n_past_attempts) {
                RetryDecision::Retry { execute_after } => execute_after,
                RetryDecision::DoNotRetry => {
                    tracing::debug!(
                        attempts = n_past_attempts,
                        kind = ?kind,
                        "Retry bound exhausted: {}",
                        failure
                    );
                    return Err(RetryError::Failed(failure));
                }
            };

            let wait = execute_after.saturating_duration_since(now);
            self.observer.on_retry(&RetryEvent {
                attempt: n_past_attempts,
                kind: &kind,
                message: &failure,
                wait,
            });

            if self.sleeper.sleep(wait).is_err() {
                tracing::debug!(attempts = n_past_attempts, "Retry pause interrupted");
                return Err(RetryError::Interrupted);
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        RetryExecutorBuilder::default().build()
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("clock", &"<clock>")
            .field("sleeper", &"<sleeper>")
            .field("interrupt", &self.interrupt)
            .field("observer", &"<observer>")
            .finish()
    }
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            sleeper: None,
            interrupt: Interrupt::new(),
            observer: Arc::new(NoopObserver),
        }
    }
}

impl RetryExecutorBuilder {
    /// Set the clock deadlines are read from. _Default [`SystemClock`]_.
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Set how pauses between attempts are taken. _Default [`ThreadSleeper`]_.
    ///
    /// A custom sleeper handles interruption on its own: [`interrupt`](Self::interrupt) no
    /// longer applies.
    pub fn sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Some(Arc::new(sleeper));
        self
    }

    /// Set the handle that interrupts the default [`ThreadSleeper`]. _Default a fresh
    /// [`Interrupt`]_, available through [`RetryExecutor::interrupt_handle`].
    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Set the hook notified on each retry decision. _Default [`NoopObserver`]_.
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: RetryObserver + 'static,
    {
        self.observer = Arc::new(observer);
        self
    }

    pub fn build(self) -> RetryExecutor {
        let (sleeper, interrupt) = match self.sleeper {
            Some(sleeper) => (sleeper, None),
            None => {
                let sleeper: Arc<dyn Sleeper> =
                    Arc::new(ThreadSleeper::with_interrupt(self.interrupt.clone()));
                (sleeper, Some(self.interrupt))
            }
        };

        RetryExecutor {
            clock: self.clock,
            sleeper,
            interrupt,
            observer: self.observer,
        }
    }
}

/// [`RetryExecutor::retry`] on a default executor.
///
/// The pauses of the default executor cannot be interrupted. Build a [`RetryExecutor`] and
/// keep its [`interrupt_handle`](RetryExecutor::interrupt_handle) to cancel a session.
pub fn retry<T, E, W>(
    retry_on: &RetryOn<E::Kind>,
    timeout: Duration,
    interval: Duration,
    work: W,
) -> Result<T, RetryError<E>>
where
    E: Classify + fmt::Display,
    W: FnMut() -> Result<T, E>,
{
    RetryExecutor::default().retry(retry_on, timeout, interval, work)
}

/// [`RetryExecutor::retry_on_failure`] on a default executor.
///
/// The pauses of the default executor cannot be interrupted. Build a [`RetryExecutor`] and
/// keep its [`interrupt_handle`](RetryExecutor::interrupt_handle) to cancel a session.
pub fn retry_on_failure<E, W>(
    retry_on: &RetryOn<E::Kind>,
    timeout: Duration,
    interval: Duration,
    work: W,
) -> Result<(), RetryError<E>>
where
    E: Classify + fmt::Display,
    W: FnMut() -> Result<(), E>,
{
    RetryExecutor::default().retry_on_failure(retry_on, timeout, interval, work)
}

/// [`RetryExecutor::retry_on_kind`] on a default executor.
///
/// The pauses of the default executor cannot be interrupted. Build a [`RetryExecutor`] and
/// keep its [`interrupt_handle`](RetryExecutor::interrupt_handle) to cancel a session.
pub fn retry_on_kind<T, E, W>(
    kind: E::Kind,
    timeout: Duration,
    interval: Duration,
    work: W,
) -> Result<T, RetryError<E>>
where
    E: Classify + fmt::Display,
    W: FnMut() -> Result<T, E>,
{
    RetryExecutor::default().retry_on_kind(kind, timeout, interval, work)
}

/// [`RetryExecutor::retry_until`] on a default executor.
///
/// The pauses of the default executor cannot be interrupted. Build a [`RetryExecutor`] and
/// keep its [`interrupt_handle`](RetryExecutor::interrupt_handle) to cancel a session.
pub fn retry_until<M, W>(
    message: M,
    max_attempts: u32,
    pause: Duration,
    work: W,
) -> Result<(), RetryError>
where
    M: Into<String>,
    W: FnMut() -> bool,
{
    RetryExecutor::default().retry_until(message, max_attempts, pause, work)
}

/// [`RetryExecutor::retry_on_bool`] on a default executor.
///
/// The pauses of the default executor cannot be interrupted. Build a [`RetryExecutor`] and
/// keep its [`interrupt_handle`](RetryExecutor::interrupt_handle) to cancel a session.
pub fn retry_on_bool<W>(timeout: Duration, interval: Duration, work: W) -> Result<(), RetryError>
where
    W: FnMut() -> bool,
{
    RetryExecutor::default().retry_on_bool(timeout, interval, work)
}
