//! Clock and pause primitives used between attempts.
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time for deadline checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// `now + duration`, shrinking `duration` until the result is an instant the platform can
/// represent.
pub(crate) fn instant_after(now: Instant, duration: Duration) -> Instant {
    let mut duration = duration;
    loop {
        match now.checked_add(duration) {
            Some(instant) => return instant,
            None => duration /= 2,
        }
    }
}

/// The monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A pause between two attempts was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Suspends the calling thread between two attempts.
pub trait Sleeper: Send + Sync {
    /// Pause for `duration`, or return early with [`Interrupted`].
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;
}

/// Handle used to interrupt the pauses of a [`ThreadSleeper`] from another thread.
///
/// An interrupt is consumed by the pause it aborts. Raised while nobody is pausing, it
/// aborts the next pause.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    inner: Arc<InterruptState>,
}

#[derive(Debug, Default)]
struct InterruptState {
    raised: Mutex<bool>,
    wakeup: Condvar,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        *self.raised() = true;
        self.inner.wakeup.notify_all();
    }

    pub fn is_raised(&self) -> bool {
        *self.raised()
    }

    fn raised(&self) -> MutexGuard<'_, bool> {
        self.inner
            .raised
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait(&self, duration: Duration) -> Result<(), Interrupted> {
        // No representable deadline: wait until interrupted.
        let deadline = Instant::now().checked_add(duration);
        let mut raised = self.raised();
        loop {
            if *raised {
                *raised = false;
                return Err(Interrupted);
            }
            raised = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    self.inner
                        .wakeup
                        .wait_timeout(raised, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .inner
                    .wakeup
                    .wait(raised)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}

/// Blocks the calling thread, waking up early when its [`Interrupt`] is raised.
#[derive(Debug, Clone, Default)]
pub struct ThreadSleeper {
    interrupt: Interrupt,
}

impl ThreadSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sleeper whose pauses are aborted through `interrupt`.
    pub fn with_interrupt(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }

    pub fn interrupt_handle(&self) -> Interrupt {
        self.interrupt.clone()
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.interrupt.wait(duration)
    }
}

#[cfg(test)]
pub(crate) use mock::MockClock;
