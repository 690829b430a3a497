//! Fixed-interval retry execution.
//!
//! A [`RetryExecutor`] re-invokes a unit of work until it succeeds, fails with a failure that is
//! not worth retrying, or exhausts its bound: a timeout measured from the first attempt, or a
//! maximum number of attempts. Failures are classified by kind through [`Classify`] and
//! [`RetryOn`]; the clock, the pause between attempts and the retry hook are injectable.
pub mod policies;
mod classify;
mod error;
mod executor;
mod observer;
mod retry_policy;
pub mod time;

pub use classify::{Classify, Failure, RetryOn};
pub use error::{RetryError, TIMED_OUT_MESSAGE};
pub use executor::{
    retry, retry_on_bool, retry_on_failure, retry_on_kind, retry_until, RetryExecutor,
    RetryExecutorBuilder,
};
pub use observer::{NoopObserver, RetryEvent, RetryObserver, TracingObserver};
pub use retry_policy::{RetryDecision, RetryPolicy};
