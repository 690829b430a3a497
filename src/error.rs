use std::convert::Infallible;

/// Message of the failure raised when a boolean operation runs out of time.
pub const TIMED_OUT_MESSAGE: &str = "timed out while retrying operation";

/// Terminal failure of a retry session.
///
/// Boolean operations carry no failure of their own and use the default `E = Infallible`.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E = Infallible> {
    /// The work failed with a non-retryable failure, or with a retryable one once the bound
    /// was exhausted.
    #[error("{0}")]
    Failed(E),
    /// The bound was exhausted while the work kept reporting an unsuccessful outcome.
    #[error("server error: {message}")]
    ServerError { message: String },
    /// A pause between two attempts was interrupted.
    #[error("interrupted while pausing between attempts")]
    Interrupted,
}

impl<E> RetryError<E> {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, RetryError::Interrupted)
    }

    /// The work's own failure, if that is what ended the session.
    pub fn into_failure(self) -> Option<E> {
        match self {
            RetryError::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// The message of an engine-detected exhaustion.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            RetryError::ServerError { message } => Some(message.as_str()),
            _ => None,
        }
    }
}
