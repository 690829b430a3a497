//! Failure classification.
//!
//! The executor never looks at a failure beyond its kind tag: a failure is retryable when its
//! [`Classify::kind`] belongs to the [`RetryOn`] set supplied by the caller.
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// A failure that can report which kind of failure it is.
pub trait Classify {
    type Kind: Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// The set of failure kinds worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOn<K: Eq + Hash> {
    kinds: HashSet<K>,
}

impl<K: Eq + Hash> RetryOn<K> {
    /// Retry on a single kind of failure.
    pub fn kind(kind: K) -> Self {
        Self {
            kinds: HashSet::from([kind]),
        }
    }

    /// Retry on any of the given kinds.
    ///
    /// Panics if `kinds` is empty.
    pub fn any_of<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let kinds: HashSet<K> = kinds.into_iter().collect();
        assert!(
            !kinds.is_empty(),
            "At least one failure kind is required to decide what to retry on."
        );
        Self { kinds }
    }

    pub fn contains(&self, kind: &K) -> bool {
        self.kinds.contains(kind)
    }

    /// Whether `failure` is of a retryable kind.
    pub fn matches<E>(&self, failure: &E) -> bool
    where
        E: Classify<Kind = K>,
    {
        self.contains(&failure.kind())
    }

    /// Number of distinct retryable kinds, always at least one.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false`: a `RetryOn` holds at least one kind.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// A kind-tagged failure wrapping an arbitrary error.
///
/// Lets work that fails with heterogeneous errors be classified without defining a
/// dedicated error enum.
///
/// ```rust
/// use retry_executor::{Classify, Failure};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Kind {
///     Transient,
/// }
///
/// let failure = Failure::msg(Kind::Transient, "connection reset");
/// assert_eq!(failure.kind(), Kind::Transient);
/// assert_eq!(failure.to_string(), "connection reset");
/// ```
pub struct Failure<K> {
    kind: K,
    error: anyhow::Error,
}

impl<K> Failure<K> {
    pub fn new<E>(kind: K, error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }

    pub fn msg<M>(kind: K, message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            kind,
            error: anyhow::Error::msg(message),
        }
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl<K> Classify for Failure<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Kind = K;

    fn kind(&self) -> K {
        self.kind.clone()
    }
}

impl<K: fmt::Debug> fmt::Debug for Failure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind)
            .field("error", &self.error)
            .finish()
    }
}

impl<K> fmt::Display for Failure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<K: fmt::Debug> std::error::Error for Failure<K> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Transient,
        Conflict,
        Fatal,
    }

    #[test]
    fn single_kind_matches_only_that_kind() {
        let retry_on = RetryOn::kind(Kind::Transient);

        assert_eq!(retry_on.len(), 1);
        assert!(retry_on.matches(&Failure::msg(Kind::Transient, "blip")));
        assert!(!retry_on.matches(&Failure::msg(Kind::Fatal, "boom")));
    }

    #[test]
    fn any_of_matches_every_listed_kind() {
        let retry_on = RetryOn::any_of([Kind::Transient, Kind::Conflict, Kind::Transient]);

        assert_eq!(retry_on.len(), 2);
        assert!(!retry_on.is_empty());
        assert!(retry_on.contains(&Kind::Transient));
        assert!(retry_on.contains(&Kind::Conflict));
        assert!(!retry_on.contains(&Kind::Fatal));
    }

    #[test]
    #[should_panic]
    fn empty_kind_set_is_rejected() {
        RetryOn::<Kind>::any_of([]);
    }

    #[test]
    fn failure_keeps_the_wrapped_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");

        let failure = Failure::new(Kind::Transient, io);

        assert_eq!(failure.kind(), Kind::Transient);
        assert_eq!(failure.to_string(), "reset by peer");
        assert!(failure.error().downcast_ref::<std::io::Error>().is_some());
    }
}
