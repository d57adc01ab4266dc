#![forbid(unsafe_code)]

//! Errors surfaced by model construction and notification.

/// Failure reported by an ear. Ears own their error type; the model only
/// carries it back to the caller of [`Model::set`](crate::Model::set) or
/// [`Model::hear`](crate::Model::hear).
pub type EarError = Box<dyn std::error::Error>;

/// One or more ears failed while handling a change of `key`.
///
/// Every ear registered for the key still ran; this collects the failures
/// in the order they occurred.
#[derive(Debug)]
pub struct HearError {
    key: String,
    failures: Vec<EarError>,
}

impl HearError {
    pub(crate) fn new(key: impl Into<String>, failures: Vec<EarError>) -> Self {
        Self {
            key: key.into(),
            failures,
        }
    }

    /// The key whose notification cycle failed.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn failures(&self) -> &[EarError] {
        &self.failures
    }

    /// Take ownership of the collected failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<EarError> {
        self.failures
    }
}

impl std::fmt::Display for HearError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.failures.as_slice() {
            [] => write!(f, "notification for '{}' failed", self.key),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(
                f,
                "{first} (and {} more failures for '{}')",
                rest.len(),
                self.key
            ),
        }
    }
}

impl std::error::Error for HearError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures.first().map(|err| err.as_ref() as _)
    }
}

/// Errors from building a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Models wrap a JSON object; any other JSON value was supplied.
    NotAnObject(&'static str),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject(kind) => write!(f, "model state must be an object, got {kind}"),
        }
    }
}

impl std::error::Error for ModelError {}
