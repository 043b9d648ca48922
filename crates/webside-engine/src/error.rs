//! Reflection errors
//!
//! Navigation and lookups fail with [`ReflectError::NotFound`] at the first step that
//! cannot be resolved. Malformed requests are [`ReflectError::BadRequest`]. A broken
//! runtime (cyclic hierarchy, missing kernel objects) is [`ReflectError::Fatal`] and
//! must be escalated by the caller instead of being answered as an ordinary failure.

/// Errors raised while navigating or querying the runtime
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    /// A class, method, object or slot lookup failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// A 1-based slot index outside `[1, size]`
    #[error("Index {index} out of range 1..={size}")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Number of addressable slots
        size: usize,
    },

    /// The request itself is malformed
    #[error("{0}")]
    BadRequest(String),

    /// The runtime is in a state the engine cannot work with
    #[error("Fatal runtime error: {0}")]
    Fatal(String),
}

impl ReflectError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        ReflectError::NotFound(what.into())
    }

    /// Shorthand for a `BadRequest` error
    pub fn bad_request(reason: impl Into<String>) -> Self {
        ReflectError::BadRequest(reason.into())
    }

    /// Shorthand for a `Fatal` error
    pub fn fatal(reason: impl Into<String>) -> Self {
        ReflectError::Fatal(reason.into())
    }

    /// Whether the error signals an unrecoverable environment
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReflectError::Fatal(_))
    }

    /// Fold an out-of-range access into `NotFound`, keeping every other error
    pub fn into_not_found(self) -> Self {
        match self {
            ReflectError::OutOfRange { index, size } => {
                ReflectError::NotFound(format!("slot {} (size {})", index, size))
            }
            other => other,
        }
    }
}

/// Result type for reflection operations
pub type ReflectResult<T> = Result<T, ReflectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_folds_into_not_found() {
        let err = ReflectError::OutOfRange { index: 4, size: 3 };
        assert!(matches!(err.into_not_found(), ReflectError::NotFound(_)));
    }

    #[test]
    fn test_fatal_is_kept_when_folding() {
        let err = ReflectError::fatal("cycle");
        assert!(err.clone().into_not_found().is_fatal());
        assert_eq!(err.to_string(), "Fatal runtime error: cycle");
    }
}
