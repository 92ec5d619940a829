//! Errors raised by storage, location parsing and retry configuration.

/// The result type used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No object is stored at a path.
    #[error("not found: {0}")]
    NotFound(String),

    /// A location could not be parsed or is not served by the backend.
    #[error("invalid location '{location}': {message}")]
    InvalidLocation {
        /// The offending location.
        location: String,
        /// Why the location was rejected.
        message: String,
    },

    /// Storage could not be reached for a path.
    #[error("storage unavailable for '{path}': {message}")]
    Unavailable {
        /// Path the call was made for.
        path: String,
        /// What the backend reported.
        message: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Broken internal state, such as a poisoned lock.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates an invalid location error.
    #[must_use]
    pub fn invalid_location(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Creates an unavailable-storage error.
    #[must_use]
    pub fn unavailable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true when this error reports a missing object.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::NotFound("memory://wh/x".into()).is_not_found());
        assert!(!Error::unavailable("memory://wh/x", "timed out").is_not_found());
        assert!(!Error::invalid_location("x", "missing scheme").is_not_found());
    }

    #[test]
    fn test_messages_name_the_location() {
        let err = Error::unavailable("hdfs://nn/sales.db", "connection refused");
        assert_eq!(
            err.to_string(),
            "storage unavailable for 'hdfs://nn/sales.db': connection refused"
        );
    }
}
