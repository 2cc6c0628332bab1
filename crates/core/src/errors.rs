/// Result type alias for fnkit operations.
///
/// The error parameter defaults to [`Error`] but can be overridden by
/// combinators that surface a caller-chosen error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core error type for fnkit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A wrapped callable panicked and the panic was captured
    #[error("wrapped callable panicked: {message}")]
    Panicked { message: String },

    /// Cache-key fingerprinting could not serialize its input
    #[error("failed to fingerprint key input: {message}")]
    Fingerprint {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Fingerprint {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a captured-panic error from a payload message
    #[must_use]
    pub fn panicked(message: impl Into<String>) -> Self {
        Error::Panicked {
            message: message.into(),
        }
    }

    /// Whether this error carries a captured panic
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panicked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicked_formats_payload_message() {
        let err = Error::panicked("boom");
        assert_eq!(err.to_string(), "wrapped callable panicked: boom");
        assert!(err.is_panic());
    }

    #[test]
    fn fingerprint_wraps_serde_source() {
        let bad = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = Error::from(bad);
        assert!(!err.is_panic());
        assert!(err.to_string().starts_with("failed to fingerprint"));
    }
}
