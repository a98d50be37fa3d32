//! Error types for collaborator client operations.
//!
//! All errors implement `std::error::Error` via `thiserror`.

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors reported by a device or traffic-generator client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The target refused a configuration write.
    #[error("{op} rejected at {path}: {message}")]
    Rejected {
        /// The write operation ("replace", "update", "delete", "push").
        op: String,
        /// The path the write targeted.
        path: String,
        /// Reason reported by the target.
        message: String,
    },

    /// A `get` addressed a path with no value.
    #[error("No value at {path}")]
    NotFound {
        /// The path that was read.
        path: String,
    },

    /// A value could not be converted to or from its typed form.
    #[error("Failed to decode value at {path}: {message}")]
    Decode {
        /// The path the value belongs to.
        path: String,
        /// Error message.
        message: String,
    },

    /// The telemetry subscription ended before yielding a value.
    #[error("Subscription to {path} closed")]
    SubscriptionClosed {
        /// The subscribed path.
        path: String,
    },

    /// The target cannot be reached.
    #[error("Target unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl ClientError {
    /// Creates a rejected-write error.
    pub fn rejected(
        op: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            op: op.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a decode error.
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error came from the target refusing a write.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::rejected("replace", "/interfaces/interface[name=Agg1]", "bad type");
        assert_eq!(
            err.to_string(),
            "replace rejected at /interfaces/interface[name=Agg1]: bad type"
        );
        assert!(err.is_rejection());
    }

    #[test]
    fn test_not_found() {
        let err = ClientError::not_found("/lags/lag[name=atedst]/oper-status");
        assert!(err.to_string().contains("atedst"));
        assert!(!err.is_rejection());
    }
}
