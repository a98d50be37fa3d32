//! Error types for the aggregate counters workflow.
//!
//! Every failure maps onto one [`ErrorKind`]: setup problems, refused
//! configuration, convergence timeouts and assertion failures. None are
//! retried; the enclosing test step ends with the error.

use std::time::Duration;

use aggtest_client::ClientError;
use aggtest_types::ParseError;
use thiserror::Error;

/// Result type alias for workflow operations.
pub type AggTestResult<T> = Result<T, AggTestError>;

/// Failure class of an [`AggTestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The testbed or derived parameters are unusable.
    Setup,
    /// A target refused a configuration write.
    ConfigurationRejected,
    /// An await or watch exceeded its bound.
    ConvergenceTimeout,
    /// An observed value differs from the expected one.
    AssertionFailure,
}

/// Errors raised by the workflow.
#[derive(Debug, Error)]
pub enum AggTestError {
    /// A side of the testbed has too few ports.
    #[error("Testbed {side} has {got} ports, at least {required} are required")]
    InsufficientPorts {
        side: String,
        required: usize,
        got: usize,
    },

    /// A derived link-layer address could not be computed.
    #[error("Address derivation failed: {0}")]
    AddressIncrement(#[from] ParseError),

    /// The aggregate identifier carries no numeric LAG id.
    #[error("Aggregate id {0:?} has no trailing LAG number")]
    InvalidAggregateId(String),

    /// A target refused a configuration write.
    #[error("{op} of {path} rejected: {source}")]
    ConfigurationRejected {
        op: String,
        path: String,
        #[source]
        source: ClientError,
    },

    /// A watched value did not converge in time.
    #[error("Timed out after {timeout:?} waiting on {path}, last observed {last_observed}")]
    ConvergenceTimeout {
        path: String,
        timeout: Duration,
        last_observed: String,
    },

    /// An observed value differs from the expected one.
    #[error("{what}: expected {expected}, got {actual}")]
    Assertion {
        what: String,
        expected: String,
        actual: String,
    },

    /// The configuration file is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A telemetry read failed.
    #[error("Telemetry read failed: {0}")]
    Telemetry(#[from] ClientError),
}

impl AggTestError {
    /// Creates an insufficient-ports error.
    pub fn insufficient_ports(side: impl Into<String>, required: usize, got: usize) -> Self {
        Self::InsufficientPorts {
            side: side.into(),
            required,
            got,
        }
    }

    /// Wraps a refused write.
    pub fn rejected(op: impl Into<String>, path: impl Into<String>, source: ClientError) -> Self {
        Self::ConfigurationRejected {
            op: op.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates a convergence timeout error.
    pub fn timeout(path: impl Into<String>, timeout: Duration, last_observed: impl Into<String>) -> Self {
        Self::ConvergenceTimeout {
            path: path.into(),
            timeout,
            last_observed: last_observed.into(),
        }
    }

    /// Creates an assertion failure.
    pub fn assertion(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Assertion {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a configuration file error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientPorts { .. }
            | Self::AddressIncrement(_)
            | Self::InvalidAggregateId(_)
            | Self::Config(_) => ErrorKind::Setup,
            Self::ConfigurationRejected { .. } => ErrorKind::ConfigurationRejected,
            Self::ConvergenceTimeout { .. } => ErrorKind::ConvergenceTimeout,
            Self::Assertion { .. } | Self::Telemetry(_) => ErrorKind::AssertionFailure,
        }
    }
}
