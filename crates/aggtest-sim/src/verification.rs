//! Verification helpers for testing against simulated targets
//!
//! Provides assertion helpers over telemetry reads and over the write log a
//! [`SimDevice`](crate::SimDevice) keeps.

use aggtest_client::{paths, ClientError, Telemetry, TelemetryPath};
use aggtest_types::InterfaceType;
use serde_json::Value;
use thiserror::Error;

use crate::device::{WriteOp, WriteRecord};

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Expected a value at {path}")]
    NotFound { path: String },

    #[error("Expected no value at {path}, got {actual}")]
    UnexpectedValue { path: String, actual: String },

    #[error("Value mismatch at {path}: expected '{expected}', got '{actual}'")]
    ValueMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Expected a {op} write matching '{pattern}'")]
    WriteNotFound { op: WriteOp, pattern: String },

    #[error("Unexpected {op} write matching '{pattern}'")]
    UnexpectedWrite { op: WriteOp, pattern: String },

    #[error("Expected '{first}' to be written before '{second}'")]
    WriteOrder { first: String, second: String },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Telemetry verification helper
pub struct TelemetryVerifier<'a, T: Telemetry + ?Sized> {
    target: &'a T,
}

impl<'a, T: Telemetry + ?Sized> TelemetryVerifier<'a, T> {
    pub fn new(target: &'a T) -> Self {
        Self { target }
    }

    /// Verify that a value is present at `path`
    pub async fn assert_present(&self, path: &TelemetryPath) -> VerifyResult<Value> {
        self.target
            .lookup(path)
            .await?
            .ok_or_else(|| VerificationError::NotFound {
                path: path.to_string(),
            })
    }

    /// Verify that no value is present at `path`
    pub async fn assert_absent(&self, path: &TelemetryPath) -> VerifyResult<()> {
        match self.target.lookup(path).await? {
            None => Ok(()),
            Some(actual) => Err(VerificationError::UnexpectedValue {
                path: path.to_string(),
                actual: actual.to_string(),
            }),
        }
    }

    /// Verify that the value at `path` equals `expected`
    pub async fn assert_value(&self, path: &TelemetryPath, expected: &Value) -> VerifyResult<()> {
        let actual = self.assert_present(path).await?;
        if &actual == expected {
            Ok(())
        } else {
            Err(VerificationError::ValueMismatch {
                path: path.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    /// Verify an interface's type in the state view
    pub async fn assert_interface_type(&self, name: &str, expected: InterfaceType) -> VerifyResult<()> {
        let path = paths::device::interface_type(name).state();
        self.assert_value(&path, &Value::String(expected.to_string()))
            .await
    }

    /// Verify that `member` is bound to `aggregate` in the state view
    pub async fn assert_aggregate_binding(&self, member: &str, aggregate: &str) -> VerifyResult<()> {
        let path = paths::device::aggregate_id(member).state();
        self.assert_value(&path, &Value::String(aggregate.to_string()))
            .await
    }
}

/// Write log verifier
pub struct WriteVerifier {
    writes: Vec<WriteRecord>,
}

impl WriteVerifier {
    pub fn new(writes: Vec<WriteRecord>) -> Self {
        Self { writes }
    }

    fn position(&self, op: WriteOp, pattern: &str) -> Option<usize> {
        self.writes
            .iter()
            .position(|w| w.op == op && w.path.to_string().contains(pattern))
    }

    /// Verify that a write of kind `op` targeted a path containing `pattern`
    pub fn assert_written(&self, op: WriteOp, pattern: &str) -> VerifyResult<&WriteRecord> {
        self.position(op, pattern)
            .map(|i| &self.writes[i])
            .ok_or_else(|| VerificationError::WriteNotFound {
                op,
                pattern: pattern.to_string(),
            })
    }

    /// Verify that no write of kind `op` targeted a path containing `pattern`
    pub fn assert_not_written(&self, op: WriteOp, pattern: &str) -> VerifyResult<()> {
        match self.position(op, pattern) {
            None => Ok(()),
            Some(_) => Err(VerificationError::UnexpectedWrite {
                op,
                pattern: pattern.to_string(),
            }),
        }
    }

    /// Verify that the first matching `first` write precedes the first
    /// matching `second` write
    pub fn assert_written_before(
        &self,
        first: (WriteOp, &str),
        second: (WriteOp, &str),
    ) -> VerifyResult<()> {
        let a = self
            .position(first.0, first.1)
            .ok_or_else(|| VerificationError::WriteNotFound {
                op: first.0,
                pattern: first.1.to_string(),
            })?;
        let b = self
            .position(second.0, second.1)
            .ok_or_else(|| VerificationError::WriteNotFound {
                op: second.0,
                pattern: second.1.to_string(),
            })?;
        if a < b {
            Ok(())
        } else {
            Err(VerificationError::WriteOrder {
                first: format!("{} {}", first.0, first.1),
                second: format!("{} {}", second.0, second.1),
            })
        }
    }

    /// Get the number of writes of kind `op` (for inspection)
    pub fn count(&self, op: WriteOp) -> usize {
        self.writes.iter().filter(|w| w.op == op).count()
    }

    /// Get the recorded writes (for inspection)
    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }
}
