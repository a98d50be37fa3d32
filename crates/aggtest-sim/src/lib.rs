//! Simulated targets for link aggregation tests
//!
//! Provides:
//! - An in-memory device under test with gNMI-style config writes and
//!   derived interface state
//! - An in-memory traffic generator reporting port, LAG and LACP metrics
//! - Shared link state wiring the two back to back
//! - Fault injection for refused writes and missing counters
//! - Fixtures and verification helpers for tests

mod ate;
mod device;
pub mod fixtures;
mod testbed;
mod tree;
mod verification;

pub use ate::SimAte;
pub use device::{SimDevice, WriteOp, WriteRecord};
pub use testbed::{SimTestbed, SimTestbedBuilder};
pub use verification::*;
