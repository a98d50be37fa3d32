//! Link aggregation counters test workflow.
//!
//! This crate drives a device under test (DUT) and a traffic generator
//! (ATE) through the aggregate interface counters test: build a LAG out of
//! every DUT port but one, bring it up against a matching generator LAG,
//! then check that the aggregate exports its interface and subinterface
//! counters. The sequence runs twice with a full aggregate teardown and
//! rebuild in between.
//!
//! # Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`topology`] | Port roles, aggregate naming |
//! | [`dut_config`] | Source, aggregate and member interface configuration |
//! | [`ate_config`] | Generator topology with the partner LAG |
//! | [`convergence`] | Bounded awaits, watches and settle delays |
//! | [`counters`] | Counter presence audit |
//! | [`workflow`] | Iteration sequencing and the run report |
//!
//! # Example
//!
//! ```ignore
//! use aggregate_counters::{run_workflow, AggTestConfig};
//!
//! let config = AggTestConfig::load("testbed.toml")?;
//! let report = run_workflow(&dut, &ate, &config).await;
//! println!("{}", report);
//! ```

pub mod ate_config;
pub mod config;
pub mod convergence;
pub mod counters;
pub mod dut_config;
pub mod endpoints;
pub mod error;
pub mod report;
pub mod topology;
pub mod workflow;

pub use config::{AggTestConfig, AteConfig, DutConfig, TestSection, TimingConfig};
pub use convergence::{Convergence, WaitState};
pub use error::{AggTestError, AggTestResult, ErrorKind};
pub use report::{RunReport, StepOutcome, StepReport};
pub use topology::{AggregateConfig, SidePlan, Topology};
pub use workflow::{run_workflow, AggregateTest};
