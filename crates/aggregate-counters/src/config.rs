//! Testbed and run configuration.
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [test]
//! lag_type = "lacp"
//!
//! [timing]
//! lag_settle_secs = 30
//!
//! [dut]
//! name = "dut1"
//! vendor = "arista"
//! ports = [
//!     { id = "port1", name = "Ethernet1/1" },
//!     { id = "port2", name = "Ethernet2/1", pmd = "100GBASE-FR" },
//! ]
//!
//! [dut.deviations]
//! aggregate_atomic_update = true
//!
//! [ate]
//! ports = [{ id = "port1", name = "1/1" }, { id = "port2", name = "1/2" }]
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use aggtest_client::{DeviationOverrides, Deviations, Port, Vendor};
use aggtest_types::LagType;
use serde::{Deserialize, Serialize};

use crate::error::{AggTestError, AggTestResult};

/// Test parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSection {
    /// Aggregation type of the LAG under test
    #[serde(default)]
    pub lag_type: LagType,

    /// Number of configure-verify-audit iterations
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Aggregate interface name; picked from the device when unset
    #[serde(default)]
    pub aggregate_id: Option<String>,
}

/// Wait bounds and residual settle delays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Bound on every await and watch in seconds
    #[serde(default = "default_convergence_timeout")]
    pub convergence_timeout_secs: u64,

    /// Interval between polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Delay after atomically rebuilding the aggregate in seconds
    #[serde(default = "default_atomic_settle")]
    pub atomic_settle_secs: u64,

    /// Delay for LAG negotiation on the device in seconds
    #[serde(default = "default_lag_settle")]
    pub lag_settle_secs: u64,

    /// Delay for traffic-generator statistics in seconds
    #[serde(default = "default_otg_settle")]
    pub otg_settle_secs: u64,
}

/// Device under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutConfig {
    #[serde(default = "default_dut_name")]
    pub name: String,

    #[serde(default)]
    pub vendor: Vendor,

    #[serde(default)]
    pub ports: Vec<Port>,

    /// Adjustments to the vendor's capability flags
    #[serde(default)]
    pub deviations: DeviationOverrides,
}

/// Traffic generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AteConfig {
    #[serde(default = "default_ate_name")]
    pub name: String,

    #[serde(default)]
    pub ports: Vec<Port>,
}

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggTestConfig {
    #[serde(default)]
    pub test: TestSection,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub dut: DutConfig,

    #[serde(default)]
    pub ate: AteConfig,
}

// Default functions
fn default_iterations() -> u32 {
    2
}

fn default_convergence_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    500
}

fn default_atomic_settle() -> u64 {
    5
}

fn default_lag_settle() -> u64 {
    120
}

fn default_otg_settle() -> u64 {
    10
}

fn default_dut_name() -> String {
    "dut".to_string()
}

fn default_ate_name() -> String {
    "ate".to_string()
}

impl Default for TestSection {
    fn default() -> Self {
        Self {
            lag_type: LagType::default(),
            iterations: default_iterations(),
            aggregate_id: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            convergence_timeout_secs: default_convergence_timeout(),
            poll_interval_ms: default_poll_interval(),
            atomic_settle_secs: default_atomic_settle(),
            lag_settle_secs: default_lag_settle(),
            otg_settle_secs: default_otg_settle(),
        }
    }
}

impl Default for DutConfig {
    fn default() -> Self {
        Self {
            name: default_dut_name(),
            vendor: Vendor::default(),
            ports: Vec::new(),
            deviations: DeviationOverrides::default(),
        }
    }
}

impl Default for AteConfig {
    fn default() -> Self {
        Self {
            name: default_ate_name(),
            ports: Vec::new(),
        }
    }
}

impl TimingConfig {
    pub fn convergence_timeout(&self) -> Duration {
        Duration::from_secs(self.convergence_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn atomic_settle(&self) -> Duration {
        Duration::from_secs(self.atomic_settle_secs)
    }

    pub fn lag_settle(&self) -> Duration {
        Duration::from_secs(self.lag_settle_secs)
    }

    pub fn otg_settle(&self) -> Duration {
        Duration::from_secs(self.otg_settle_secs)
    }
}

impl AggTestConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> AggTestResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AggTestError::config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| AggTestError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> AggTestResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AggTestError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Capability flags of the device under test
    pub fn deviations(&self) -> Deviations {
        Deviations::for_vendor(self.dut.vendor).with_overrides(&self.dut.deviations)
    }

    /// Validate configuration
    pub fn validate(&self) -> AggTestResult<()> {
        if self.test.iterations == 0 {
            return Err(AggTestError::config("test.iterations must be at least 1"));
        }
        if self.timing.convergence_timeout_secs == 0 {
            return Err(AggTestError::config("timing.convergence_timeout_secs must be positive"));
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(AggTestError::config("timing.poll_interval_ms must be positive"));
        }
        if let Some(id) = &self.test.aggregate_id {
            if id.is_empty() {
                return Err(AggTestError::config("test.aggregate_id must not be empty"));
            }
        }
        Ok(())
    }
}
