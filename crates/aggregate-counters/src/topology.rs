//! Port role assignment and aggregate naming.
//!
//! Each side of the testbed is sorted by port id as a plain string, so
//! "port10" sorts before "port2"; the first port carries the source link and
//! every other port becomes an aggregate member.

use std::collections::BTreeMap;

use aggtest_client::{lookup_as, paths, DeviceClient, Port};
use aggtest_types::{LagType, PortRole};
use serde::de::IgnoredAny;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AggTestError, AggTestResult};

/// Ports per side needed for one source link and at least one member.
pub const MIN_PORTS: usize = 2;

/// Role assignment for one side of the testbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidePlan {
    pub source: Port,
    pub members: Vec<Port>,
}

impl SidePlan {
    /// Sorts `ports` and assigns roles. `side` names the side in errors.
    pub fn new(side: &str, mut ports: Vec<Port>) -> AggTestResult<Self> {
        if ports.len() < MIN_PORTS {
            return Err(AggTestError::insufficient_ports(side, MIN_PORTS, ports.len()));
        }
        ports.sort_by(|a, b| a.id.cmp(&b.id));
        let members = ports.split_off(1);
        let source = ports.remove(0);
        Ok(Self { source, members })
    }

    /// Returns every port with its role, source first.
    pub fn roles(&self) -> impl Iterator<Item = (&Port, PortRole)> {
        std::iter::once((&self.source, PortRole::Source))
            .chain(self.members.iter().map(|p| (p, PortRole::Member)))
    }

    /// Returns every port, source first.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        std::iter::once(&self.source).chain(self.members.iter())
    }
}

/// Role assignment for both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub dut: SidePlan,
    pub ate: SidePlan,
}

impl Topology {
    pub fn plan(dut_ports: Vec<Port>, ate_ports: Vec<Port>) -> AggTestResult<Self> {
        let topology = Self {
            dut: SidePlan::new("dut", dut_ports)?,
            ate: SidePlan::new("ate", ate_ports)?,
        };
        info!(
            dut_source = %topology.dut.source,
            ate_source = %topology.ate.source,
            members = topology.dut.members.len(),
            "Planned topology"
        );
        Ok(topology)
    }
}

/// The aggregate under test: its name, membership protocol and member
/// ports on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateConfig {
    pub aggregate_id: String,
    pub lag_type: LagType,
    pub members: Vec<Port>,
}

impl AggregateConfig {
    pub fn new(aggregate_id: impl Into<String>, lag_type: LagType, members: Vec<Port>) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            lag_type,
            members,
        }
    }
}

/// Returns the numeric LAG id of an aggregate: its trailing decimal digits.
pub fn lag_id(aggregate_id: &str) -> AggTestResult<u32> {
    let prefix = aggregate_id.trim_end_matches(|c: char| c.is_ascii_digit());
    aggregate_id[prefix.len()..]
        .parse()
        .map_err(|_| AggTestError::InvalidAggregateId(aggregate_id.to_string()))
}

/// Interface names on the device. Entries are not decoded, so interface
/// types the object model does not know are still counted.
#[derive(Debug, Default, Deserialize)]
struct InterfaceNames {
    #[serde(default)]
    interface: BTreeMap<String, IgnoredAny>,
}

/// Picks the lowest aggregate name, in the device vendor's naming scheme,
/// that no interface on the device uses yet.
pub async fn next_aggregate_interface<D>(dut: &D) -> AggTestResult<String>
where
    D: DeviceClient + ?Sized,
{
    let used = lookup_as::<InterfaceNames, _>(dut, &paths::device::interfaces().state())
        .await?
        .unwrap_or_default()
        .interface;

    let vendor = dut.vendor();
    let name = (vendor.first_aggregate_index()..)
        .map(|i| vendor.aggregate_name(i))
        .find(|name| !used.contains_key(name))
        .ok_or_else(|| AggTestError::config("no free aggregate interface name"))?;
    debug!(%vendor, name = %name, "Selected aggregate interface");
    Ok(name)
}
