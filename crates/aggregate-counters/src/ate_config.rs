//! Traffic-generator topology.
//!
//! Mirrors the device side: one emulated device behind the source port and
//! one behind a LAG over every member port. Member MACs are the aggregate
//! endpoint MAC plus the member's 1-based position.

use aggtest_client::otg::{
    AutoNegotiation, Connection, DeviceEthernet, DeviceIp, LagEthernet, LagPort, LagPortLacp,
    LagProtocol, Layer1, OtgConfig,
};
use aggtest_client::{Port, TrafficClient};
use aggtest_types::{Attributes, LagType, MacAddress};
use tracing::{debug, info, instrument};

use crate::error::{AggTestError, AggTestResult};
use crate::topology::{lag_id, SidePlan};

const LACP_SYSTEM_PRIORITY: u16 = 1;
const LACP_ACTOR_KEY: u16 = 1;
const LACP_PORT_PRIORITY: u16 = 1;
const LAYER1_NAME: &str = "L1";

/// Endpoint addressing for both links: each generator endpoint with the
/// device endpoint it uses as gateway.
#[derive(Debug, Clone, Copy)]
pub struct LinkEndpoints<'a> {
    pub ate_src: &'a Attributes,
    pub dut_src: &'a Attributes,
    pub ate_dst: &'a Attributes,
    pub dut_dst: &'a Attributes,
}

/// Builds the generator topology for `plan`.
///
/// `aggregate_id` is the device aggregate; its trailing number becomes the
/// static LAG id.
pub fn build_topology(
    plan: &SidePlan,
    aggregate_id: &str,
    lag_type: LagType,
    endpoints: LinkEndpoints<'_>,
) -> AggTestResult<OtgConfig> {
    let LinkEndpoints {
        ate_src,
        dut_src,
        ate_dst,
        dut_dst,
    } = endpoints;
    let mut top = OtgConfig::new();

    let src_mac = partner_mac(ate_src)?;
    top.add_port(plan.source.id.as_str());
    let src_eth = top.add_device(ate_src.name.as_str()).add_ethernet(
        format!("{}.Eth", ate_src.name),
        src_mac,
        Connection::PortName(plan.source.id.clone()),
    );
    add_addresses(src_eth, ate_src, dut_src);

    let base_mac = partner_mac(ate_dst)?;
    let protocol = match lag_type {
        LagType::Static => LagProtocol::Static {
            lag_id: lag_id(aggregate_id)?,
        },
        LagType::Lacp => LagProtocol::Lacp {
            actor_system_id: base_mac,
            actor_system_priority: LACP_SYSTEM_PRIORITY,
            actor_key: LACP_ACTOR_KEY,
        },
    };

    let mut members = Vec::with_capacity(plan.members.len());
    for (i, port) in plan.members.iter().enumerate() {
        let mac = base_mac.increment(i as u64 + 1)?;
        let lacp = lag_type.is_lacp().then(|| LagPortLacp {
            actor_port_number: i as u16 + 1,
            actor_port_priority: LACP_PORT_PRIORITY,
            actor_activity: "active".to_string(),
        });
        members.push(LagPort {
            port_name: port.id.clone(),
            ethernet: LagEthernet {
                name: format!("LAGRx-{}", i),
                mac,
            },
            lacp,
        });
    }
    for member in &members {
        top.add_port(member.port_name.as_str());
    }
    let lag = top.add_lag(ate_dst.name.as_str(), protocol);
    for member in members {
        lag.add_port(member);
    }

    if let Some(layer1) = fec_override(plan) {
        debug!(ports = ?layer1.port_names, "Disabling RS-FEC");
        top.add_layer1(layer1);
    }

    let dst_eth = top
        .add_device(format!("{}.dev", ate_dst.name))
        .add_ethernet(
            format!("{}.Eth", ate_dst.name),
            base_mac,
            Connection::LagName(ate_dst.name.clone()),
        );
    add_addresses(dst_eth, ate_dst, dut_dst);

    Ok(top)
}

/// Layer-1 settings for ports whose medium cannot run the generator's
/// default RS-FEC negotiation; `None` if no port needs them.
fn fec_override(plan: &SidePlan) -> Option<Layer1> {
    let ports: Vec<&Port> = plan
        .ports()
        .filter(|p| p.pmd.requires_fec_override())
        .collect();
    let first = ports.first()?;
    Some(Layer1 {
        name: LAYER1_NAME.to_string(),
        port_names: ports.iter().map(|p| p.id.clone()).collect(),
        speed: first.pmd.speed().unwrap_or(first.speed).otg_name().to_string(),
        auto_negotiate: true,
        ieee_media_defaults: false,
        auto_negotiation: AutoNegotiation { rs_fec: false },
    })
}

fn add_addresses(eth: &mut DeviceEthernet, ate: &Attributes, dut: &Attributes) {
    eth.add_ipv4(DeviceIp {
        name: format!("{}.IPv4", ate.name),
        address: ate.ipv4.address(),
        gateway: dut.ipv4.address(),
        prefix: u32::from(ate.ipv4.prefix_len()),
    })
    .add_ipv6(DeviceIp {
        name: format!("{}.IPv6", ate.name),
        address: ate.ipv6.address(),
        gateway: dut.ipv6.address(),
        prefix: u32::from(ate.ipv6.prefix_len()),
    });
}

fn partner_mac(attrs: &Attributes) -> AggTestResult<MacAddress> {
    attrs
        .mac
        .ok_or_else(|| AggTestError::config(format!("endpoint {} has no MAC address", attrs.name)))
}

/// Pushes topologies to a traffic generator.
pub struct TrafficConfigurator<'a, A: TrafficClient + ?Sized> {
    ate: &'a A,
}

impl<'a, A: TrafficClient + ?Sized> TrafficConfigurator<'a, A> {
    pub fn new(ate: &'a A) -> Self {
        Self { ate }
    }

    /// Clears whatever topology a previous run left behind.
    #[instrument(skip(self), fields(ate = self.ate.target()))]
    pub async fn reset(&self) -> AggTestResult<()> {
        self.ate
            .push_config(&OtgConfig::new())
            .await
            .map_err(|e| AggTestError::rejected("push", "/", e))
    }

    /// Pushes `top` and starts protocols. A refused topology is fatal.
    #[instrument(skip_all, fields(ate = self.ate.target()))]
    pub async fn apply(&self, top: &OtgConfig) -> AggTestResult<()> {
        info!(
            ports = top.ports.len(),
            lags = top.lags.len(),
            devices = top.devices.len(),
            "Pushing ATE topology"
        );
        self.ate
            .push_config(top)
            .await
            .map_err(|e| AggTestError::rejected("push", "/", e))?;
        self.ate
            .start_protocols()
            .await
            .map_err(|e| AggTestError::rejected("start_protocols", "/", e))
    }
}
