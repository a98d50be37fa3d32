//! Simulated traffic generator.
//!
//! Accepts a whole [`OtgConfig`] at a time and reports port, LAG and LACP
//! member metrics derived from the pushed topology and the shared link
//! state.

use std::collections::HashSet;
use std::sync::Arc;

use aggtest_client::otg::{LagProtocol, LinkState, OtgConfig};
use aggtest_client::{ClientError, ClientResult, Port, Telemetry, TelemetryPath, TrafficClient};
use aggtest_types::OperStatus;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, instrument};

use crate::testbed::Links;
use crate::tree;

struct AteInner {
    name: String,
    ports: Vec<Port>,
    config: RwLock<OtgConfig>,
    started: RwLock<bool>,
    reject_pushes: RwLock<Option<String>>,
    ports_down: RwLock<HashSet<String>>,
    lags_held_down: RwLock<bool>,
    pushes: RwLock<Vec<OtgConfig>>,
    links: Arc<Links>,
}

/// Simulated traffic generator. Clones share state.
#[derive(Clone)]
pub struct SimAte {
    inner: Arc<AteInner>,
}

impl SimAte {
    pub(crate) fn new(name: String, ports: Vec<Port>, links: Arc<Links>) -> Self {
        Self {
            inner: Arc::new(AteInner {
                name,
                ports,
                config: RwLock::new(OtgConfig::new()),
                started: RwLock::new(false),
                reject_pushes: RwLock::new(None),
                ports_down: RwLock::new(HashSet::new()),
                lags_held_down: RwLock::new(false),
                pushes: RwLock::new(Vec::new()),
                links,
            }),
        }
    }

    /// Makes every following push fail with `message`; `None` accepts
    /// pushes again.
    pub fn reject_pushes(&self, message: Option<String>) {
        *self.inner.reject_pushes.write() = message;
    }

    /// Reports the generator end of `port_id` as down, whatever the shared
    /// link state says. The device end is not affected.
    pub fn set_port_down(&self, port_id: &str, down: bool) {
        {
            let mut ports = self.inner.ports_down.write();
            if down {
                ports.insert(port_id.to_string());
            } else {
                ports.remove(port_id);
            }
        }
        self.inner.links.notify();
    }

    /// Keeps every LAG operationally down even with protocols running.
    pub fn hold_lags_down(&self, held: bool) {
        *self.inner.lags_held_down.write() = held;
        self.inner.links.notify();
    }

    /// Returns the active configuration.
    pub fn config(&self) -> OtgConfig {
        self.inner.config.read().clone()
    }

    /// Returns every accepted push, oldest first.
    pub fn pushes(&self) -> Vec<OtgConfig> {
        self.inner.pushes.read().clone()
    }

    /// Returns true if protocols run on the active configuration.
    pub fn protocols_started(&self) -> bool {
        *self.inner.started.read()
    }
}

impl AteInner {
    fn read(&self, path: &TelemetryPath) -> Option<Value> {
        tree::lookup(&self.state_tree(), &path.segments()).cloned()
    }

    fn port_up(&self, port_id: &str) -> bool {
        self.links.is_up(port_id) && !self.ports_down.read().contains(port_id)
    }

    fn state_tree(&self) -> Value {
        let config = self.config.read();
        let started = *self.started.read();
        let held_down = *self.lags_held_down.read();

        let mut ports = Map::new();
        for port in &config.ports {
            let link = if self.port_up(&port.name) {
                LinkState::Up
            } else {
                LinkState::Down
            };
            ports.insert(
                port.name.clone(),
                json!({"name": port.name, "link": link, "frames-tx": 0, "frames-rx": 0}),
            );
        }

        let mut lags = Map::new();
        let mut members = Map::new();
        for lag in &config.lags {
            let up = lag
                .ports
                .iter()
                .filter(|p| self.port_up(&p.port_name))
                .count();
            let oper = if started && up > 0 && !held_down {
                OperStatus::Up
            } else {
                OperStatus::Down
            };
            lags.insert(
                lag.name.clone(),
                json!({
                    "name": lag.name,
                    "oper-status": oper,
                    "member-ports-up": up,
                    "frames-tx": 0,
                    "frames-rx": 0,
                }),
            );

            if let LagProtocol::Lacp { .. } = lag.protocol {
                for port in &lag.ports {
                    let in_sync = started && self.port_up(&port.port_name);
                    members.insert(
                        port.port_name.clone(),
                        json!({
                            "name": port.port_name,
                            "lag-name": lag.name,
                            "lacp-packets-rx": 0,
                            "lacp-packets-tx": 0,
                            "synchronization": if in_sync { "IN_SYNC" } else { "OUT_SYNC" },
                            "collecting": in_sync,
                            "distributing": in_sync,
                        }),
                    );
                }
            }
        }

        json!({
            "ports": {"port": ports},
            "lags": {"lag": lags},
            "lacp": {"lag-members": {"lag-member": members}},
        })
    }
}

#[async_trait]
impl Telemetry for SimAte {
    fn target(&self) -> &str {
        &self.inner.name
    }

    fn ports(&self) -> Vec<Port> {
        self.inner.ports.clone()
    }

    async fn lookup(&self, path: &TelemetryPath) -> ClientResult<Option<Value>> {
        Ok(self.inner.read(path))
    }

    async fn subscribe(&self, path: &TelemetryPath) -> ClientResult<BoxStream<'static, Option<Value>>> {
        let inner = Arc::clone(&self.inner);
        let path = path.clone();
        let changes = WatchStream::new(inner.links.subscribe());
        Ok(changes.map(move |_| inner.read(&path)).boxed())
    }
}

#[async_trait]
impl TrafficClient for SimAte {
    #[instrument(skip(self, config), fields(ate = %self.inner.name))]
    async fn push_config(&self, config: &OtgConfig) -> ClientResult<()> {
        let reject = |message: String| ClientError::rejected("push", "/", message);

        if let Some(message) = self.inner.reject_pushes.read().clone() {
            return Err(reject(message));
        }
        config.validate().map_err(reject)?;
        if let Some(port) = config
            .ports
            .iter()
            .find(|p| !self.inner.ports.iter().any(|r| r.id == p.name))
        {
            return Err(reject(format!("port {} is not reserved", port.name)));
        }

        *self.inner.config.write() = config.clone();
        *self.inner.started.write() = false;
        self.inner.pushes.write().push(config.clone());
        self.inner.links.set_lacp_partner_ready(false);
        self.inner.links.notify();

        if config.is_empty() {
            info!("Traffic generator configuration reset");
        } else {
            debug!(
                ports = config.ports.len(),
                devices = config.devices.len(),
                lags = config.lags.len(),
                "Traffic generator configuration pushed"
            );
        }
        Ok(())
    }

    #[instrument(skip(self), fields(ate = %self.inner.name))]
    async fn start_protocols(&self) -> ClientResult<()> {
        let lacp = self
            .inner
            .config
            .read()
            .lags
            .iter()
            .any(|l| matches!(l.protocol, LagProtocol::Lacp { .. }) && !l.ports.is_empty());

        *self.inner.started.write() = true;
        self.inner.links.set_lacp_partner_ready(lacp);
        self.inner.links.notify();
        debug!(lacp, "Protocols started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimTestbed;
    use aggtest_client::otg::{LagEthernet, LagPort};
    use aggtest_client::paths;
    use aggtest_types::MacAddress;
    use pretty_assertions::assert_eq;

    fn lag_config(protocol: LagProtocol) -> OtgConfig {
        let mut config = OtgConfig::new();
        config.add_port("port1");
        config.add_port("port2");
        let lag = config.add_lag("LAG", protocol);
        lag.add_port(LagPort {
            port_name: "port2".to_string(),
            ethernet: LagEthernet {
                name: "LAGRx-0".to_string(),
                mac: "02:12:01:00:00:02".parse::<MacAddress>().unwrap(),
            },
            lacp: None,
        });
        config
    }

    fn testbed() -> SimTestbed {
        SimTestbed::builder()
            .link("port1", "Ethernet1", "1/1")
            .link("port2", "Ethernet2", "1/2")
            .build()
    }

    #[tokio::test]
    async fn test_lag_up_after_protocols_start() {
        let testbed = testbed();
        let ate = testbed.ate();
        ate.push_config(&lag_config(LagProtocol::Static { lag_id: 1 }))
            .await
            .unwrap();

        let path = paths::otg::lag_oper_status("LAG").state();
        assert_eq!(ate.get(&path).await.unwrap(), json!("DOWN"));

        ate.start_protocols().await.unwrap();
        assert_eq!(ate.get(&path).await.unwrap(), json!("UP"));

        testbed.set_link("port2", false);
        assert_eq!(ate.get(&path).await.unwrap(), json!("DOWN"));
    }

    #[tokio::test]
    async fn test_generator_side_faults() {
        let testbed = testbed();
        let ate = testbed.ate();
        ate.push_config(&lag_config(LagProtocol::Static { lag_id: 1 }))
            .await
            .unwrap();
        ate.start_protocols().await.unwrap();

        let link = paths::otg::port_link("port1").state();
        ate.set_port_down("port1", true);
        assert_eq!(ate.get(&link).await.unwrap(), json!("DOWN"));
        // The device end of the link stays up.
        assert_eq!(
            testbed
                .dut()
                .get(&paths::device::oper_status("Ethernet1").state())
                .await
                .unwrap(),
            json!("UP")
        );
        ate.set_port_down("port1", false);
        assert_eq!(ate.get(&link).await.unwrap(), json!("UP"));

        let lag = paths::otg::lag_oper_status("LAG").state();
        ate.hold_lags_down(true);
        assert_eq!(ate.get(&lag).await.unwrap(), json!("DOWN"));
        ate.hold_lags_down(false);
        assert_eq!(ate.get(&lag).await.unwrap(), json!("UP"));
    }

    #[tokio::test]
    async fn test_push_rejects_unreserved_port() {
        let testbed = testbed();
        let mut config = OtgConfig::new();
        config.add_port("port9");

        let err = testbed.ate().push_config(&config).await.unwrap_err();
        assert!(err.to_string().contains("port9"));
        assert!(testbed.ate().pushes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_push_resets() {
        let testbed = testbed();
        let ate = testbed.ate();
        ate.push_config(&lag_config(LagProtocol::Static { lag_id: 1 }))
            .await
            .unwrap();
        ate.push_config(&OtgConfig::new()).await.unwrap();

        assert!(ate.config().is_empty());
        assert_eq!(ate.lookup(&paths::otg::lag("LAG").state()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lacp_partner_reported() {
        let testbed = testbed();
        let ate = testbed.ate();
        let system_id = "02:12:01:00:00:01".parse::<MacAddress>().unwrap();
        ate.push_config(&lag_config(LagProtocol::Lacp {
            actor_system_id: system_id,
            actor_system_priority: 1,
            actor_key: 1,
        }))
        .await
        .unwrap();
        ate.start_protocols().await.unwrap();

        let members = ate.get(&paths::otg::lacp_members().state()).await.unwrap();
        assert_eq!(members["lag-member"]["port2"]["synchronization"], json!("IN_SYNC"));
        assert!(testbed.dut().state_tree().is_object());
    }
}
