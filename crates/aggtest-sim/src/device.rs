//! Simulated device under test.
//!
//! The device keeps its configuration as a JSON tree. Writes go through
//! [`DeviceClient`]; reads of the state view see the configuration plus
//! derived leaves: admin and operational status of every interface and the
//! interface and subinterface counters.
//!
//! Fault injection covers what the workflow has to cope with on real
//! devices: refused writes, strict aggregate reference checking, and
//! counters that are not exported.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use aggtest_client::paths::{INTF_COUNTER_PATH, IPV4_COUNTER_PATH, IPV6_COUNTER_PATH};
use aggtest_client::{
    ClientError, ClientResult, DeviceClient, Port, Telemetry, TelemetryPath, Vendor, View,
};
use aggtest_types::{InterfaceType, LagType, OperStatus};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, instrument};

use crate::testbed::Links;
use crate::tree;

/// Interface counter leaves the device exports.
const INTERFACE_COUNTERS: [&str; 10] = [
    "in-unicast-pkts",
    "out-unicast-pkts",
    "in-multicast-pkts",
    "out-multicast-pkts",
    "in-pkts",
    "out-pkts",
    "in-discards",
    "out-discards",
    "in-errors",
    "out-errors",
];

/// Per address-family subinterface counter leaves the device exports.
const IP_COUNTERS: [&str; 4] = ["in-pkts", "out-pkts", "in-discarded-pkts", "out-discarded-pkts"];

/// A configuration write kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Replace,
    Update,
    Delete,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Replace => write!(f, "replace"),
            WriteOp::Update => write!(f, "update"),
            WriteOp::Delete => write!(f, "delete"),
        }
    }
}

/// A configuration write accepted by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub op: WriteOp,
    pub path: TelemetryPath,
    pub value: Option<Value>,
}

impl fmt::Display for WriteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path)
    }
}

/// Refuses writes touching a subtree.
#[derive(Debug, Clone)]
struct RejectRule {
    op: Option<WriteOp>,
    prefix: Vec<String>,
    message: String,
}

impl RejectRule {
    /// A write matches if it targets the subtree, or targets an ancestor
    /// with a value reaching into the subtree.
    fn matches(&self, op: WriteOp, segs: &[&str], value: Option<&Value>) -> bool {
        if self.op.is_some_and(|o| o != op) {
            return false;
        }
        if segs.len() >= self.prefix.len() {
            return self.prefix.iter().zip(segs).all(|(p, s)| p == s);
        }
        if !segs.iter().zip(&self.prefix).all(|(s, p)| s == p) {
            return false;
        }
        let rest: Vec<&str> = self.prefix[segs.len()..].iter().map(String::as_str).collect();
        value.is_some_and(|v| tree::lookup(v, &rest).is_some())
    }
}

#[derive(Debug, Default)]
struct Faults {
    reject: Vec<RejectRule>,
    strict_aggregate_refs: bool,
    unsupported_counters: HashSet<String>,
    subinterface_counters_missing: bool,
}

struct DeviceInner {
    name: String,
    vendor: Vendor,
    ports: Vec<Port>,
    config: RwLock<Value>,
    faults: RwLock<Faults>,
    writes: RwLock<Vec<WriteRecord>>,
    links: Arc<Links>,
}

/// Simulated device under test. Clones share state.
#[derive(Clone)]
pub struct SimDevice {
    inner: Arc<DeviceInner>,
}

impl SimDevice {
    pub(crate) fn new(name: String, vendor: Vendor, ports: Vec<Port>, links: Arc<Links>) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                name,
                vendor,
                ports,
                config: RwLock::new(Value::Object(Map::new())),
                faults: RwLock::new(Faults::default()),
                writes: RwLock::new(Vec::new()),
                links,
            }),
        }
    }

    /// Refuses writes at or below `path`. `op` restricts the rule to one
    /// write kind.
    pub fn reject_writes(&self, op: Option<WriteOp>, path: &TelemetryPath, message: impl Into<String>) {
        self.inner.faults.write().reject.push(RejectRule {
            op,
            prefix: path.segments().into_iter().map(String::from).collect(),
            message: message.into(),
        });
    }

    /// Refuses any write leaving a member bound to an aggregate that does
    /// not exist as an `ieee8023adLag` interface.
    pub fn set_strict_aggregate_refs(&self, strict: bool) {
        self.inner.faults.write().strict_aggregate_refs = strict;
    }

    /// Stops exporting the counter at schema path `schema_path`, e.g.
    /// `/interfaces/interface/state/counters/in-errors`.
    pub fn mark_counter_unsupported(&self, schema_path: impl Into<String>) {
        self.inner.faults.write().unsupported_counters.insert(schema_path.into());
    }

    /// Stops exporting all subinterface counters.
    pub fn set_subinterface_counters_missing(&self, missing: bool) {
        self.inner.faults.write().subinterface_counters_missing = missing;
    }

    /// Removes all injected faults.
    pub fn clear_faults(&self) {
        *self.inner.faults.write() = Faults::default();
    }

    /// Returns the accepted writes, oldest first.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.inner.writes.read().clone()
    }

    pub fn clear_writes(&self) {
        self.inner.writes.write().clear();
    }

    /// Returns a copy of the configuration tree.
    pub fn config_tree(&self) -> Value {
        self.inner.config.read().clone()
    }

    /// Returns the state tree as a telemetry read would see it.
    pub fn state_tree(&self) -> Value {
        self.inner.state_tree()
    }
}

impl DeviceInner {
    fn read(&self, path: &TelemetryPath) -> Option<Value> {
        let segs = path.segments();
        match path.view() {
            View::Config => tree::lookup(&self.config.read(), &segs).cloned(),
            View::State => tree::lookup(&self.state_tree(), &segs).cloned(),
        }
    }

    fn commit<F>(&self, op: WriteOp, path: &TelemetryPath, value: Option<Value>, apply: F) -> ClientResult<()>
    where
        F: FnOnce(&mut Value, &[&str]),
    {
        let segs = path.segments();
        let faults = self.faults.read();
        if let Some(rule) = faults.reject.iter().find(|r| r.matches(op, &segs, value.as_ref())) {
            return Err(ClientError::rejected(op.to_string(), path.to_string(), rule.message.clone()));
        }

        {
            let mut config = self.config.write();
            let mut next = config.clone();
            apply(&mut next, &segs);
            if !next.is_object() {
                return Err(ClientError::rejected(op.to_string(), path.to_string(), "root must be a container"));
            }
            if faults.strict_aggregate_refs {
                check_aggregate_refs(&next)
                    .map_err(|message| ClientError::rejected(op.to_string(), path.to_string(), message))?;
            }
            *config = next;
        }

        debug!(device = %self.name, %op, %path, "write accepted");
        self.writes.write().push(WriteRecord {
            op,
            path: path.clone(),
            value,
        });
        self.links.notify();
        Ok(())
    }

    fn state_tree(&self) -> Value {
        let mut root = self.config.read().clone();
        let faults = self.faults.read();

        for port in &self.ports {
            let segs = ["interfaces", "interface", port.name.as_str()];
            if tree::lookup(&root, &segs).is_none() {
                tree::replace(
                    &mut root,
                    &segs,
                    json!({"name": port.name, "type": InterfaceType::EthernetCsmacd.to_string()}),
                );
            }
        }

        let Some(interfaces) = root
            .pointer_mut("/interfaces/interface")
            .and_then(Value::as_object_mut)
        else {
            return root;
        };

        let mut oper = HashMap::new();
        for (name, intf) in interfaces.iter() {
            if is_aggregate(intf) {
                continue;
            }
            let status = match self.ports.iter().find(|p| &p.name == name) {
                None => OperStatus::NotPresent,
                Some(port) if admin_up(intf) && self.links.is_up(&port.id) => OperStatus::Up,
                Some(_) => OperStatus::Down,
            };
            oper.insert(name.clone(), status);
        }

        let partner_ready = self.links.lacp_partner_ready();
        for (name, intf) in interfaces.iter() {
            if !is_aggregate(intf) {
                continue;
            }
            let members_up = interfaces
                .iter()
                .filter(|(member, m)| {
                    aggregate_of(m) == Some(name.as_str()) && oper.get(*member) == Some(&OperStatus::Up)
                })
                .count() as u64;
            let min_links = intf
                .pointer("/aggregation/min-links")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .max(1);
            let lacp = intf.pointer("/aggregation/lag-type").and_then(Value::as_str)
                == Some(LagType::Lacp.to_string().as_str());

            let status = if !admin_up(intf) {
                OperStatus::Down
            } else if members_up >= min_links && (!lacp || partner_ready) {
                OperStatus::Up
            } else {
                OperStatus::LowerLayerDown
            };
            oper.insert(name.clone(), status);
        }

        for (name, intf) in interfaces.iter_mut() {
            let admin = if admin_up(intf) { "UP" } else { "DOWN" };
            let Some(obj) = intf.as_object_mut() else {
                continue;
            };
            let status = oper.get(name).copied().unwrap_or_default();
            obj.insert("admin-status".to_string(), json!(admin));
            obj.insert("oper-status".to_string(), json!(status.to_string()));
            obj.insert(
                "counters".to_string(),
                counters(&faults.unsupported_counters, INTF_COUNTER_PATH, &INTERFACE_COUNTERS),
            );

            if faults.subinterface_counters_missing {
                continue;
            }
            let Some(subs) = obj
                .get_mut("subinterfaces")
                .and_then(|s| s.get_mut("subinterface"))
                .and_then(Value::as_object_mut)
            else {
                continue;
            };
            for sub in subs.values_mut() {
                for (family, schema) in [("ipv4", IPV4_COUNTER_PATH), ("ipv6", IPV6_COUNTER_PATH)] {
                    if let Some(afi) = sub.get_mut(family).and_then(Value::as_object_mut) {
                        afi.insert(
                            "counters".to_string(),
                            counters(&faults.unsupported_counters, schema, &IP_COUNTERS),
                        );
                    }
                }
            }
        }

        root
    }
}

fn is_aggregate(intf: &Value) -> bool {
    intf.get("type").and_then(Value::as_str) == Some("ieee8023adLag")
}

fn aggregate_of(intf: &Value) -> Option<&str> {
    intf.pointer("/ethernet/aggregate-id").and_then(Value::as_str)
}

fn admin_up(intf: &Value) -> bool {
    intf.get("enabled").and_then(Value::as_bool).unwrap_or(true)
}

fn counters(unsupported: &HashSet<String>, schema: &str, leaves: &[&str]) -> Value {
    let mut map = Map::new();
    for (i, leaf) in leaves.iter().enumerate() {
        if unsupported.contains(&format!("{}{}", schema, leaf)) {
            continue;
        }
        map.insert(leaf.to_string(), json!((i as u64 + 1) * 1000));
    }
    Value::Object(map)
}

fn check_aggregate_refs(config: &Value) -> Result<(), String> {
    let Some(interfaces) = tree::lookup(config, &["interfaces", "interface"]).and_then(Value::as_object) else {
        return Ok(());
    };
    for (name, intf) in interfaces {
        let Some(agg) = aggregate_of(intf) else {
            continue;
        };
        if !interfaces.get(agg).is_some_and(is_aggregate) {
            return Err(format!("{} references aggregate {} which is not a LAG interface", name, agg));
        }
    }
    Ok(())
}

#[async_trait]
impl Telemetry for SimDevice {
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
impl DeviceClient for SimDevice {
    fn vendor(&self) -> Vendor {
        self.inner.vendor
    }

    #[instrument(skip(self, value), fields(device = %self.inner.name))]
    async fn replace(&self, path: &TelemetryPath, value: Value) -> ClientResult<()> {
        let applied = value.clone();
        self.inner.commit(WriteOp::Replace, path, Some(value), move |config, segs| {
            tree::replace(config, segs, applied)
        })
    }

    #[instrument(skip(self, value), fields(device = %self.inner.name))]
    async fn update(&self, path: &TelemetryPath, value: Value) -> ClientResult<()> {
        let applied = value.clone();
        self.inner.commit(WriteOp::Update, path, Some(value), move |config, segs| {
            tree::update(config, segs, applied)
        })
    }

    #[instrument(skip(self), fields(device = %self.inner.name))]
    async fn delete(&self, path: &TelemetryPath) -> ClientResult<()> {
        self.inner.commit(WriteOp::Delete, path, None, tree::delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimTestbed;
    use aggtest_client::paths;
    use pretty_assertions::assert_eq;

    fn testbed() -> SimTestbed {
        SimTestbed::builder()
            .link("port1", "Ethernet1", "1/1")
            .link("port2", "Ethernet2", "1/2")
            .link("port3", "Ethernet3", "1/3")
            .build()
    }

    async fn make_lag(dut: &SimDevice, lag_type: &str, members: &[&str]) {
        dut.replace(
            &paths::device::interface("Agg1"),
            json!({"name": "Agg1", "type": "ieee8023adLag", "aggregation": {"lag-type": lag_type}}),
        )
        .await
        .unwrap();
        for member in members {
            dut.update(
                &paths::device::interface(member),
                json!({"name": member, "ethernet": {"aggregate-id": "Agg1"}}),
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_physical_ports_present_in_state() {
        let testbed = testbed();
        let dut = testbed.dut();

        let status = dut.get(&paths::device::oper_status("Ethernet2").state()).await.unwrap();
        assert_eq!(status, json!("UP"));
        assert_eq!(dut.lookup(&paths::device::interface("Ethernet2")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_static_lag_comes_up_with_members() {
        let testbed = testbed();
        let dut = testbed.dut();
        make_lag(dut, "STATIC", &["Ethernet2", "Ethernet3"]).await;

        let path = paths::device::oper_status("Agg1").state();
        assert_eq!(dut.get(&path).await.unwrap(), json!("UP"));

        testbed.set_link("port2", false);
        testbed.set_link("port3", false);
        assert_eq!(dut.get(&path).await.unwrap(), json!("LOWER_LAYER_DOWN"));
    }

    #[tokio::test]
    async fn test_lacp_lag_needs_partner() {
        let testbed = testbed();
        let dut = testbed.dut();
        make_lag(dut, "LACP", &["Ethernet2"]).await;

        let path = paths::device::oper_status("Agg1").state();
        assert_eq!(dut.get(&path).await.unwrap(), json!("LOWER_LAYER_DOWN"));
    }

    #[tokio::test]
    async fn test_min_links_gates_oper_status() {
        let testbed = testbed();
        let dut = testbed.dut();
        make_lag(dut, "STATIC", &["Ethernet2", "Ethernet3"]).await;
        dut.update(&paths::device::interface("Agg1"), json!({"aggregation": {"min-links": 2}}))
            .await
            .unwrap();

        testbed.set_link("port3", false);
        let path = paths::device::oper_status("Agg1").state();
        assert_eq!(dut.get(&path).await.unwrap(), json!("LOWER_LAYER_DOWN"));
    }

    #[tokio::test]
    async fn test_reject_rule_covers_ancestor_writes() {
        let testbed = testbed();
        let dut = testbed.dut();
        dut.reject_writes(None, &paths::device::lacp_interface("Agg1"), "lacp not supported");

        let err = dut
            .update(
                &paths::device::root(),
                json!({"lacp": {"interfaces": {"interface": {"Agg1": {"name": "Agg1"}}}}}),
            )
            .await
            .unwrap_err();
        assert!(err.is_rejection());

        dut.update(&paths::device::root(), json!({"interfaces": {}})).await.unwrap();
        assert_eq!(dut.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_strict_refs_reject_dangling_member() {
        let testbed = testbed();
        let dut = testbed.dut();
        dut.set_strict_aggregate_refs(true);

        let err = dut
            .replace(
                &paths::device::interface("Ethernet2"),
                json!({"name": "Ethernet2", "ethernet": {"aggregate-id": "Agg1"}}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Agg1"));
        assert_eq!(dut.config_tree(), json!({}));
    }

    #[tokio::test]
    async fn test_counters_and_unsupported_leaves() {
        let testbed = testbed();
        let dut = testbed.dut();
        dut.replace(
            &paths::device::interface("Agg1"),
            json!({
                "name": "Agg1",
                "type": "ieee8023adLag",
                "subinterfaces": {"subinterface": {"0": {"index": 0, "ipv4": {}, "ipv6": {}}}}
            }),
        )
        .await
        .unwrap();
        dut.mark_counter_unsupported(format!("{}in-errors", INTF_COUNTER_PATH));

        let present = dut
            .lookup(&paths::device::counter("Agg1", "in-pkts").state())
            .await
            .unwrap();
        assert!(present.is_some());
        let missing = dut
            .lookup(&paths::device::counter("Agg1", "in-errors").state())
            .await
            .unwrap();
        assert_eq!(missing, None);
        let v6 = dut
            .lookup(&paths::device::subinterface_counter("Agg1", 0, "ipv6", "in-discarded-pkts").state())
            .await
            .unwrap();
        assert!(v6.is_some());

        dut.set_subinterface_counters_missing(true);
        let v4 = dut
            .lookup(&paths::device::subinterface_counter("Agg1", 0, "ipv4", "in-pkts").state())
            .await
            .unwrap();
        assert_eq!(v4, None);
    }

    #[tokio::test]
    async fn test_subscribe_yields_current_then_changes() {
        let testbed = testbed();
        let dut = testbed.dut();
        let mut stream = dut
            .subscribe(&paths::device::interface_type("Agg1").state())
            .await
            .unwrap();

        assert_eq!(stream.next().await, Some(None));
        dut.replace(
            &paths::device::interface("Agg1"),
            json!({"name": "Agg1", "type": "ieee8023adLag"}),
        )
        .await
        .unwrap();
        assert_eq!(stream.next().await, Some(Some(json!("ieee8023adLag"))));
    }
}
