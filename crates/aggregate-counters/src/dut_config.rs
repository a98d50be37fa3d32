//! Device under test configuration.
//!
//! Builds the source, aggregate and member interface objects and pushes
//! them with replace semantics, so pushing the same objects twice leaves
//! the device unchanged. Devices that cannot change an aggregate
//! incrementally get the whole aggregate in one transaction
//! ([`DeviceConfigurator::atomic_aggregate_setup`]) after a full teardown
//! ([`DeviceConfigurator::clear_and_recreate_aggregate`]).

use aggtest_client::oc::{Interface, Root};
use aggtest_client::{encode, paths, DeviceClient, Deviations, Port, TelemetryPath};
use aggtest_types::{Attributes, InterfaceType};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::convergence::Convergence;
use crate::error::{AggTestError, AggTestResult};
use crate::topology::{AggregateConfig, SidePlan};

/// Number of teardown/rebuild rounds per clear.
const REBUILD_ROUNDS: usize = 2;

/// Pushes device configuration for one aggregate test.
pub struct DeviceConfigurator<'a, D: DeviceClient + ?Sized> {
    dut: &'a D,
    deviations: &'a Deviations,
    convergence: Convergence,
}

impl<'a, D: DeviceClient + ?Sized> DeviceConfigurator<'a, D> {
    pub fn new(dut: &'a D, deviations: &'a Deviations, convergence: Convergence) -> Self {
        Self {
            dut,
            deviations,
            convergence,
        }
    }

    /// Builds the routed interface carrying `attrs` on subinterface 0.
    pub fn source_interface(&self, name: &str, attrs: &Attributes) -> Interface {
        let mut intf = Interface::named(name);
        intf.description = Some(attrs.desc.clone());
        if self.deviations.interface_enabled {
            intf.enabled = Some(true);
        }

        let sub = intf.get_or_create_subinterface(0);
        let v4 = sub.get_or_create_ipv4();
        if self.deviations.ipv4_enabled_leaf() {
            v4.enabled = Some(true);
        }
        v4.get_or_create_address(&attrs.ipv4.address().to_string())
            .prefix_length = Some(attrs.ipv4.prefix_len());

        let v6 = sub.get_or_create_ipv6();
        if self.deviations.interface_enabled {
            v6.enabled = Some(true);
        }
        v6.get_or_create_address(&attrs.ipv6.address().to_string())
            .prefix_length = Some(attrs.ipv6.prefix_len());

        intf
    }

    /// Builds the aggregate interface: routed, typed as a LAG, with the
    /// aggregation type set.
    pub fn aggregate_interface(&self, aggregate: &AggregateConfig, attrs: &Attributes) -> Interface {
        let mut intf = self.source_interface(&aggregate.aggregate_id, attrs);
        intf.if_type = Some(InterfaceType::Ieee8023adLag);
        intf.get_or_create_aggregation().lag_type = Some(aggregate.lag_type);
        intf
    }

    /// Builds a member interface bound to the aggregate.
    pub fn member_interface(&self, port: &Port, aggregate_id: &str) -> Interface {
        let mut intf = Interface::named(&port.name);
        intf.description = Some(port.to_string());
        intf.if_type = Some(InterfaceType::EthernetCsmacd);
        if self.deviations.interface_enabled {
            intf.enabled = Some(true);
        }
        intf.get_or_create_ethernet().aggregate_id = Some(aggregate_id.to_string());
        intf
    }

    #[instrument(skip(self, attrs), fields(port = %port))]
    pub async fn configure_source_interface(&self, port: &Port, attrs: &Attributes) -> AggTestResult<()> {
        let mut intf = self.source_interface(&port.name, attrs);
        intf.if_type = Some(InterfaceType::EthernetCsmacd);
        self.replace(&paths::device::interface(&port.name), &intf).await
    }

    #[instrument(skip(self, aggregate, attrs), fields(aggregate = %aggregate.aggregate_id))]
    pub async fn configure_aggregate_interface(
        &self,
        aggregate: &AggregateConfig,
        attrs: &Attributes,
    ) -> AggTestResult<()> {
        let intf = self.aggregate_interface(aggregate, attrs);
        self.replace(&paths::device::interface(&aggregate.aggregate_id), &intf)
            .await
    }

    #[instrument(skip(self), fields(port = %port))]
    pub async fn configure_member_interface(&self, port: &Port, aggregate_id: &str) -> AggTestResult<()> {
        let intf = self.member_interface(port, aggregate_id);
        self.replace(&paths::device::interface(&port.name), &intf).await
    }

    /// Creates the LACP interface (for LACP), the typed aggregate and every
    /// member binding in one update, so no member ever references a missing
    /// or mistyped aggregate.
    #[instrument(skip(self, aggregate), fields(aggregate = %aggregate.aggregate_id))]
    pub async fn atomic_aggregate_setup(&self, aggregate: &AggregateConfig) -> AggTestResult<()> {
        let mut root = Root::default();
        if aggregate.lag_type.is_lacp() {
            root.get_or_create_lacp_interface(&aggregate.aggregate_id);
        }

        let agg = root.get_or_create_interface(&aggregate.aggregate_id);
        agg.get_or_create_aggregation().lag_type = Some(aggregate.lag_type);
        agg.if_type = Some(InterfaceType::Ieee8023adLag);

        for port in &aggregate.members {
            let intf = root.get_or_create_interface(&port.name);
            intf.get_or_create_ethernet().aggregate_id = Some(aggregate.aggregate_id.clone());
            intf.if_type = Some(InterfaceType::EthernetCsmacd);
            if self.deviations.interface_enabled {
                intf.enabled = Some(true);
            }
        }

        self.update(&paths::device::root(), &root).await
    }

    /// Tears the aggregate down and rebuilds it, twice. Each round deletes
    /// min-links, every member binding and the aggregate itself, recreates
    /// the aggregate shell and full configuration, re-binds the members
    /// and awaits the aggregate's reported type.
    #[instrument(skip(self, aggregate, attrs), fields(aggregate = %aggregate.aggregate_id))]
    pub async fn clear_and_recreate_aggregate(
        &self,
        aggregate: &AggregateConfig,
        attrs: &Attributes,
    ) -> AggTestResult<()> {
        let id = aggregate.aggregate_id.as_str();
        for round in 0..REBUILD_ROUNDS {
            info!(round, "Deleting and recreating the aggregate");

            self.delete(&paths::device::min_links(id)).await?;
            for port in &aggregate.members {
                self.delete(&paths::device::aggregate_id(&port.name)).await?;
            }

            let mut shell = Interface::named(id);
            shell.if_type = Some(InterfaceType::Ieee8023adLag);
            self.delete(&paths::device::interface(id)).await?;
            self.update(&paths::device::interface(id), &shell).await?;

            self.configure_aggregate_interface(aggregate, attrs).await?;

            for port in &aggregate.members {
                let mut intf = Interface::named(&port.name);
                intf.if_type = Some(InterfaceType::EthernetCsmacd);
                intf.get_or_create_ethernet().aggregate_id = Some(id.to_string());
                self.update(&paths::device::interface(&port.name), &intf)
                    .await?;
            }

            self.convergence
                .await_value(
                    self.dut,
                    &paths::device::interface_type(id).state(),
                    &InterfaceType::Ieee8023adLag,
                )
                .await?;
        }
        Ok(())
    }

    /// Binds subinterface 0 of `interface` to the default network instance.
    pub async fn assign_to_default_network_instance(&self, interface: &str) -> AggTestResult<()> {
        let ni = self.deviations.default_network_instance.as_str();
        let mut root = Root::default();
        let entry = root
            .get_or_create_network_instance(ni)
            .add_interface(interface, 0)
            .clone();
        let id = entry.id.clone().unwrap_or_default();
        self.replace(&paths::device::network_instance_interface(ni, &id), &entry)
            .await
    }

    /// Sets the declared speed on `port`.
    pub async fn configure_port_speed(&self, port: &Port) -> AggTestResult<()> {
        self.replace(&paths::device::port_speed(&port.name), &port.speed)
            .await
    }

    /// Applies the full device configuration for one iteration.
    #[instrument(skip_all, fields(aggregate = %aggregate.aggregate_id))]
    pub async fn configure(
        &self,
        plan: &SidePlan,
        aggregate: &AggregateConfig,
        src: &Attributes,
        dst: &Attributes,
        atomic_settle: std::time::Duration,
    ) -> AggTestResult<()> {
        info!(ports = ?plan.ports().map(|p| p.to_string()).collect::<Vec<_>>(), "Configuring DUT");

        if self.deviations.aggregate_atomic_update {
            self.clear_and_recreate_aggregate(aggregate, dst).await?;
            self.atomic_aggregate_setup(aggregate).await?;
        }
        self.convergence
            .settle(atomic_settle, "aggregate configuration")
            .await;

        self.configure_aggregate_interface(aggregate, dst).await?;
        self.configure_source_interface(&plan.source, src).await?;

        if self.deviations.explicit_interface_in_default_vrf {
            self.assign_to_default_network_instance(&aggregate.aggregate_id)
                .await?;
            self.assign_to_default_network_instance(&plan.source.name)
                .await?;
        }

        for port in &aggregate.members {
            self.configure_member_interface(port, &aggregate.aggregate_id)
                .await?;
        }

        if self.deviations.explicit_port_speed {
            for port in plan.ports() {
                self.configure_port_speed(port).await?;
            }
        }
        Ok(())
    }

    async fn replace<T: Serialize>(&self, path: &TelemetryPath, object: &T) -> AggTestResult<()> {
        let value = encode(path, object)?;
        log_query(self.dut.target(), "replace", path, &value);
        self.dut
            .replace(path, value)
            .await
            .map_err(|e| AggTestError::rejected("replace", path.to_string(), e))
    }

    async fn update<T: Serialize>(&self, path: &TelemetryPath, object: &T) -> AggTestResult<()> {
        let value = encode(path, object)?;
        log_query(self.dut.target(), "update", path, &value);
        self.dut
            .update(path, value)
            .await
            .map_err(|e| AggTestError::rejected("update", path.to_string(), e))
    }

    async fn delete(&self, path: &TelemetryPath) -> AggTestResult<()> {
        debug!(target_device = self.dut.target(), %path, "delete");
        self.dut
            .delete(path)
            .await
            .map_err(|e| AggTestError::rejected("delete", path.to_string(), e))
    }
}

/// Logs a configuration body before it is pushed.
fn log_query(target: &str, op: &str, path: &TelemetryPath, value: &serde_json::Value) {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    debug!(target_device = target, op, %path, "{}", body);
}
