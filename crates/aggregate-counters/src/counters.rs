//! Counter presence audit on the aggregate interface.
//!
//! Only presence is checked. Absolute counts depend on whatever traffic the
//! environment happened to carry, so no value is asserted.

use aggtest_client::paths::{self, INTF_COUNTER_PATH, IPV4_COUNTER_PATH, IPV6_COUNTER_PATH};
use aggtest_client::{DeviceClient, Deviations, TelemetryPath};
use aggtest_types::{InterfaceType, OperStatus};
use tracing::{info, instrument};

use crate::convergence::Convergence;
use crate::report::{Checks, StepReport};

/// Interface-level counters: report name and leaf.
const INTERFACE_COUNTERS: [(&str, &str); 10] = [
    ("InUnicastPkts", "in-unicast-pkts"),
    ("OutUnicastPkts", "out-unicast-pkts"),
    ("InMulticastPkts", "in-multicast-pkts"),
    ("OutMulticastPkts", "out-multicast-pkts"),
    ("InPkts", "in-pkts"),
    ("OutPkts", "out-pkts"),
    ("InDiscards", "in-discards"),
    ("OutDiscards", "out-discards"),
    ("InErrors", "in-errors"),
    ("OutErrors", "out-errors"),
];

/// One counter the audit looks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSpec {
    pub name: &'static str,
    /// Schema path, as reported on failure.
    pub schema_path: String,
    /// State path on the aggregate.
    pub path: TelemetryPath,
    pub skip: bool,
}

impl CounterSpec {
    fn interface(aggregate_id: &str, name: &'static str, leaf: &str) -> Self {
        Self {
            name,
            schema_path: format!("{}{}", INTF_COUNTER_PATH, leaf),
            path: paths::device::counter(aggregate_id, leaf).state(),
            skip: false,
        }
    }

    fn subinterface(aggregate_id: &str, name: &'static str, family: &str, leaf: &str) -> Self {
        let prefix = if family == "ipv4" {
            IPV4_COUNTER_PATH
        } else {
            IPV6_COUNTER_PATH
        };
        Self {
            name,
            schema_path: format!("{}{}", prefix, leaf),
            path: paths::device::subinterface_counter(aggregate_id, 0, family, leaf).state(),
            skip: false,
        }
    }

    fn skipped_if(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }
}

/// Returns the audited counters of `aggregate_id`, in report order.
pub fn counter_specs(aggregate_id: &str, deviations: &Deviations) -> Vec<CounterSpec> {
    let skip_v6_discards = deviations.skip_ipv6_discarded_pkts();

    let mut specs: Vec<CounterSpec> = INTERFACE_COUNTERS
        .iter()
        .map(|&(name, leaf)| CounterSpec::interface(aggregate_id, name, leaf))
        .collect();
    specs.extend([
        CounterSpec::subinterface(aggregate_id, "IPv4InPkts", "ipv4", "in-pkts"),
        CounterSpec::subinterface(aggregate_id, "IPv4OutPkts", "ipv4", "out-pkts"),
        CounterSpec::subinterface(aggregate_id, "IPv6InPkts", "ipv6", "in-pkts"),
        CounterSpec::subinterface(aggregate_id, "IPv6OutPkts", "ipv6", "out-pkts"),
        CounterSpec::subinterface(aggregate_id, "IPv6InDiscardedPkts", "ipv6", "in-discarded-pkts")
            .skipped_if(skip_v6_discards),
        CounterSpec::subinterface(aggregate_id, "IPv6OutDiscardedPkts", "ipv6", "out-discarded-pkts")
            .skipped_if(skip_v6_discards),
    ]);
    specs
}

/// Looks up the aggregate's counters once it is up.
pub struct CounterAuditor<'a, D: DeviceClient + ?Sized> {
    dut: &'a D,
    convergence: Convergence,
}

impl<'a, D: DeviceClient + ?Sized> CounterAuditor<'a, D> {
    pub fn new(dut: &'a D, convergence: Convergence) -> Self {
        Self { dut, convergence }
    }

    /// Awaits the aggregate's type and oper-status, then checks every counter.
    /// Each counter becomes a sub-step of `step`; a failed await ends `step`.
    #[instrument(skip(self, specs, step))]
    pub async fn audit(&self, aggregate_id: &str, specs: &[CounterSpec], step: &mut StepReport) {
        let ready = async {
            self.convergence
                .await_value(
                    self.dut,
                    &paths::device::interface_type(aggregate_id).state(),
                    &InterfaceType::Ieee8023adLag,
                )
                .await?;
            info!(aggregate = aggregate_id, "Waiting for the aggregate to be up");
            self.convergence
                .await_value(
                    self.dut,
                    &paths::device::oper_status(aggregate_id).state(),
                    &OperStatus::Up,
                )
                .await
        };
        if let Err(e) = ready.await {
            step.abort(e);
            return;
        }

        for spec in specs {
            step.push(self.check(spec).await);
        }
    }

    async fn check(&self, spec: &CounterSpec) -> StepReport {
        if spec.skip {
            return StepReport::skipped(spec.name, format!("Counter {} is not supported.", spec.name));
        }
        StepReport::run(spec.name, |mut checks: Checks| async move {
            let result = match self.dut.lookup(&spec.path).await {
                Ok(Some(value)) => {
                    info!(path = %spec.schema_path, %value, "Got path/value");
                    Ok(())
                }
                Ok(None) => {
                    checks.fail(format!(
                        "Get IsPresent status for path {:?}: got false, want true",
                        spec.schema_path
                    ));
                    Ok(())
                }
                Err(e) => Err(e.into()),
            };
            (checks, result)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::StepOutcome;
    use aggtest_client::Vendor;
    use aggtest_sim::{fixtures, SimDevice};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn convergence() -> Convergence {
        Convergence::new(Duration::from_secs(60), Duration::from_millis(500))
    }

    async fn configure_up_aggregate(dut: &SimDevice) {
        dut.replace(
            &paths::device::interface("Agg1"),
            json!({
                "name": "Agg1",
                "type": "ieee8023adLag",
                "aggregation": {"lag-type": "STATIC"},
                "subinterfaces": {"subinterface": {"0": {
                    "index": 0,
                    "ipv4": {"addresses": {"address": {"192.0.2.5": {"ip": "192.0.2.5", "prefix-length": 30}}}},
                    "ipv6": {"addresses": {"address": {"2001:db8::5": {"ip": "2001:db8::5", "prefix-length": 126}}}}
                }}}
            }),
        )
        .await
        .unwrap();
        dut.replace(
            &paths::device::interface("Ethernet2"),
            json!({"name": "Ethernet2", "type": "ethernetCsmacd", "ethernet": {"aggregate-id": "Agg1"}}),
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_specs_order_and_skips() {
        let specs = counter_specs("Agg1", &Deviations::for_vendor(Vendor::Cisco));
        assert_eq!(specs.len(), 16);
        assert_eq!(specs[0].name, "InUnicastPkts");
        assert_eq!(specs[0].schema_path, "/interfaces/interface/state/counters/in-unicast-pkts");
        assert_eq!(specs[10].name, "IPv4InPkts");
        let skipped: Vec<&str> = specs.iter().filter(|s| s.skip).map(|s| s.name).collect();
        assert_eq!(skipped, vec!["IPv6InDiscardedPkts", "IPv6OutDiscardedPkts"]);

        let all = counter_specs("Agg1", &Deviations::default());
        assert!(all.iter().all(|s| !s.skip));
    }

    #[tokio::test(start_paused = true)]
    async fn test_audit_skips_unsupported_ipv6_discards() {
        let testbed = fixtures::testbed(Vendor::Other, 2);
        let dut = testbed.dut();
        configure_up_aggregate(dut).await;

        let devs = Deviations {
            ipv6_discarded_pkts_unsupported: true,
            ..Deviations::default()
        };
        let mut step = StepReport::new("counters");
        CounterAuditor::new(dut, convergence())
            .audit("Agg1", &counter_specs("Agg1", &devs), &mut step)
            .await;

        assert!(step.passed(), "{}", step);
        assert_eq!(step.children.len(), 16);
        let passed = step
            .children
            .iter()
            .filter(|c| c.outcome == StepOutcome::Passed)
            .count();
        let skipped: Vec<&str> = step
            .children
            .iter()
            .filter(|c| matches!(c.outcome, StepOutcome::Skipped(_)))
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(passed, 14);
        assert_eq!(skipped, vec!["IPv6InDiscardedPkts", "IPv6OutDiscardedPkts"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_counter_fails_only_its_step() {
        let testbed = fixtures::testbed(Vendor::Other, 2);
        let dut = testbed.dut();
        configure_up_aggregate(dut).await;
        dut.mark_counter_unsupported(format!("{}in-errors", INTF_COUNTER_PATH));

        let mut step = StepReport::new("counters");
        CounterAuditor::new(dut, convergence())
            .audit("Agg1", &counter_specs("Agg1", &Deviations::default()), &mut step)
            .await;

        assert!(!step.passed());
        let failed: Vec<&str> = step
            .children
            .iter()
            .filter(|c| c.outcome.is_failed())
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(failed, vec!["InErrors"]);
        assert_eq!(step.children.len(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregate_down_aborts_audit() {
        let testbed = fixtures::testbed(Vendor::Other, 2);
        let dut = testbed.dut();
        configure_up_aggregate(dut).await;
        testbed.set_link("port2", false);

        let mut step = StepReport::new("counters");
        CounterAuditor::new(dut, convergence())
            .audit("Agg1", &counter_specs("Agg1", &Deviations::default()), &mut step)
            .await;

        assert!(step.outcome.is_failed());
        assert!(step.children.is_empty());
    }
}
