//! The aggregate counters test workflow.
//!
//! One run is a fixed number of iterations over the same aggregate. Each
//! iteration configures the device, lets the LAG negotiate, verifies the
//! device ports, verifies the traffic generator LAG and audits the
//! aggregate's counters. The generator topology is pushed once, in the
//! first iteration; every iteration but the last ends by tearing the
//! aggregate down and rebuilding it.

use std::collections::BTreeMap;

use aggtest_client::otg::{LacpMemberMetrics, LagMetrics, LinkState, OtgConfig, PortMetrics};
use aggtest_client::{decode, get_as, lookup_as, paths, DeviceClient, Deviations, Port, TrafficClient};
use aggtest_types::{AdminStatus, Attributes, InterfaceType, OperStatus, PortRole};
use tracing::{info, instrument};

use crate::ate_config::{build_topology, LinkEndpoints, TrafficConfigurator};
use crate::config::{AggTestConfig, TestSection, TimingConfig};
use crate::convergence::Convergence;
use crate::counters::{counter_specs, CounterAuditor};
use crate::dut_config::DeviceConfigurator;
use crate::endpoints;
use crate::error::{AggTestError, AggTestResult};
use crate::report::{Checks, RunReport, StepReport};
use crate::topology::{next_aggregate_interface, AggregateConfig, Topology};

/// Addressing of the four endpoints.
#[derive(Debug, Clone)]
struct Endpoints {
    dut_src: Attributes,
    ate_src: Attributes,
    dut_dst: Attributes,
    ate_dst: Attributes,
}

impl Endpoints {
    fn standard() -> Self {
        Self {
            dut_src: endpoints::dut_src(),
            ate_src: endpoints::ate_src(),
            dut_dst: endpoints::dut_dst(),
            ate_dst: endpoints::ate_dst(),
        }
    }

    /// Checks that each generator end sits on its device end's subnets and
    /// carries a unicast MAC.
    fn check(&self) -> AggTestResult<()> {
        for (dut, ate) in [(&self.dut_src, &self.ate_src), (&self.dut_dst, &self.ate_dst)] {
            if !dut.is_peer_of(ate) {
                return Err(AggTestError::config(format!(
                    "endpoint {} ({}, {}) is not on the subnets of {:?} ({}, {})",
                    ate.name, ate.ipv4, ate.ipv6, dut.desc, dut.ipv4, dut.ipv6
                )));
            }
            if ate.mac.is_some_and(|mac| mac.is_multicast()) {
                return Err(AggTestError::config(format!(
                    "endpoint {} has a multicast MAC address",
                    ate.name
                )));
            }
        }
        Ok(())
    }

    fn links(&self) -> LinkEndpoints<'_> {
        LinkEndpoints {
            ate_src: &self.ate_src,
            dut_src: &self.dut_src,
            ate_dst: &self.ate_dst,
            dut_dst: &self.dut_dst,
        }
    }
}

/// One aggregate counters run against a device and its traffic generator.
pub struct AggregateTest<'a, D: DeviceClient + ?Sized, A: TrafficClient + ?Sized> {
    dut: &'a D,
    ate: &'a A,
    deviations: Deviations,
    timing: TimingConfig,
    iterations: u32,
    convergence: Convergence,
    topology: Topology,
    aggregate: AggregateConfig,
    endpoints: Endpoints,
    ate_topology: OtgConfig,
}

impl<'a, D, A> AggregateTest<'a, D, A>
where
    D: DeviceClient + ?Sized,
    A: TrafficClient + ?Sized,
{
    /// Plans the run: assigns port roles, picks the aggregate name if none
    /// is given and builds the generator topology.
    #[instrument(skip_all, fields(dut = dut.target(), ate = ate.target()))]
    pub async fn new(
        dut: &'a D,
        ate: &'a A,
        test: &TestSection,
        timing: &TimingConfig,
        deviations: Deviations,
    ) -> AggTestResult<Self> {
        let topology = Topology::plan(dut.ports(), ate.ports())?;

        let aggregate_id = match &test.aggregate_id {
            Some(id) => id.clone(),
            None => next_aggregate_interface(dut).await?,
        };
        let aggregate = AggregateConfig::new(aggregate_id, test.lag_type, topology.dut.members.clone());

        let endpoints = Endpoints::standard();
        endpoints.check()?;
        let ate_topology = build_topology(
            &topology.ate,
            &aggregate.aggregate_id,
            aggregate.lag_type,
            endpoints.links(),
        )?;

        info!(
            aggregate = %aggregate.aggregate_id,
            lag_type = %aggregate.lag_type,
            iterations = test.iterations,
            "Planned aggregate test"
        );

        Ok(Self {
            dut,
            ate,
            deviations,
            timing: timing.clone(),
            iterations: test.iterations,
            convergence: Convergence::from_timing(timing),
            topology,
            aggregate,
            endpoints,
            ate_topology,
        })
    }

    /// Plans the run from a loaded configuration file.
    pub async fn from_config(dut: &'a D, ate: &'a A, config: &AggTestConfig) -> AggTestResult<Self> {
        Self::new(dut, ate, &config.test, &config.timing, config.deviations()).await
    }

    pub fn aggregate(&self) -> &AggregateConfig {
        &self.aggregate
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Runs every iteration. Iterations run even after an earlier one
    /// failed; the report records each outcome.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        let mut reset = StepReport::new("ResetATE");
        if let Err(e) = TrafficConfigurator::new(self.ate).reset().await {
            reset.abort(e);
            report.push(reset);
            return report;
        }
        report.push(reset);

        for iteration in 1..=self.iterations {
            report.push(self.iteration(iteration).await);
        }
        report
    }

    async fn iteration(&self, iteration: u32) -> StepReport {
        let mut step = StepReport::new(format!(
            "LagType={}, Iteration={}",
            self.aggregate.lag_type, iteration
        ));
        info!(step = %step.name, "Starting iteration");
        if let Err(e) = self.iteration_steps(iteration, &mut step).await {
            step.abort(e);
        }
        step
    }

    async fn iteration_steps(&self, iteration: u32, step: &mut StepReport) -> AggTestResult<()> {
        self.configure_dut().await?;
        self.convergence
            .settle(self.timing.lag_settle(), "LAG negotiation")
            .await;

        step.push(self.verify_dut().await);

        if iteration == 1 {
            TrafficConfigurator::new(self.ate)
                .apply(&self.ate_topology)
                .await?;
        }
        step.push(self.verify_ate().await);

        let specs = counter_specs(&self.aggregate.aggregate_id, &self.deviations);
        CounterAuditor::new(self.dut, self.convergence)
            .audit(&self.aggregate.aggregate_id, &specs, step)
            .await;
        if step.outcome.is_failed() {
            return Ok(());
        }

        if iteration < self.iterations {
            info!("Now clear the aggregate from device, re-create it and repeat the test");
            self.configurator()
                .clear_and_recreate_aggregate(&self.aggregate, &self.endpoints.dut_dst)
                .await?;
        }
        Ok(())
    }

    fn configurator(&self) -> DeviceConfigurator<'_, D> {
        DeviceConfigurator::new(self.dut, &self.deviations, self.convergence)
    }

    async fn configure_dut(&self) -> AggTestResult<()> {
        self.configurator()
            .configure(
                &self.topology.dut,
                &self.aggregate,
                &self.endpoints.dut_src,
                &self.endpoints.dut_dst,
                self.timing.atomic_settle(),
            )
            .await
    }

    /// Awaits the aggregate type, then checks every device port as a
    /// sub-step.
    async fn verify_dut(&self) -> StepReport {
        let mut step = StepReport::new("VerifyDUT");
        let id = self.aggregate.aggregate_id.as_str();

        if let Err(e) = self
            .convergence
            .await_value(
                self.dut,
                &paths::device::interface_type(id).state(),
                &InterfaceType::Ieee8023adLag,
            )
            .await
        {
            step.abort(e);
            return step;
        }

        for (port, role) in self.topology.dut.roles() {
            let name = format!("{} [{}]", port.id, role);
            let port_step = StepReport::run(name, |mut checks| async move {
                let result = self.verify_dut_port(port, role, &mut checks).await;
                (checks, result)
            })
            .await;
            step.push(port_step);
        }
        step
    }

    async fn verify_dut_port(&self, port: &Port, role: PortRole, checks: &mut Checks) -> AggTestResult<()> {
        let admin: Option<AdminStatus> =
            lookup_as(self.dut, &paths::device::admin_status(&port.name).state()).await?;
        checks.check(admin == Some(AdminStatus::Up), || {
            format!("{} admin-status got {}, want UP", port, describe(admin))
        });

        self.convergence
            .await_value(
                self.dut,
                &paths::device::oper_status(&port.name).state(),
                &OperStatus::Up,
            )
            .await?;

        if role == PortRole::Member {
            let aggregate_id: Option<String> =
                lookup_as(self.dut, &paths::device::aggregate_id(&port.name).state()).await?;
            let want = self.aggregate.aggregate_id.as_str();
            checks.check(aggregate_id.as_deref() == Some(want), || {
                format!("{} LagID got {}, want {}", port, describe(aggregate_id.as_deref()), want)
            });
        }
        Ok(())
    }

    /// Logs generator LAG metrics, checks the source port link and watches
    /// the generator LAG until it is up.
    async fn verify_ate(&self) -> StepReport {
        StepReport::run("VerifyATE", |mut checks| async move {
            self.convergence
                .settle(self.timing.otg_settle(), "traffic generator statistics")
                .await;

            checks.soft(self.log_lag_metrics().await);
            if self.aggregate.lag_type.is_lacp() {
                checks.soft(self.log_lacp_metrics().await);
            }

            let source = &self.topology.ate.source;
            match get_as::<PortMetrics, _>(self.ate, &paths::otg::port(&source.id).state()).await {
                Ok(metrics) => checks.check(metrics.link == Some(LinkState::Up), || {
                    format!("{} oper-status got {:?}, want UP", source.id, metrics.link)
                }),
                Err(e) => checks.fail(e.to_string()),
            }

            info!("Checking if LAG is up on OTG");
            let lag = self.endpoints.ate_dst.name.as_str();
            let result = self
                .convergence
                .watch(
                    self.ate,
                    &paths::otg::lag_oper_status(lag).state(),
                    |s: &OperStatus| s.is_up(),
                )
                .await
                .map(|_| ());
            (checks, result)
        })
        .await
    }

    async fn log_lag_metrics(&self) -> AggTestResult<()> {
        for lag in &self.ate_topology.lags {
            let metrics: Option<LagMetrics> =
                lookup_as(self.ate, &paths::otg::lag(&lag.name).state()).await?;
            let metrics = metrics.unwrap_or_default();
            info!(
                lag = %lag.name,
                oper_status = %describe(metrics.oper_status),
                member_ports_up = metrics.member_ports_up.unwrap_or_default(),
                frames_tx = metrics.frames_tx.unwrap_or_default(),
                frames_rx = metrics.frames_rx.unwrap_or_default(),
                "LAG metrics"
            );
        }
        Ok(())
    }

    async fn log_lacp_metrics(&self) -> AggTestResult<()> {
        let path = paths::otg::lacp_members().state();
        let Some(value) = self.ate.lookup(&path).await? else {
            return Ok(());
        };
        let Some(members) = value.get("lag-member") else {
            return Ok(());
        };
        let members: BTreeMap<String, LacpMemberMetrics> = decode(&path, members.clone())?;
        for (port, m) in &members {
            info!(
                port = %port,
                lag = m.lag_name.as_deref().unwrap_or_default(),
                synchronization = m.synchronization.as_deref().unwrap_or_default(),
                collecting = m.collecting.unwrap_or_default(),
                distributing = m.distributing.unwrap_or_default(),
                lacp_rx = m.lacp_packets_rx.unwrap_or_default(),
                lacp_tx = m.lacp_packets_tx.unwrap_or_default(),
                "LACP member metrics"
            );
        }
        Ok(())
    }
}

fn describe<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "nothing".to_string(), |v| v.to_string())
}

/// Plans and runs the workflow, turning a planning failure into a failed
/// "Setup" step.
pub async fn run_workflow<D, A>(dut: &D, ate: &A, config: &AggTestConfig) -> RunReport
where
    D: DeviceClient + ?Sized,
    A: TrafficClient + ?Sized,
{
    match AggregateTest::from_config(dut, ate, config).await {
        Ok(test) => test.run().await,
        Err(e) => setup_failure(e),
    }
}

fn setup_failure(err: AggTestError) -> RunReport {
    let mut step = StepReport::new("Setup");
    step.abort(err);
    let mut report = RunReport::default();
    report.push(step);
    report
}
