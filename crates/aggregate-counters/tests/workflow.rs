//! End-to-end runs of the aggregate counters workflow against the
//! simulated testbed.

use std::io::Write;

use aggregate_counters::{
    run_workflow, AggTestConfig, AggregateTest, ErrorKind, StepOutcome, TestSection, TimingConfig,
};
use aggtest_client::{paths, Deviations, Telemetry, Vendor};
use aggtest_sim::{fixtures, SimAte, SimDevice, SimTestbed, WriteOp, WriteVerifier};
use aggtest_types::{InterfaceType, LagType, OperStatus};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn fast_timing() -> TimingConfig {
    TimingConfig {
        lag_settle_secs: 1,
        otg_settle_secs: 1,
        atomic_settle_secs: 1,
        ..TimingConfig::default()
    }
}

fn section(lag_type: LagType, aggregate_id: &str) -> TestSection {
    TestSection {
        lag_type,
        iterations: 2,
        aggregate_id: Some(aggregate_id.to_string()),
    }
}

async fn planned<'a>(
    testbed: &'a SimTestbed,
    test: &TestSection,
    deviations: Deviations,
) -> AggregateTest<'a, SimDevice, SimAte> {
    AggregateTest::new(testbed.dut(), testbed.ate(), test, &fast_timing(), deviations)
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_four_port_static_aggregate() {
    let testbed = fixtures::four_port_testbed(Vendor::Other);
    let test = planned(&testbed, &section(LagType::Static, "Agg1"), Deviations::default()).await;

    let report = test.run().await;
    assert!(report.passed(), "{}", report);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.skipped_count(), 0);

    // Two iterations of 16 counters each.
    let counters = report
        .steps
        .iter()
        .skip(1)
        .map(|s| s.children.len() - 2)
        .sum::<usize>();
    assert_eq!(counters, 32);

    let dut = testbed.dut();
    assert_eq!(
        dut.get(&paths::device::interface_type("Agg1").state()).await.unwrap(),
        serde_json::json!(InterfaceType::Ieee8023adLag.to_string())
    );
    assert_eq!(
        dut.get(&paths::device::oper_status("Agg1").state()).await.unwrap(),
        serde_json::json!(OperStatus::Up.to_string())
    );
    for member in ["Ethernet2", "Ethernet3", "Ethernet4"] {
        assert_eq!(
            dut.get(&paths::device::aggregate_id(member).state()).await.unwrap(),
            serde_json::json!("Agg1")
        );
    }

    // One teardown between the two iterations.
    let writes = WriteVerifier::new(dut.writes());
    writes.assert_written(WriteOp::Delete, "Agg1").unwrap();
    writes
        .assert_written_before((WriteOp::Delete, "Agg1"), (WriteOp::Update, "Agg1"))
        .unwrap();

    // Reset plus the single topology push.
    let pushes = testbed.ate().pushes();
    assert_eq!(pushes.len(), 2);
    assert!(pushes[0].is_empty());
    assert_eq!(pushes[1].lags.len(), 1);
    assert_eq!(pushes[1].lags[0].ports.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_lacp_aggregate_waits_for_partner() {
    let testbed = fixtures::four_port_testbed(Vendor::Arista);
    let test = planned(
        &testbed,
        &section(LagType::Lacp, "Port-Channel1"),
        Deviations::for_vendor(Vendor::Arista),
    )
    .await;

    let report = test.run().await;
    assert!(report.passed(), "{}", report);
    assert!(testbed.ate().protocols_started());
    assert!(report.step("LagType=LACP, Iteration=2").is_some());
    // Arista does not export the IPv6 discard counters.
    assert_eq!(report.skipped_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_atomic_rebuild_with_strict_references() {
    for vendor in [Vendor::Juniper, Vendor::Nokia] {
        let testbed = fixtures::four_port_testbed(vendor);
        testbed.dut().set_strict_aggregate_refs(true);
        let aggregate_id = vendor.aggregate_name(vendor.first_aggregate_index());
        let test = planned(
            &testbed,
            &section(LagType::Static, &aggregate_id),
            Deviations::for_vendor(vendor),
        )
        .await;

        let report = test.run().await;
        assert!(report.passed(), "{}: {}", vendor, report);

        // The aggregate and its members are committed in one write.
        let writes = WriteVerifier::new(testbed.dut().writes());
        assert!(writes.count(WriteOp::Update) >= 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_ipv6_discards_are_skipped() {
    let testbed = fixtures::four_port_testbed(Vendor::Cisco);
    let test = planned(
        &testbed,
        &section(LagType::Static, "Bundle-Ether1"),
        Deviations::for_vendor(Vendor::Cisco),
    )
    .await;

    let report = test.run().await;
    assert!(report.passed(), "{}", report);
    assert_eq!(report.skipped_count(), 4);

    let iteration = report.step("LagType=STATIC, Iteration=1").unwrap();
    let present = iteration
        .children
        .iter()
        .filter(|c| c.name != "VerifyDUT" && c.name != "VerifyATE")
        .filter(|c| c.outcome == StepOutcome::Passed)
        .count();
    assert_eq!(present, 14);
    assert!(matches!(
        iteration.find("IPv6OutDiscardedPkts").unwrap().outcome,
        StepOutcome::Skipped(_)
    ));
}

/// Asserts that `name` failed while every counter of the iteration was
/// still audited.
fn assert_only_step_failed(report: &aggregate_counters::RunReport, iteration: &str, name: &str) {
    let iteration = report.step(iteration).unwrap();
    assert!(!iteration.outcome.is_failed(), "{}", report);
    assert!(iteration.find(name).unwrap().outcome.is_failed(), "{}", report);

    let counters: Vec<_> = iteration
        .children
        .iter()
        .filter(|c| c.name != "VerifyDUT" && c.name != "VerifyATE")
        .collect();
    assert_eq!(counters.len(), 16);
    assert!(counters.iter().all(|c| c.passed()), "{}", report);
}

#[tokio::test(start_paused = true)]
async fn test_generator_source_link_down_is_not_fatal() {
    let testbed = fixtures::four_port_testbed(Vendor::Other);
    let test = planned(&testbed, &section(LagType::Static, "Agg1"), Deviations::default()).await;
    testbed.ate().set_port_down("port1", true);

    let report = test.run().await;
    assert!(!report.passed());
    assert_only_step_failed(&report, "LagType=STATIC, Iteration=1", "VerifyATE");
    assert!(report.step("VerifyDUT").unwrap().passed());

    match &report.step("VerifyATE").unwrap().outcome {
        StepOutcome::Failed(messages) => {
            assert_eq!(messages.len(), 1);
            assert!(messages[0].starts_with("port1 oper-status"), "{:?}", messages);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    // The rebuild between iterations still ran.
    WriteVerifier::new(testbed.dut().writes())
        .assert_written(WriteOp::Delete, "Agg1")
        .unwrap();
    assert!(report.step("LagType=STATIC, Iteration=2").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_generator_lag_timeout_fails_only_verify_ate() {
    let testbed = fixtures::four_port_testbed(Vendor::Other);
    let test = planned(&testbed, &section(LagType::Static, "Agg1"), Deviations::default()).await;
    testbed.ate().hold_lags_down(true);

    let report = test.run().await;
    assert!(!report.passed());
    assert_only_step_failed(&report, "LagType=STATIC, Iteration=1", "VerifyATE");
    assert_only_step_failed(&report, "LagType=STATIC, Iteration=2", "VerifyATE");

    let verify = report
        .step("LagType=STATIC, Iteration=1")
        .unwrap()
        .find("VerifyATE")
        .unwrap();
    match &verify.outcome {
        StepOutcome::Failed(messages) => {
            assert!(messages.iter().any(|m| m.contains("Timed out")), "{:?}", messages);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    WriteVerifier::new(testbed.dut().writes())
        .assert_written(WriteOp::Delete, "Agg1")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rejected_aggregate_write_is_fatal() {
    let testbed = fixtures::four_port_testbed(Vendor::Other);
    testbed.dut().reject_writes(
        Some(WriteOp::Replace),
        &paths::device::interface("Agg1"),
        "aggregate interfaces are not supported",
    );
    let test = planned(&testbed, &section(LagType::Static, "Agg1"), Deviations::default()).await;

    let report = test.run().await;
    assert!(!report.passed());
    let iteration = report.step("LagType=STATIC, Iteration=1").unwrap();
    assert!(iteration.children.is_empty());
    match &iteration.outcome {
        StepOutcome::Failed(messages) => {
            assert!(messages[0].contains("aggregate interfaces are not supported"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    // Nothing reached the generator past the reset.
    assert_eq!(testbed.ate().pushes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_generator_push_is_fatal() {
    let testbed = fixtures::four_port_testbed(Vendor::Other);
    let test = planned(&testbed, &section(LagType::Static, "Agg1"), Deviations::default()).await;
    testbed.ate().reject_pushes(Some("port 1/3 is reserved".to_string()));

    let report = test.run().await;
    assert!(!report.passed());
    assert_eq!(report.steps.len(), 1);
    assert!(report.steps[0].outcome.is_failed());
}

#[tokio::test]
async fn test_insufficient_ports() {
    let testbed = fixtures::testbed(Vendor::Other, 1);
    let err = match AggregateTest::new(
        testbed.dut(),
        testbed.ate(),
        &TestSection::default(),
        &fast_timing(),
        Deviations::default(),
    )
    .await
    {
        Ok(_) => panic!("planning should fail with one port"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::Setup);
}

#[tokio::test(start_paused = true)]
async fn test_run_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[test]
lag_type = "static"
iterations = 1

[timing]
lag_settle_secs = 1
otg_settle_secs = 1

[dut]
name = "dut1"
vendor = "other"
ports = [
    {{ id = "port1", name = "Ethernet1" }},
    {{ id = "port2", name = "Ethernet2" }},
    {{ id = "port3", name = "Ethernet3" }},
]

[ate]
name = "otg1"
ports = [
    {{ id = "port1", name = "1/1" }},
    {{ id = "port2", name = "1/2" }},
    {{ id = "port3", name = "1/3" }},
]
"#
    )
    .unwrap();

    let config = AggTestConfig::load(file.path()).unwrap();
    assert_eq!(config.test.iterations, 1);
    assert_eq!(config.dut.ports.len(), 3);

    let builder = SimTestbed::builder()
        .dut_name(config.dut.name.as_str())
        .ate_name(config.ate.name.as_str())
        .vendor(config.dut.vendor);
    let builder = config.dut.ports.iter().cloned().fold(builder, |b, p| b.dut_port(p));
    let testbed = config
        .ate
        .ports
        .iter()
        .cloned()
        .fold(builder, |b, p| b.ate_port(p))
        .build();
    assert_eq!(testbed.dut().target(), "dut1");

    let report = run_workflow(testbed.dut(), testbed.ate(), &config).await;
    assert!(report.passed(), "{}", report);
    assert_eq!(report.steps.len(), 2);
    // The device had no aggregates, so the first free name is used.
    assert!(report.to_string().contains("PASS: LagType=STATIC, Iteration=1"));
    assert!(testbed
        .dut()
        .lookup(&paths::device::interface_type("Agg1").state())
        .await
        .unwrap()
        .is_some());
}
