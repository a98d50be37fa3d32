//! aggregate-counters entry point.
//!
//! Loads a testbed file, wires a simulated device and traffic generator
//! with its ports and runs the aggregate counters workflow against them.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aggregate_counters::{run_workflow, AggTestConfig};
use aggtest_sim::SimTestbed;

/// Link aggregation counters test
#[derive(Parser, Debug)]
#[command(name = "aggregate-counters")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Testbed configuration file (TOML)
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn build_testbed(config: &AggTestConfig) -> SimTestbed {
    let builder = SimTestbed::builder()
        .dut_name(config.dut.name.as_str())
        .ate_name(config.ate.name.as_str())
        .vendor(config.dut.vendor);
    let builder = config
        .dut
        .ports
        .iter()
        .cloned()
        .fold(builder, |b, p| b.dut_port(p));
    config
        .ate
        .ports
        .iter()
        .cloned()
        .fold(builder, |b, p| b.ate_port(p))
        .build()
}

async fn run(args: &Args) -> anyhow::Result<bool> {
    let config = AggTestConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    info!(
        dut = %config.dut.name,
        vendor = %config.dut.vendor,
        lag_type = %config.test.lag_type,
        iterations = config.test.iterations,
        "Starting aggregate counters test"
    );

    let testbed = build_testbed(&config);
    let report = run_workflow(testbed.dut(), testbed.ate(), &config).await;
    println!("{}", report);
    Ok(report.passed())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("aggregate-counters error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
