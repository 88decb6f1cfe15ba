use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mac_bench_abstract::{BenchConfig, BenchConfigOverride};
use mac_bench_loader::SchedulerLoader;
use mac_bench_loader::spec::parse_policy_list;
use mac_bench_simulator::{BenchmarkRunner, BenchmarkTrace, StdoutSink};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Throughput and latency benchmark for the MAC scheduler")]
struct Args {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// TOML file overriding the default benchmark configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Measured TTIs per run.
    #[arg(long, global = true)]
    nof_ttis: Option<u32>,

    /// Comma-separated scheduling policies, e.g. "time_rr,time_pf".
    #[arg(long, global = true)]
    policies: Option<String>,

    /// Write every run result and violation as JSON.
    #[arg(long, global = true)]
    trace_out: Option<PathBuf>,

    /// Log per-TTI scheduler decisions.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Single-user CQI 15 sweep checked against the reference rates.
    RateTest,
    /// Full parameter sweep, report only.
    Benchmark,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();
    info!("mac-bench-eval-host starting...");

    let config = build_config(&args)?;
    let loader = SchedulerLoader::builder().build()?;
    let mut sink = StdoutSink;
    let mut runner = BenchmarkRunner::new(config.clone(), &loader, &mut sink);

    let trace = match args.mode.unwrap_or(Mode::RateTest) {
        Mode::RateTest => {
            let report = runner.run_rate_test()?;
            let passed = report.passed();
            BenchmarkTrace {
                mode: "rate-test",
                config,
                results: report.results,
                violations: report.violations,
                passed,
            }
        }
        Mode::Benchmark => BenchmarkTrace {
            mode: "benchmark",
            config,
            results: runner.run_benchmark()?,
            violations: Vec::new(),
            passed: true,
        },
    };
    info!(
        "{} finished: {} runs, {} violations",
        trace.mode,
        trace.results.len(),
        trace.violations.len()
    );

    if let Some(path) = &args.trace_out {
        write_trace(path, &trace)?;
    }

    Ok(if trace.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_config(args: &Args) -> Result<BenchConfig> {
    let mut config = BenchConfig::default();
    if let Some(path) = &args.config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let over: BenchConfigOverride = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        over.apply_to(&mut config);
    }
    if let Some(nof_ttis) = args.nof_ttis {
        config.nof_ttis = nof_ttis;
    }
    if let Some(spec) = &args.policies {
        config.sched_policy = parse_policy_list(spec)?;
    }
    Ok(config)
}

fn write_trace(path: &Path, trace: &BenchmarkTrace) -> Result<()> {
    let json = serde_json::to_string_pretty(trace).context("failed to serialize trace")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write trace to {}", path.display()))?;
    info!("trace written to {}", path.display());
    Ok(())
}
