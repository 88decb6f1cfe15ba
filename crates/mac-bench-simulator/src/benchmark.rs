use std::fmt;

use anyhow::{Context, Result};
use mac_bench_abstract::{
    BenchConfig, CellConfig, Rnti, SchedArgs, SchedulerFactory, UeConfig,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::{SchedDriver, TrafficModel};
use crate::params::{ParameterSpace, RunParameters};
use crate::reference::expected_run_result;
use crate::report::{ReportSink, print_benchmark_results};
use crate::trace::RunResult;

/// RNTI handed to the first simulated user; later users count up from it.
pub const FIRST_RNTI: Rnti = 0x46;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DlMcs,
    DlRate,
    UlMcs,
    UlRate,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Metric::DlMcs => "DL mcs",
            Metric::DlRate => "DL rate",
            Metric::UlMcs => "UL mcs",
            Metric::UlRate => "UL rate",
        })
    }
}

/// A measured value below its reference floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionViolation {
    pub run_index: usize,
    pub nof_prbs: u32,
    pub metric: Metric,
    pub observed: f64,
    pub expected: f64,
}

impl fmt::Display for RegressionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.metric {
            Metric::DlMcs | Metric::UlMcs => write!(
                f,
                "Nprb={:>2}: {} below expected ({:.1} < {})",
                self.nof_prbs, self.metric, self.observed, self.expected
            ),
            Metric::DlRate | Metric::UlRate => write!(
                f,
                "Nprb={:>2}: {} below expected ({:.2} < {:.2}) Mbps",
                self.nof_prbs,
                self.metric,
                self.observed / 1e6,
                self.expected / 1e6
            ),
        }
    }
}

/// Outcome of a rate test sweep.
#[derive(Debug, Clone)]
pub struct RateTestReport {
    pub results: Vec<RunResult>,
    pub violations: Vec<RegressionViolation>,
}

impl RateTestReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Compare every result with its reference floor.
///
/// # Panics
/// If a result was measured at a CQI other than 15.
pub fn evaluate(results: &[RunResult]) -> Vec<RegressionViolation> {
    let mut violations = Vec::new();
    for (run_index, result) in results.iter().enumerate() {
        let expected = expected_run_result(&result.params);
        let checks = [
            (Metric::DlMcs, result.avg_dl_mcs, expected.avg_dl_mcs),
            (
                Metric::DlRate,
                result.avg_dl_throughput,
                expected.avg_dl_throughput,
            ),
            (Metric::UlMcs, result.avg_ul_mcs, expected.avg_ul_mcs),
            (
                Metric::UlRate,
                result.avg_ul_throughput,
                expected.avg_ul_throughput,
            ),
        ];
        for (metric, observed, expected) in checks {
            if observed < expected {
                violations.push(RegressionViolation {
                    run_index,
                    nof_prbs: result.params.nof_prbs,
                    metric,
                    observed,
                    expected,
                });
            }
        }
    }
    violations
}

/// Sweeps a parameter space, one fresh scheduler per run.
pub struct BenchmarkRunner<'a> {
    config: BenchConfig,
    factory: &'a dyn SchedulerFactory,
    sink: &'a mut dyn ReportSink,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(
        config: BenchConfig,
        factory: &'a dyn SchedulerFactory,
        sink: &'a mut dyn ReportSink,
    ) -> Self {
        Self {
            config,
            factory,
            sink,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run a single parameter tuple end to end: register the users, wait for
    /// them to become ready, then measure `params.nof_ttis` TTIs.
    pub fn run_benchmark_scenario(&self, params: &RunParameters) -> Result<RunResult> {
        let args = SchedArgs {
            sched_policy: params.sched_policy,
            pf_fairness: self.config.pf_fairness,
        };
        let sched = self
            .factory
            .create(&args)
            .with_context(|| format!("failed to create {} scheduler", params.sched_policy))?;
        let mut driver = SchedDriver::new(
            sched,
            &args,
            vec![CellConfig::default_for(params.nof_prbs)],
            params.clone(),
            TrafficModel::from(&self.config),
        )?;

        let ue_cfg = UeConfig::default();
        for ue_idx in 0..params.nof_ues {
            let rnti = Rnti::try_from(ue_idx)
                .ok()
                .and_then(|offset| FIRST_RNTI.checked_add(offset))
                .with_context(|| format!("no RNTI left for user {ue_idx}"))?;
            driver.wait_prach_opportunity(ue_cfg.primary_cc())?;
            driver.add_user(rnti, &ue_cfg)?;
            driver.advance_tti()?;
        }

        driver.run_warmup()?;
        driver.run_measurement(params.nof_ttis)?;
        Ok(RunResult::from_stats(params.clone(), driver.stats()))
    }

    /// Single-user CQI 15 sweep checked against the reference floors.
    pub fn run_rate_test(&mut self) -> Result<RateTestReport> {
        let space = ParameterSpace::from_config(&self.config)?
            .with_nof_ues(vec![1])?
            .with_cqi(vec![15])?;

        self.sink.write_line("====== Scheduler Rate Test ======");
        let results = self.run_space(&space)?;
        print_benchmark_results(self.sink, &results);

        let violations = evaluate(&results);
        for v in &violations {
            warn!("{v}");
            self.sink.write_line(&v.to_string());
        }
        self.sink.write_line(if violations.is_empty() {
            "Success"
        } else {
            "Failure"
        });
        Ok(RateTestReport {
            results,
            violations,
        })
    }

    /// Full sweep, reported without any pass/fail verdict.
    pub fn run_benchmark(&mut self) -> Result<Vec<RunResult>> {
        let space = ParameterSpace::from_config(&self.config)?;
        self.sink.write_line("====== Scheduler Benchmark ======");
        let results = self.run_space(&space)?;
        print_benchmark_results(self.sink, &results);
        Ok(results)
    }

    fn run_space(&self, space: &ParameterSpace) -> Result<Vec<RunResult>> {
        let nof_runs = space.nof_runs();
        let mut results = Vec::with_capacity(nof_runs);
        for (run_index, params) in space.iter().enumerate() {
            info!(
                "run {}/{}: nof_prb={} nof_ue={} cqi={} policy={}",
                run_index + 1,
                nof_runs,
                params.nof_prbs,
                params.nof_ues,
                params.cqi,
                params.sched_policy
            );
            let result = self
                .run_benchmark_scenario(&params)
                .with_context(|| format!("run {run_index} failed"))?;
            results.push(result);
        }
        Ok(results)
    }
}
