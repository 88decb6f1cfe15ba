use mac_bench_abstract::BenchConfig;
use serde::Serialize;

use crate::benchmark::RegressionViolation;
use crate::params::RunParameters;
use crate::stats::ThroughputStats;

/// Duration of one TTI in seconds.
pub const TTI_DURATION_S: f64 = 1e-3;

/// Averages measured over one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub params: RunParameters,
    /// bits/s
    pub avg_dl_throughput: f64,
    pub avg_ul_throughput: f64,
    pub avg_dl_mcs: f64,
    pub avg_ul_mcs: f64,
    pub avg_latency_us: u64,
}

impl RunResult {
    pub fn from_stats(params: RunParameters, stats: &ThroughputStats) -> Self {
        Self {
            params,
            avg_dl_throughput: stats.mean_dl_tbs.value() * 8.0 / TTI_DURATION_S,
            avg_ul_throughput: stats.mean_ul_tbs.value() * 8.0 / TTI_DURATION_S,
            avg_dl_mcs: stats.avg_dl_mcs.value(),
            avg_ul_mcs: stats.avg_ul_mcs.value(),
            avg_latency_us: (stats.avg_latency.value() / 1000.0) as u64,
        }
    }
}

/// Everything a sweep produced, dumped as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkTrace {
    pub mode: &'static str,
    pub config: BenchConfig,
    pub results: Vec<RunResult>,
    pub violations: Vec<RegressionViolation>,
    pub passed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mac_bench_abstract::SchedPolicy;

    #[test]
    fn throughput_and_latency_are_derived_from_means() {
        let mut stats = ThroughputStats::default();
        stats.mean_dl_tbs.push(1000.0);
        stats.mean_ul_tbs.push(250.0);
        stats.avg_dl_mcs.push(27.0);
        stats.avg_latency.push(1999.0);

        let params = RunParameters {
            nof_prbs: 25,
            nof_ues: 1,
            nof_ttis: 1,
            cqi: 15,
            sched_policy: SchedPolicy::TimePf,
        };
        let result = RunResult::from_stats(params, &stats);
        assert!((result.avg_dl_throughput - 8e6).abs() < 1e-6);
        assert!((result.avg_ul_throughput - 2e6).abs() < 1e-6);
        assert_eq!(result.avg_ul_mcs, 0.0);
        assert_eq!(result.avg_latency_us, 1);
    }

    #[test]
    fn trace_serializes_violations_by_metric_name() {
        use crate::benchmark::Metric;

        let trace = BenchmarkTrace {
            mode: "rate-test",
            config: BenchConfig::default(),
            results: vec![],
            violations: vec![RegressionViolation {
                run_index: 2,
                nof_prbs: 25,
                metric: Metric::UlRate,
                observed: 1.0,
                expected: 2.0,
            }],
            passed: false,
        };
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["violations"][0]["metric"], "ul_rate");
        assert_eq!(json["config"]["sched_policy"][0], "time_rr");
        assert_eq!(json["passed"], false);
    }
}
