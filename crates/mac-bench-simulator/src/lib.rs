pub mod benchmark;
pub mod engine;
pub mod params;
pub mod reference;
pub mod report;
pub mod sim_ue;
pub mod stats;
pub mod trace;

pub use benchmark::{
    BenchmarkRunner, FIRST_RNTI, Metric, RateTestReport, RegressionViolation, evaluate,
};
pub use engine::{SchedDriver, TrafficModel};
pub use params::{ConfigError, ParameterSpace, RunParameters, STANDARD_NOF_PRBS};
pub use reference::{ReferenceRates, expected_run_result, theoretical_max};
pub use report::{MemorySink, ReportSink, StdoutSink, print_benchmark_results};
pub use stats::{RollingAverage, ThroughputStats};
pub use trace::{BenchmarkTrace, RunResult};
