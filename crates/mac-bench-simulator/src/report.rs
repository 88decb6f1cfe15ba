use crate::reference::theoretical_max;
use crate::trace::RunResult;

/// Destination of the human-readable report.
pub trait ReportSink {
    fn write_line(&mut self, line: &str);
}

/// Writes to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl ReportSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

pub const TABLE_HEADER: &str = "run | Nprb | cqi | sched pol | Nue | DL/UL [Mbps] | DL/UL mcs | DL/UL OH [%] | latency [usec]";

/// One fixed-width table row.
///
/// Overhead is the share of the unscaled reference rate the run did not reach.
pub fn format_row(run_index: usize, result: &RunResult) -> String {
    let p = &result.params;
    let max = theoretical_max(p.nof_prbs);
    let dl_oh = 100.0 * (1.0 - result.avg_dl_throughput / max.dl_bps);
    let ul_oh = 100.0 * (1.0 - result.avg_ul_throughput / max.ul_bps);
    format!(
        "{:>3}{:>6}{:>6}{:>12}{:>6}{:>9.2}/{:>4.2}{:>9.1}/{:>4.1}{:>9.1}/{:>4.1}{:>12}",
        run_index,
        p.nof_prbs,
        p.cqi,
        p.sched_policy,
        p.nof_ues,
        result.avg_dl_throughput / 1e6,
        result.avg_ul_throughput / 1e6,
        result.avg_dl_mcs,
        result.avg_ul_mcs,
        dl_oh,
        ul_oh,
        result.avg_latency_us,
    )
}

pub fn print_benchmark_results(sink: &mut dyn ReportSink, results: &[RunResult]) {
    sink.write_line(TABLE_HEADER);
    for (idx, result) in results.iter().enumerate() {
        sink.write_line(&format_row(idx, result));
    }
}
