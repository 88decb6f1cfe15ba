use mac_bench_abstract::{DlAllocation, DlSchedResult, UlSchedResult};

/// Streaming mean updated incrementally, without keeping a running sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollingAverage {
    mean: f64,
    count: u64,
}

impl RollingAverage {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }

    /// Current mean, zero before the first sample.
    pub fn value(&self) -> f64 {
        self.mean
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-run aggregates fed from the scheduler decisions of every TTI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThroughputStats {
    /// Bytes per TTI.
    pub mean_dl_tbs: RollingAverage,
    pub mean_ul_tbs: RollingAverage,
    pub avg_dl_mcs: RollingAverage,
    pub avg_ul_mcs: RollingAverage,
    /// Nanoseconds spent in one cell's DL+UL decision.
    pub avg_latency: RollingAverage,
}

impl ThroughputStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold one TTI of per-cell decisions into the aggregates.
    ///
    /// TBS is sampled every TTI, MCS only on TTIs with at least one allocation.
    pub fn process(&mut self, dl_cc_results: &[DlSchedResult], ul_cc_results: &[UlSchedResult]) {
        for dl in dl_cc_results {
            let dl_tbs: u64 = dl.data.iter().map(DlAllocation::total_tbs).sum();
            self.mean_dl_tbs.push(dl_tbs as f64);
            if let Some(dl_mcs) = dl.data.iter().map(|a| a.mcs[0]).max() {
                self.avg_dl_mcs.push(f64::from(dl_mcs));
            }
        }
        for ul in ul_cc_results {
            let ul_tbs: u64 = ul.pusch.iter().map(|a| u64::from(a.tbs)).sum();
            self.mean_ul_tbs.push(ul_tbs as f64);
            if let Some(ul_mcs) = ul.pusch.iter().map(|a| a.mcs).max() {
                self.avg_ul_mcs.push(f64::from(ul_mcs));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mac_bench_abstract::{BroadcastAllocation, UlAllocation};

    #[test]
    fn empty_average_is_zero() {
        let avg = RollingAverage::default();
        assert_eq!(avg.value(), 0.0);
        assert_eq!(avg.count(), 0);
    }

    #[test]
    fn incremental_mean_matches_arithmetic_mean() {
        let mut avg = RollingAverage::default();
        for v in [1.0, 2.0, 3.0, 10.0] {
            avg.push(v);
        }
        assert!((avg.value() - 4.0).abs() < 1e-12);
        assert_eq!(avg.count(), 4);

        avg.reset();
        assert_eq!(avg, RollingAverage::default());
    }

    #[test]
    fn stays_accurate_over_many_large_samples() {
        let mut avg = RollingAverage::default();
        for i in 0..100_000u64 {
            avg.push(1e6 + (i % 2) as f64);
        }
        assert!((avg.value() - (1e6 + 0.5)).abs() < 1e-4);
    }

    #[test]
    fn idle_ttis_count_for_tbs_but_not_for_mcs() {
        let mut stats = ThroughputStats::default();
        let busy = DlSchedResult {
            data: vec![
                DlAllocation::new(0x46, 10, 1000, 20),
                DlAllocation {
                    tbs: [300, 200],
                    mcs: [27, 27],
                    ..DlAllocation::new(0x47, 5, 0, 0)
                },
            ],
            broadcast: vec![],
        };
        let idle = DlSchedResult {
            data: vec![],
            broadcast: vec![BroadcastAllocation {
                sib_idx: 1,
                nof_prb: 4,
                tbs: 50,
            }],
        };
        let ul = UlSchedResult {
            pusch: vec![UlAllocation {
                rnti: 0x46,
                nof_prb: 21,
                tbs: 800,
                mcs: 22,
            }],
        };

        stats.process(&[busy], &[ul]);
        stats.process(&[idle], &[UlSchedResult::default()]);

        assert_eq!(stats.mean_dl_tbs.count(), 2);
        assert!((stats.mean_dl_tbs.value() - 750.0).abs() < 1e-9);
        assert_eq!(stats.avg_dl_mcs.count(), 1);
        assert!((stats.avg_dl_mcs.value() - 27.0).abs() < 1e-9);
        assert!((stats.mean_ul_tbs.value() - 400.0).abs() < 1e-9);
        assert_eq!(stats.avg_ul_mcs.count(), 1);
        assert!((stats.avg_ul_mcs.value() - 22.0).abs() < 1e-9);
    }

    #[test]
    fn codeword_sum_beyond_u32_is_kept() {
        let mut stats = ThroughputStats::default();
        let dl = DlSchedResult {
            data: vec![DlAllocation {
                tbs: [u32::MAX, 1],
                ..DlAllocation::new(0x46, 100, 0, 28)
            }],
            broadcast: vec![],
        };
        stats.process(&[dl], &[UlSchedResult::default()]);
        assert_eq!(stats.mean_dl_tbs.value(), 4_294_967_296.0);
    }
}
