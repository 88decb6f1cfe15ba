//! Analytical floor a healthy scheduler must reach with a single user at CQI 15.

use mac_bench_abstract::tbs::{MAX_MCS, tbs_from_idx, tbs_idx_from_mcs};

use crate::params::{RunParameters, STANDARD_NOF_PRBS};
use crate::trace::RunResult;

/// Unscaled DL/UL rates in bits/s at MCS 28 over the whole usable bandwidth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRates {
    pub dl_bps: f64,
    pub ul_bps: f64,
}

fn pucch_prbs(nof_prbs: u32) -> u32 {
    if nof_prbs == 6 { 2 } else { 4 }
}

/// # Panics
/// If `nof_prbs` is not a standard bandwidth.
pub fn theoretical_max(nof_prbs: u32) -> ReferenceRates {
    assert!(
        STANDARD_NOF_PRBS.contains(&nof_prbs),
        "no reference for nof_prb={nof_prbs}"
    );
    let dl_bits = tbs_from_idx(tbs_idx_from_mcs(MAX_MCS, false), nof_prbs);
    let ul_bits = tbs_from_idx(
        tbs_idx_from_mcs(MAX_MCS, true),
        nof_prbs - pucch_prbs(nof_prbs),
    );
    ReferenceRates {
        dl_bps: f64::from(dl_bits) * 1000.0,
        ul_bps: f64::from(ul_bits) * 1000.0,
    }
}

/// Minimum acceptable result for `params`.
///
/// # Panics
/// If `params.cqi != 15`, the only channel quality the floor is calibrated for.
pub fn expected_run_result(params: &RunParameters) -> RunResult {
    assert_eq!(
        params.cqi, 15,
        "reference model only defined for cqi=15, got {}",
        params.cqi
    );
    let max = theoretical_max(params.nof_prbs);
    let (dl_factor, ul_factor, dl_mcs) = match params.nof_prbs {
        6 => (0.70, 0.25, 25.0),
        15 => (0.95, 0.50, 27.0),
        _ => (0.97, 0.50, 27.0),
    };
    RunResult {
        params: params.clone(),
        avg_dl_throughput: max.dl_bps * dl_factor,
        avg_ul_throughput: max.ul_bps * ul_factor,
        avg_dl_mcs: dl_mcs,
        avg_ul_mcs: 22.0,
        avg_latency_us: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mac_bench_abstract::SchedPolicy;

    fn params(nof_prbs: u32, cqi: u32) -> RunParameters {
        RunParameters {
            nof_prbs,
            nof_ues: 1,
            nof_ttis: 100,
            cqi,
            sched_policy: SchedPolicy::TimeRr,
        }
    }

    #[test]
    fn reference_grows_with_bandwidth() {
        let rates: Vec<_> = STANDARD_NOF_PRBS.iter().map(|&p| theoretical_max(p)).collect();
        for pair in rates.windows(2) {
            assert!(pair[1].dl_bps > pair[0].dl_bps);
            assert!(pair[1].ul_bps > pair[0].ul_bps);
        }
        assert!(rates[0].ul_bps < rates[0].dl_bps);
    }

    #[test]
    fn rates_follow_the_standard_mcs_28_row() {
        let dl = [4392, 11064, 18336, 36696, 55056, 75376];
        let ul = [2984, 8248, 15264, 32856, 51024, 71112];
        for (i, &nof_prbs) in STANDARD_NOF_PRBS.iter().enumerate() {
            let max = theoretical_max(nof_prbs);
            assert_eq!(max.dl_bps, f64::from(dl[i]) * 1000.0, "nof_prb={nof_prbs}");
            assert_eq!(max.ul_bps, f64::from(ul[i]) * 1000.0, "nof_prb={nof_prbs}");
        }
    }

    #[test]
    fn small_bandwidths_get_looser_floors() {
        let max = theoretical_max(6);
        let exp = expected_run_result(&params(6, 15));
        assert!((exp.avg_dl_throughput - 0.70 * max.dl_bps).abs() < 1e-6);
        assert!((exp.avg_ul_throughput - 0.25 * max.ul_bps).abs() < 1e-6);
        assert_eq!(exp.avg_dl_mcs, 25.0);
        assert_eq!(exp.avg_ul_mcs, 22.0);

        let max = theoretical_max(15);
        let exp = expected_run_result(&params(15, 15));
        assert!((exp.avg_dl_throughput - 0.95 * max.dl_bps).abs() < 1e-6);
        assert_eq!(exp.avg_dl_mcs, 27.0);

        let max = theoretical_max(100);
        let exp = expected_run_result(&params(100, 15));
        assert!((exp.avg_dl_throughput - 0.97 * max.dl_bps).abs() < 1e-6);
        assert!((exp.avg_ul_throughput - 0.50 * max.ul_bps).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "only defined for cqi=15")]
    fn other_cqi_values_are_rejected() {
        expected_run_result(&params(25, 10));
    }
}
