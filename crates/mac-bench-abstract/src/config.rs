use crate::cell::SchedPolicy;
use serde::{Deserialize, Serialize};

/// Benchmark-wide configuration: the parameter axes swept and the traffic
/// model applied to every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub nof_prbs: Vec<u32>,
    pub nof_ues: Vec<u32>,
    pub cqi: Vec<u32>,
    pub sched_policy: Vec<SchedPolicy>,
    /// Measured TTIs per run, after warm-up.
    pub nof_ttis: u32,
    pub dl_bytes_per_tti: u32,
    pub ul_bytes_per_tti: u32,
    /// CQI/SNR reports are injected on TTIs that are a multiple of this period.
    pub cqi_period: u32,
    /// Reported UL SNR in dB.
    pub ul_snr: f32,
    pub pf_fairness: f64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            nof_prbs: vec![6, 15, 25, 50, 75, 100],
            nof_ues: vec![1, 2, 5],
            cqi: vec![5, 10, 15],
            sched_policy: SchedPolicy::ALL.to_vec(),
            nof_ttis: 10000,
            dl_bytes_per_tti: 100_000,
            ul_bytes_per_tti: 100_000,
            cqi_period: 5,
            ul_snr: 40.0,
            pf_fairness: 0.01,
        }
    }
}

/// Partial configuration read from a TOML file. Present fields replace the defaults.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BenchConfigOverride {
    pub nof_prbs: Option<Vec<u32>>,
    pub nof_ues: Option<Vec<u32>>,
    pub cqi: Option<Vec<u32>>,
    pub sched_policy: Option<Vec<SchedPolicy>>,
    pub nof_ttis: Option<u32>,
    pub dl_bytes_per_tti: Option<u32>,
    pub ul_bytes_per_tti: Option<u32>,
    pub cqi_period: Option<u32>,
    pub ul_snr: Option<f32>,
    pub pf_fairness: Option<f64>,
}

impl BenchConfigOverride {
    pub fn apply_to(&self, config: &mut BenchConfig) {
        if let Some(v) = &self.nof_prbs {
            config.nof_prbs = v.clone();
        }
        if let Some(v) = &self.nof_ues {
            config.nof_ues = v.clone();
        }
        if let Some(v) = &self.cqi {
            config.cqi = v.clone();
        }
        if let Some(v) = &self.sched_policy {
            config.sched_policy = v.clone();
        }
        if let Some(v) = self.nof_ttis {
            config.nof_ttis = v;
        }
        if let Some(v) = self.dl_bytes_per_tti {
            config.dl_bytes_per_tti = v;
        }
        if let Some(v) = self.ul_bytes_per_tti {
            config.ul_bytes_per_tti = v;
        }
        if let Some(v) = self.cqi_period {
            config.cqi_period = v;
        }
        if let Some(v) = self.ul_snr {
            config.ul_snr = v;
        }
        if let Some(v) = self.pf_fairness {
            config.pf_fairness = v;
        }
    }
}
