use mac_bench_abstract::{BenchConfig, SchedPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel bandwidths (in PRBs) the reference model knows about.
pub const STANDARD_NOF_PRBS: [u32; 6] = [6, 15, 25, 50, 75, 100];

/// One point of the parameter space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    pub nof_prbs: u32,
    pub nof_ues: u32,
    pub nof_ttis: u32,
    pub cqi: u32,
    pub sched_policy: SchedPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("parameter axis '{0}' is empty")]
    EmptyAxis(&'static str),
    #[error("nof_ttis must be positive")]
    ZeroTtis,
    #[error("cqi {0} outside 1..=15")]
    InvalidCqi(u32),
    #[error("nof_prb {0} is not a standard bandwidth {STANDARD_NOF_PRBS:?}")]
    InvalidNofPrb(u32),
    #[error("cqi_period must be positive")]
    ZeroCqiPeriod,
}

/// Cartesian product of the configuration axes, addressable by a linear run index.
///
/// Axis order from fastest- to slowest-varying: PRBs, users, CQI, policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpace {
    nof_prbs: Vec<u32>,
    nof_ues: Vec<u32>,
    cqi: Vec<u32>,
    sched_policy: Vec<SchedPolicy>,
    nof_ttis: u32,
}

impl ParameterSpace {
    pub fn new(
        nof_prbs: Vec<u32>,
        nof_ues: Vec<u32>,
        cqi: Vec<u32>,
        sched_policy: Vec<SchedPolicy>,
        nof_ttis: u32,
    ) -> Result<Self, ConfigError> {
        let space = Self {
            nof_prbs,
            nof_ues,
            cqi,
            sched_policy,
            nof_ttis,
        };
        space.validate()?;
        Ok(space)
    }

    pub fn from_config(config: &BenchConfig) -> Result<Self, ConfigError> {
        if config.cqi_period == 0 {
            return Err(ConfigError::ZeroCqiPeriod);
        }
        Self::new(
            config.nof_prbs.clone(),
            config.nof_ues.clone(),
            config.cqi.clone(),
            config.sched_policy.clone(),
            config.nof_ttis,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.nof_prbs.is_empty() {
            return Err(ConfigError::EmptyAxis("nof_prbs"));
        }
        if self.nof_ues.is_empty() {
            return Err(ConfigError::EmptyAxis("nof_ues"));
        }
        if self.cqi.is_empty() {
            return Err(ConfigError::EmptyAxis("cqi"));
        }
        if self.sched_policy.is_empty() {
            return Err(ConfigError::EmptyAxis("sched_policy"));
        }
        if self.nof_ttis == 0 {
            return Err(ConfigError::ZeroTtis);
        }
        if let Some(&prb) = self
            .nof_prbs
            .iter()
            .find(|p| !STANDARD_NOF_PRBS.contains(*p))
        {
            return Err(ConfigError::InvalidNofPrb(prb));
        }
        if let Some(&cqi) = self.cqi.iter().find(|c| !(1..=15).contains(*c)) {
            return Err(ConfigError::InvalidCqi(cqi));
        }
        Ok(())
    }

    /// Replace the user-count axis.
    pub fn with_nof_ues(mut self, nof_ues: Vec<u32>) -> Result<Self, ConfigError> {
        self.nof_ues = nof_ues;
        self.validate()?;
        Ok(self)
    }

    /// Replace the CQI axis.
    pub fn with_cqi(mut self, cqi: Vec<u32>) -> Result<Self, ConfigError> {
        self.cqi = cqi;
        self.validate()?;
        Ok(self)
    }

    pub fn nof_ttis(&self) -> u32 {
        self.nof_ttis
    }

    pub fn nof_runs(&self) -> usize {
        self.nof_prbs.len() * self.nof_ues.len() * self.cqi.len() * self.sched_policy.len()
    }

    /// Decode a run index into its parameter tuple.
    ///
    /// # Panics
    /// If `idx >= self.nof_runs()`.
    pub fn get_params(&self, idx: usize) -> RunParameters {
        assert!(
            idx < self.nof_runs(),
            "run index {idx} out of range (nof_runs={})",
            self.nof_runs()
        );
        let mut idx = idx;
        let nof_prbs = self.nof_prbs[idx % self.nof_prbs.len()];
        idx /= self.nof_prbs.len();
        let nof_ues = self.nof_ues[idx % self.nof_ues.len()];
        idx /= self.nof_ues.len();
        let cqi = self.cqi[idx % self.cqi.len()];
        idx /= self.cqi.len();
        let sched_policy = self.sched_policy[idx];
        RunParameters {
            nof_prbs,
            nof_ues,
            nof_ttis: self.nof_ttis,
            cqi,
            sched_policy,
        }
    }

    /// Encode a parameter tuple back into its run index.
    pub fn index_of(&self, params: &RunParameters) -> Option<usize> {
        if params.nof_ttis != self.nof_ttis {
            return None;
        }
        let prb = self.nof_prbs.iter().position(|v| *v == params.nof_prbs)?;
        let ue = self.nof_ues.iter().position(|v| *v == params.nof_ues)?;
        let cqi = self.cqi.iter().position(|v| *v == params.cqi)?;
        let policy = self
            .sched_policy
            .iter()
            .position(|v| *v == params.sched_policy)?;

        let mut idx = policy;
        idx = idx * self.cqi.len() + cqi;
        idx = idx * self.nof_ues.len() + ue;
        idx = idx * self.nof_prbs.len() + prb;
        Some(idx)
    }

    /// All tuples in run-index order.
    pub fn iter(&self) -> impl Iterator<Item = RunParameters> + '_ {
        (0..self.nof_runs()).map(|idx| self.get_params(idx))
    }
}
