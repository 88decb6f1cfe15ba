use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scheduling policies built into the scheduler under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedPolicy {
    /// Time-domain round robin.
    #[serde(rename = "time_rr")]
    TimeRr,
    /// Time-domain proportional fair.
    #[serde(rename = "time_pf")]
    TimePf,
}

impl SchedPolicy {
    pub const ALL: [SchedPolicy; 2] = [SchedPolicy::TimeRr, SchedPolicy::TimePf];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedPolicy::TimeRr => "time_rr",
            SchedPolicy::TimePf => "time_pf",
        }
    }
}

impl fmt::Display for SchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SchedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time_rr" => Ok(SchedPolicy::TimeRr),
            "time_pf" => Ok(SchedPolicy::TimePf),
            other => Err(format!(
                "Unknown scheduling policy '{other}'. Try 'time_rr' or 'time_pf'."
            )),
        }
    }
}

/// Scheduler-wide arguments handed to [`crate::MacScheduler::init`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedArgs {
    pub sched_policy: SchedPolicy,
    /// Weight of the newest sample in the proportional-fair throughput average.
    pub pf_fairness: f64,
}

impl Default for SchedArgs {
    fn default() -> Self {
        Self {
            sched_policy: SchedPolicy::TimeRr,
            pf_fairness: 0.01,
        }
    }
}

/// Static configuration of one simulated cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellConfig {
    pub nof_prb: u32,
    /// FDD PRACH configuration index (36.211 table 5.7.1-2).
    pub prach_config: u32,
    /// PRBs at the band edges reserved for PUCCH, unavailable to PUSCH.
    pub nof_pucch_prb: u32,
    /// PRBs taken by the SIB1 broadcast on the subframes it is sent in.
    pub sib1_prb: u32,
}

impl CellConfig {
    /// Standard cell layout for a channel bandwidth given in PRBs.
    pub fn default_for(nof_prb: u32) -> Self {
        Self {
            nof_prb,
            prach_config: 3,
            nof_pucch_prb: if nof_prb == 6 { 2 } else { 4 },
            sib1_prb: 4,
        }
    }

    pub fn nof_pusch_prb(&self) -> u32 {
        self.nof_prb.saturating_sub(self.nof_pucch_prb)
    }
}

/// Per-user configuration passed to [`crate::MacScheduler::ue_cfg`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UeConfig {
    /// eNB cell indices the user may be scheduled on. The first one is the primary cell.
    pub supported_cc_list: Vec<usize>,
    pub max_dl_mcs: u32,
    pub max_ul_mcs: u32,
}

impl Default for UeConfig {
    fn default() -> Self {
        Self {
            supported_cc_list: vec![0],
            max_dl_mcs: 28,
            max_ul_mcs: 28,
        }
    }
}

impl UeConfig {
    pub fn primary_cc(&self) -> usize {
        self.supported_cc_list.first().copied().unwrap_or(0)
    }
}
