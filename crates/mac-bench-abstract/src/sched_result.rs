use serde::{Deserialize, Serialize};

use crate::interface::Rnti;

/// One user-data PDSCH allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlAllocation {
    pub rnti: Rnti,
    pub nof_prb: u32,
    /// Transport block sizes in bytes. The second TB is zero without spatial multiplexing.
    pub tbs: [u32; 2],
    pub mcs: [u32; 2],
    /// The allocation carries the contention resolution MAC CE.
    pub conres_ce: bool,
}

impl DlAllocation {
    pub fn new(rnti: Rnti, nof_prb: u32, tbs: u32, mcs: u32) -> Self {
        Self {
            rnti,
            nof_prb,
            tbs: [tbs, 0],
            mcs: [mcs, 0],
            conres_ce: false,
        }
    }

    /// TBS summed over both codewords.
    pub fn total_tbs(&self) -> u64 {
        u64::from(self.tbs[0]) + u64::from(self.tbs[1])
    }
}

/// SIB broadcast allocation. Not user traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAllocation {
    /// SIB index (1 for SIB1).
    pub sib_idx: u32,
    pub nof_prb: u32,
    pub tbs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlSchedResult {
    pub data: Vec<DlAllocation>,
    pub broadcast: Vec<BroadcastAllocation>,
}

/// One PUSCH grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UlAllocation {
    pub rnti: Rnti,
    pub nof_prb: u32,
    /// Transport block size in bytes.
    pub tbs: u32,
    pub mcs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UlSchedResult {
    pub pusch: Vec<UlAllocation>,
}
