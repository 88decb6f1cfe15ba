use thiserror::Error;

use crate::cell::{CellConfig, SchedArgs, UeConfig};
use crate::sched_result::{DlSchedResult, UlSchedResult};
use crate::tti::TtiPoint;

/// Radio network temporary identifier of a user.
pub type Rnti = u16;

/// Failure status reported by a scheduler entry point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedError {
    #[error("scheduler used before init/cell_cfg")]
    NotConfigured,
    #[error("invalid cell index {cc} (configured cells: {nof_cells})")]
    InvalidCell { cc: usize, nof_cells: usize },
    #[error("unknown rnti 0x{0:x}")]
    UnknownRnti(Rnti),
    #[error("rnti 0x{0:x} already registered")]
    DuplicateRnti(Rnti),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The call interface of the MAC scheduler under test.
///
/// The benchmark driver owns exactly one instance per run and calls it from a
/// single thread. Every entry point reports failure through [`SchedError`];
/// the driver treats any failure as fatal.
pub trait MacScheduler {
    /// One-time setup with scheduler-wide arguments.
    fn init(&mut self, args: &SchedArgs) -> Result<(), SchedError>;

    /// Configure the cells the scheduler serves. Called once after `init`.
    fn cell_cfg(&mut self, cells: &[CellConfig]) -> Result<(), SchedError>;

    /// Register a user that just completed random access.
    fn ue_cfg(&mut self, rnti: Rnti, cfg: &UeConfig) -> Result<(), SchedError>;

    /// Uplink buffer status report for one logical channel group.
    fn ul_bsr(&mut self, rnti: Rnti, lcg_id: u32, bytes: u32) -> Result<(), SchedError>;

    /// Downlink RLC buffer occupancy for one logical channel.
    fn dl_rlc_buffer_state(
        &mut self,
        rnti: Rnti,
        lcid: u32,
        tx_queue: u32,
        retx_queue: u32,
    ) -> Result<(), SchedError>;

    /// Periodic wideband CQI report.
    fn dl_cqi_info(
        &mut self,
        tti: TtiPoint,
        rnti: Rnti,
        enb_cc_idx: usize,
        cqi: u32,
    ) -> Result<(), SchedError>;

    /// Uplink SNR measurement in dB.
    fn ul_snr_info(
        &mut self,
        tti: TtiPoint,
        rnti: Rnti,
        enb_cc_idx: usize,
        snr: f32,
    ) -> Result<(), SchedError>;

    /// Downlink decision for the subframe `tti_tx_dl` on cell `enb_cc_idx`.
    fn dl_sched(&mut self, tti_tx_dl: TtiPoint, enb_cc_idx: usize)
    -> Result<DlSchedResult, SchedError>;

    /// Uplink decision for the subframe `tti_tx_ul` on cell `enb_cc_idx`.
    fn ul_sched(&mut self, tti_tx_ul: TtiPoint, enb_cc_idx: usize)
    -> Result<UlSchedResult, SchedError>;
}

/// Builds a fresh scheduler instance for each benchmark run.
pub trait SchedulerFactory {
    fn create(&self, args: &SchedArgs) -> Result<Box<dyn MacScheduler>, SchedError>;
}

impl<F> SchedulerFactory for F
where
    F: Fn(&SchedArgs) -> Box<dyn MacScheduler>,
{
    fn create(&self, args: &SchedArgs) -> Result<Box<dyn MacScheduler>, SchedError> {
        Ok(self(args))
    }
}
