pub mod cell;
pub mod config;
pub mod interface;
pub mod prach;
pub mod sched_result;
pub mod tbs;
pub mod tti;

pub use interface::{MacScheduler, Rnti, SchedError, SchedulerFactory};
pub use sched_result::{
    BroadcastAllocation, DlAllocation, DlSchedResult, UlAllocation, UlSchedResult,
};
pub use tti::{TX_ENB_DELAY, TtiPoint, to_tx_dl, to_tx_ul};

pub use cell::{CellConfig, SchedArgs, SchedPolicy, UeConfig};
pub use config::{BenchConfig, BenchConfigOverride};
