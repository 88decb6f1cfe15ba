pub mod spec;
mod time_sched;

use anyhow::Result;
use mac_bench_abstract::{MacScheduler, SchedArgs, SchedError, SchedulerFactory};
use tracing::debug;

pub use time_sched::{TimeSchedTuning, TimeScheduler};

/// Builder for the loader. Collects the start-up values handed to every
/// scheduler instance it creates.
pub struct LoaderBuilder {
    tuning: TimeSchedTuning,
}

impl Default for LoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderBuilder {
    pub fn new() -> Self {
        Self {
            tuning: TimeSchedTuning::default(),
        }
    }

    pub fn initial_dl_cqi(mut self, cqi: u32) -> Self {
        self.tuning.initial_dl_cqi = cqi;
        self
    }

    pub fn initial_ul_snr(mut self, snr: f32) -> Self {
        self.tuning.initial_ul_snr = snr;
        self
    }

    pub fn conres_delay(mut self, ttis: u32) -> Self {
        self.tuning.conres_delay = ttis;
        self
    }

    pub fn build(self) -> Result<SchedulerLoader> {
        if self.tuning.initial_dl_cqi > 15 {
            anyhow::bail!("initial CQI {} out of range 0..=15", self.tuning.initial_dl_cqi);
        }
        Ok(SchedulerLoader {
            tuning: self.tuning,
        })
    }
}

/// Creates built-in scheduler instances, one per benchmark run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerLoader {
    tuning: TimeSchedTuning,
}

impl SchedulerLoader {
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::new()
    }

    pub fn load(&self) -> Box<dyn MacScheduler> {
        Box::new(TimeScheduler::new(self.tuning))
    }
}

impl SchedulerFactory for SchedulerLoader {
    fn create(&self, args: &SchedArgs) -> Result<Box<dyn MacScheduler>, SchedError> {
        debug!("creating built-in scheduler for policy {}", args.sched_policy);
        Ok(self.load())
    }
}
