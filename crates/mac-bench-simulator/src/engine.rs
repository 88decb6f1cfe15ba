use std::time::Instant;

use anyhow::{Context, Result, bail};
use mac_bench_abstract::tti::NOF_TTIS;
use mac_bench_abstract::{
    BenchConfig, CellConfig, MacScheduler, Rnti, SchedArgs, SchedError, TtiPoint, UeConfig,
    prach, to_tx_dl, to_tx_ul,
};
use tracing::{debug, info};

use crate::params::{ConfigError, RunParameters};
use crate::sim_ue::{SfOutput, SimUeTracker, UeTtiEvents};
use crate::stats::ThroughputStats;

// Logical channel and channel group carrying user data.
const DRB1_LCID: u32 = 3;
const DRB_LCG: u32 = 1;

/// Upper bound on TTIs spent waiting for a PRACH occasion or for contention
/// resolution before a run is declared stuck.
pub const MAX_WAIT_TTIS: u32 = NOF_TTIS;

/// Traffic and channel feedback injected into every ready user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficModel {
    pub dl_bytes_per_tti: u32,
    pub ul_bytes_per_tti: u32,
    pub cqi_period: u32,
    pub ul_snr: f32,
}

impl Default for TrafficModel {
    fn default() -> Self {
        Self::from(&BenchConfig::default())
    }
}

impl From<&BenchConfig> for TrafficModel {
    fn from(config: &BenchConfig) -> Self {
        Self {
            dl_bytes_per_tti: config.dl_bytes_per_tti,
            ul_bytes_per_tti: config.ul_bytes_per_tti,
            cqi_period: config.cqi_period,
            ul_snr: config.ul_snr,
        }
    }
}

/// Steps one scheduler instance through simulated TTIs and collects the
/// statistics of its decisions.
pub struct SchedDriver {
    sched: Box<dyn MacScheduler>,
    cells: Vec<CellConfig>,
    ue_tracker: SimUeTracker,
    tti_rx: Option<TtiPoint>,
    traffic: TrafficModel,
    params: RunParameters,
    total_stats: ThroughputStats,
}

impl SchedDriver {
    /// Initialise `sched` and configure its cells.
    ///
    /// Fails if `traffic` reports CQI with a zero period.
    pub fn new(
        mut sched: Box<dyn MacScheduler>,
        args: &SchedArgs,
        cells: Vec<CellConfig>,
        params: RunParameters,
        traffic: TrafficModel,
    ) -> Result<Self> {
        if traffic.cqi_period == 0 {
            return Err(ConfigError::ZeroCqiPeriod.into());
        }
        sched.init(args).context("scheduler init failed")?;
        sched
            .cell_cfg(&cells)
            .context("scheduler cell configuration failed")?;
        Ok(Self {
            sched,
            cells,
            ue_tracker: SimUeTracker::new(),
            tti_rx: None,
            traffic,
            params,
            total_stats: ThroughputStats::default(),
        })
    }

    /// Last simulated TTI, `None` before the first step.
    pub fn tti_rx(&self) -> Option<TtiPoint> {
        self.tti_rx
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn stats(&self) -> &ThroughputStats {
        &self.total_stats
    }

    pub fn reset_stats(&mut self) {
        self.total_stats.reset();
    }

    pub fn ue_tracker(&self) -> &SimUeTracker {
        &self.ue_tracker
    }

    /// # Panics
    /// If `enb_cc_idx` is not a configured cell.
    pub fn is_prach_opportunity(&self, enb_cc_idx: usize) -> bool {
        let cell = self.cell(enb_cc_idx);
        self.tti_rx
            .is_some_and(|tti| prach::is_prach_opportunity(cell.prach_config, tti))
    }

    /// Advance idle TTIs until the current one is a PRACH occasion of `enb_cc_idx`.
    /// Returns the number of TTIs advanced.
    pub fn wait_prach_opportunity(&mut self, enb_cc_idx: usize) -> Result<u32> {
        let mut waited = 0;
        while !self.is_prach_opportunity(enb_cc_idx) {
            if waited >= MAX_WAIT_TTIS {
                bail!(
                    "cell {enb_cc_idx} has no PRACH occasion (prach_config={})",
                    self.cell(enb_cc_idx).prach_config
                );
            }
            self.advance_tti()?;
            waited += 1;
        }
        Ok(waited)
    }

    /// Register a user with the scheduler at the current TTI.
    pub fn add_user(&mut self, rnti: Rnti, ue_cfg: &UeConfig) -> Result<()> {
        for &cc in &ue_cfg.supported_cc_list {
            self.cell(cc);
        }
        let prach_tti = self.tti_rx.unwrap_or_default();
        self.sched
            .ue_cfg(rnti, ue_cfg)
            .with_context(|| format!("ue_cfg failed for rnti=0x{rnti:x} at tti={prach_tti}"))?;
        self.ue_tracker.add_user(rnti, ue_cfg, prach_tti);
        info!("tti={prach_tti}: added rnti=0x{rnti:x}");
        Ok(())
    }

    /// Advance until every registered user completed contention resolution,
    /// then drop everything aggregated so far. Returns the TTIs spent.
    pub fn run_warmup(&mut self) -> Result<u32> {
        let mut nof_ttis = 0;
        while !self.ue_tracker.all_conres_rx() {
            if nof_ttis >= MAX_WAIT_TTIS {
                bail!("users never completed contention resolution after {nof_ttis} TTIs");
            }
            self.advance_tti()?;
            nof_ttis += 1;
        }
        self.reset_stats();
        debug!("warm-up finished after {nof_ttis} TTIs");
        Ok(nof_ttis)
    }

    pub fn run_measurement(&mut self, nof_ttis: u32) -> Result<()> {
        for _ in 0..nof_ttis {
            self.advance_tti()?;
        }
        Ok(())
    }

    /// Simulate one TTI: inject traffic and feedback, run the DL and UL
    /// decisions of every cell and account for their results.
    pub fn advance_tti(&mut self) -> Result<()> {
        let tti_rx = self.tti_rx.map_or(TtiPoint::new(0), |tti| tti + 1);
        self.tti_rx = Some(tti_rx);

        let mut events = self.ue_tracker.pending_events();
        for ev in events.iter_mut() {
            let ready = self
                .ue_tracker
                .get(ev.rnti)
                .is_some_and(|ue| ue.conres_rx);
            if ready {
                self.set_external_tti_events(tti_rx, ev)
                    .with_context(|| format!("traffic injection failed at tti={tti_rx}"))?;
            }
        }
        self.ue_tracker
            .apply_events(self.sched.as_mut(), tti_rx, &events)
            .with_context(|| format!("feedback injection failed at tti={tti_rx}"))?;

        let tti_tx_dl = to_tx_dl(tti_rx);
        let tti_tx_ul = to_tx_ul(tti_rx);
        let mut dl_cc_results = Vec::with_capacity(self.cells.len());
        let mut ul_cc_results = Vec::with_capacity(self.cells.len());
        for cc in 0..self.cells.len() {
            let start = Instant::now();
            let dl = self
                .sched
                .dl_sched(tti_tx_dl, cc)
                .with_context(|| format!("dl_sched failed at tti_tx_dl={tti_tx_dl} cc={cc}"))?;
            let ul = self
                .sched
                .ul_sched(tti_tx_ul, cc)
                .with_context(|| format!("ul_sched failed at tti_tx_ul={tti_tx_ul} cc={cc}"))?;
            let elapsed = start.elapsed();
            self.total_stats
                .avg_latency
                .push(elapsed.as_nanos() as f64);

            debug!(
                "tti={} cc={}: dl allocs={} ul allocs={} ({} ns)",
                tti_rx,
                cc,
                dl.data.len(),
                ul.pusch.len(),
                elapsed.as_nanos()
            );
            dl_cc_results.push(dl);
            ul_cc_results.push(ul);
        }

        self.ue_tracker.update(&SfOutput {
            tti_rx,
            dl_cc_results: &dl_cc_results,
            ul_cc_results: &ul_cc_results,
        });
        self.total_stats.process(&dl_cc_results, &ul_cc_results);
        Ok(())
    }

    // Saturating traffic plus periodic channel reports for a ready user.
    fn set_external_tti_events(
        &mut self,
        tti_rx: TtiPoint,
        events: &mut UeTtiEvents,
    ) -> Result<(), SchedError> {
        self.sched
            .ul_bsr(events.rnti, DRB_LCG, self.traffic.ul_bytes_per_tti)?;
        self.sched.dl_rlc_buffer_state(
            events.rnti,
            DRB1_LCID,
            self.traffic.dl_bytes_per_tti,
            0,
        )?;

        if tti_rx.to_uint() % self.traffic.cqi_period == 0 {
            for cc in events.cc_list.iter_mut() {
                cc.dl_cqi = Some(self.params.cqi);
                cc.ul_snr = Some(self.traffic.ul_snr);
            }
        }
        Ok(())
    }

    fn cell(&self, enb_cc_idx: usize) -> &CellConfig {
        assert!(
            enb_cc_idx < self.cells.len(),
            "cell index {enb_cc_idx} out of range (nof_cells={})",
            self.cells.len()
        );
        &self.cells[enb_cc_idx]
    }
}
