use std::collections::BTreeMap;

use mac_bench_abstract::tbs::{cqi_to_mcs, snr_to_ul_mcs, tbs_bytes};
use mac_bench_abstract::{
    BroadcastAllocation, CellConfig, DlAllocation, DlSchedResult, MacScheduler, Rnti, SchedArgs,
    SchedError, SchedPolicy, TtiPoint, UeConfig, UlAllocation, UlSchedResult,
};
use tracing::debug;

const CONRES_NOF_PRB: u32 = 2;
const CONRES_MCS: u32 = 0;
const SIB1_MCS: u32 = 2;

/// Start-up values of the built-in scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSchedTuning {
    /// CQI assumed until the first report arrives.
    pub initial_dl_cqi: u32,
    /// UL SNR (dB) assumed until the first measurement arrives.
    pub initial_ul_snr: f32,
    /// DL decisions between registration and the contention resolution CE.
    pub conres_delay: u32,
}

impl Default for TimeSchedTuning {
    fn default() -> Self {
        Self {
            initial_dl_cqi: 1,
            initial_ul_snr: 0.0,
            conres_delay: 6,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Dl,
    Ul,
}

impl Direction {
    fn idx(self) -> usize {
        match self {
            Direction::Dl => 0,
            Direction::Ul => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConresState {
    Pending { remaining: u32 },
    Done,
}

#[derive(Debug, Clone, Copy)]
struct UeCarrier {
    dl_cqi: u32,
    ul_snr: f32,
}

#[derive(Debug)]
struct SchedUe {
    cfg: UeConfig,
    /// Indexed by eNB cell index; `None` for cells the user does not support.
    carriers: Vec<Option<UeCarrier>>,
    dl_pending: u32,
    ul_pending: u32,
    conres: ConresState,
    /// Exponential average of served bits per TTI, DL and UL.
    avg_rate: [f64; 2],
}

impl SchedUe {
    fn carrier(&self, cc: usize) -> Option<&UeCarrier> {
        self.carriers.get(cc).and_then(Option::as_ref)
    }

    fn is_connected(&self) -> bool {
        self.conres == ConresState::Done
    }
}

/// Time-domain scheduler: each TTI the whole usable bandwidth of a cell goes
/// to a single user per direction.
pub struct TimeScheduler {
    tuning: TimeSchedTuning,
    args: Option<SchedArgs>,
    cells: Vec<CellConfig>,
    ues: BTreeMap<Rnti, SchedUe>,
    /// Round-robin position per cell, DL and UL.
    rr_next: Vec<[usize; 2]>,
}

impl TimeScheduler {
    pub fn new(tuning: TimeSchedTuning) -> Self {
        Self {
            tuning,
            args: None,
            cells: Vec::new(),
            ues: BTreeMap::new(),
            rr_next: Vec::new(),
        }
    }

    fn check_cell(&self, cc: usize) -> Result<&CellConfig, SchedError> {
        if self.args.is_none() || self.cells.is_empty() {
            return Err(SchedError::NotConfigured);
        }
        self.cells.get(cc).ok_or(SchedError::InvalidCell {
            cc,
            nof_cells: self.cells.len(),
        })
    }

    fn ue_carrier_mut(&mut self, rnti: Rnti, cc: usize) -> Result<&mut UeCarrier, SchedError> {
        let nof_cells = self.cells.len();
        let ue = self.ues.get_mut(&rnti).ok_or(SchedError::UnknownRnti(rnti))?;
        ue.carriers
            .get_mut(cc)
            .and_then(Option::as_mut)
            .ok_or(SchedError::InvalidCell { cc, nof_cells })
    }

    fn is_sib1_tti(tti: TtiPoint) -> bool {
        tti.sf_idx() == 5 && tti.sfn() % 2 == 0
    }

    /// Choose one user among `candidates` (rnti, achievable bits this TTI).
    fn pick(&mut self, dir: Direction, cc: usize, candidates: &[(Rnti, f64)]) -> Option<Rnti> {
        if candidates.is_empty() {
            return None;
        }
        let policy = self
            .args
            .as_ref()
            .map_or(SchedPolicy::TimeRr, |a| a.sched_policy);
        match policy {
            SchedPolicy::TimeRr => {
                let next = &mut self.rr_next[cc][dir.idx()];
                let chosen = candidates[*next % candidates.len()].0;
                *next = next.wrapping_add(1);
                Some(chosen)
            }
            SchedPolicy::TimePf => {
                let mut best: Option<(Rnti, f64)> = None;
                for &(rnti, rate) in candidates {
                    let avg = self.ues[&rnti].avg_rate[dir.idx()].max(1.0);
                    let metric = rate / avg;
                    if best.is_none_or(|(_, m)| metric > m) {
                        best = Some((rnti, metric));
                    }
                }
                best.map(|(rnti, _)| rnti)
            }
        }
    }

    fn update_averages(&mut self, dir: Direction, cc: usize, served: Option<(Rnti, u32)>) {
        let alpha = self.args.as_ref().map_or(0.01, |a| a.pf_fairness);
        for (rnti, ue) in self.ues.iter_mut() {
            if ue.carrier(cc).is_none() {
                continue;
            }
            let bits = match served {
                Some((r, tbs)) if r == *rnti => f64::from(tbs) * 8.0,
                _ => 0.0,
            };
            let avg = &mut ue.avg_rate[dir.idx()];
            *avg = (1.0 - alpha) * *avg + alpha * bits;
        }
    }

    fn schedule_conres(&mut self, cc: usize, free_prb: &mut u32, result: &mut DlSchedResult) {
        for (rnti, ue) in self.ues.iter_mut() {
            if ue.cfg.primary_cc() != cc {
                continue;
            }
            let ConresState::Pending { remaining } = &mut ue.conres else {
                continue;
            };
            if *remaining > 0 {
                *remaining -= 1;
                continue;
            }
            if *free_prb < CONRES_NOF_PRB {
                continue;
            }
            let mut alloc = DlAllocation::new(
                *rnti,
                CONRES_NOF_PRB,
                tbs_bytes(CONRES_MCS, CONRES_NOF_PRB, false),
                CONRES_MCS,
            );
            alloc.conres_ce = true;
            debug!("rnti=0x{:x} contention resolution on cc={}", rnti, cc);
            result.data.push(alloc);
            *free_prb -= CONRES_NOF_PRB;
            ue.conres = ConresState::Done;
        }
    }
}

impl MacScheduler for TimeScheduler {
    fn init(&mut self, args: &SchedArgs) -> Result<(), SchedError> {
        if !(0.0..=1.0).contains(&args.pf_fairness) {
            return Err(SchedError::InvalidConfig(format!(
                "pf_fairness {} outside [0, 1]",
                args.pf_fairness
            )));
        }
        debug!("time scheduler init with policy {}", args.sched_policy);
        self.args = Some(args.clone());
        Ok(())
    }

    fn cell_cfg(&mut self, cells: &[CellConfig]) -> Result<(), SchedError> {
        if self.args.is_none() {
            return Err(SchedError::NotConfigured);
        }
        if cells.is_empty() {
            return Err(SchedError::InvalidConfig("no cells configured".into()));
        }
        if let Some(cell) = cells
            .iter()
            .find(|c| c.nof_prb == 0 || c.nof_prb > mac_bench_abstract::tbs::MAX_NOF_PRB)
        {
            return Err(SchedError::InvalidConfig(format!(
                "unsupported nof_prb {}",
                cell.nof_prb
            )));
        }
        self.cells = cells.to_vec();
        self.rr_next = vec![[0; 2]; cells.len()];
        Ok(())
    }

    fn ue_cfg(&mut self, rnti: Rnti, cfg: &UeConfig) -> Result<(), SchedError> {
        if self.cells.is_empty() {
            return Err(SchedError::NotConfigured);
        }
        if self.ues.contains_key(&rnti) {
            return Err(SchedError::DuplicateRnti(rnti));
        }
        if cfg.supported_cc_list.is_empty() {
            return Err(SchedError::InvalidConfig(format!(
                "rnti 0x{rnti:x} supports no cell"
            )));
        }
        let mut carriers = vec![None; self.cells.len()];
        for &cc in &cfg.supported_cc_list {
            let slot = carriers.get_mut(cc).ok_or(SchedError::InvalidCell {
                cc,
                nof_cells: self.cells.len(),
            })?;
            *slot = Some(UeCarrier {
                dl_cqi: self.tuning.initial_dl_cqi,
                ul_snr: self.tuning.initial_ul_snr,
            });
        }
        self.ues.insert(
            rnti,
            SchedUe {
                cfg: cfg.clone(),
                carriers,
                dl_pending: 0,
                ul_pending: 0,
                conres: ConresState::Pending {
                    remaining: self.tuning.conres_delay,
                },
                avg_rate: [0.0; 2],
            },
        );
        Ok(())
    }

    fn ul_bsr(&mut self, rnti: Rnti, _lcg_id: u32, bytes: u32) -> Result<(), SchedError> {
        let ue = self.ues.get_mut(&rnti).ok_or(SchedError::UnknownRnti(rnti))?;
        ue.ul_pending = bytes;
        Ok(())
    }

    fn dl_rlc_buffer_state(
        &mut self,
        rnti: Rnti,
        _lcid: u32,
        tx_queue: u32,
        retx_queue: u32,
    ) -> Result<(), SchedError> {
        let ue = self.ues.get_mut(&rnti).ok_or(SchedError::UnknownRnti(rnti))?;
        ue.dl_pending = tx_queue.saturating_add(retx_queue);
        Ok(())
    }

    fn dl_cqi_info(
        &mut self,
        _tti: TtiPoint,
        rnti: Rnti,
        enb_cc_idx: usize,
        cqi: u32,
    ) -> Result<(), SchedError> {
        if cqi > 15 {
            return Err(SchedError::InvalidConfig(format!("cqi {cqi} out of range")));
        }
        self.ue_carrier_mut(rnti, enb_cc_idx)?.dl_cqi = cqi;
        Ok(())
    }

    fn ul_snr_info(
        &mut self,
        _tti: TtiPoint,
        rnti: Rnti,
        enb_cc_idx: usize,
        snr: f32,
    ) -> Result<(), SchedError> {
        self.ue_carrier_mut(rnti, enb_cc_idx)?.ul_snr = snr;
        Ok(())
    }

    fn dl_sched(
        &mut self,
        tti_tx_dl: TtiPoint,
        enb_cc_idx: usize,
    ) -> Result<DlSchedResult, SchedError> {
        let cell = self.check_cell(enb_cc_idx)?.clone();
        let mut result = DlSchedResult::default();
        let mut free_prb = cell.nof_prb;

        if Self::is_sib1_tti(tti_tx_dl) {
            let nof_prb = cell.sib1_prb.min(free_prb);
            result.broadcast.push(BroadcastAllocation {
                sib_idx: 1,
                nof_prb,
                tbs: tbs_bytes(SIB1_MCS, nof_prb.max(1), false),
            });
            free_prb -= nof_prb;
        }

        self.schedule_conres(enb_cc_idx, &mut free_prb, &mut result);

        let mut served = None;
        if free_prb > 0 {
            let candidates: Vec<(Rnti, f64)> = self
                .ues
                .iter()
                .filter(|(rnti, ue)| {
                    ue.is_connected()
                        && ue.dl_pending > 0
                        && !result.data.iter().any(|a| a.rnti == **rnti)
                })
                .filter_map(|(rnti, ue)| {
                    let carrier = ue.carrier(enb_cc_idx)?;
                    let mcs = cqi_to_mcs(carrier.dl_cqi).min(ue.cfg.max_dl_mcs);
                    Some((*rnti, f64::from(tbs_bytes(mcs, free_prb, false))))
                })
                .collect();

            if let Some(rnti) = self.pick(Direction::Dl, enb_cc_idx, &candidates) {
                let ue = self.ues.get_mut(&rnti).ok_or(SchedError::UnknownRnti(rnti))?;
                let carrier = ue
                    .carrier(enb_cc_idx)
                    .copied()
                    .ok_or(SchedError::InvalidCell {
                        cc: enb_cc_idx,
                        nof_cells: self.cells.len(),
                    })?;
                let mcs = cqi_to_mcs(carrier.dl_cqi).min(ue.cfg.max_dl_mcs);
                let tbs = tbs_bytes(mcs, free_prb, false);
                ue.dl_pending = ue.dl_pending.saturating_sub(tbs);
                result.data.push(DlAllocation::new(rnti, free_prb, tbs, mcs));
                served = Some((rnti, tbs));
            }
        }
        self.update_averages(Direction::Dl, enb_cc_idx, served);
        Ok(result)
    }

    fn ul_sched(
        &mut self,
        _tti_tx_ul: TtiPoint,
        enb_cc_idx: usize,
    ) -> Result<UlSchedResult, SchedError> {
        let cell = self.check_cell(enb_cc_idx)?.clone();
        let free_prb = cell.nof_pusch_prb();
        let mut result = UlSchedResult::default();

        let mut served = None;
        if free_prb > 0 {
            let candidates: Vec<(Rnti, f64)> = self
                .ues
                .iter()
                .filter(|(_, ue)| ue.is_connected() && ue.ul_pending > 0)
                .filter_map(|(rnti, ue)| {
                    let carrier = ue.carrier(enb_cc_idx)?;
                    let mcs = snr_to_ul_mcs(carrier.ul_snr).min(ue.cfg.max_ul_mcs);
                    Some((*rnti, f64::from(tbs_bytes(mcs, free_prb, true))))
                })
                .collect();

            if let Some(rnti) = self.pick(Direction::Ul, enb_cc_idx, &candidates) {
                let nof_cells = self.cells.len();
                let ue = self.ues.get_mut(&rnti).ok_or(SchedError::UnknownRnti(rnti))?;
                let carrier = ue
                    .carrier(enb_cc_idx)
                    .copied()
                    .ok_or(SchedError::InvalidCell {
                        cc: enb_cc_idx,
                        nof_cells,
                    })?;
                let mcs = snr_to_ul_mcs(carrier.ul_snr).min(ue.cfg.max_ul_mcs);
                let tbs = tbs_bytes(mcs, free_prb, true);
                ue.ul_pending = ue.ul_pending.saturating_sub(tbs);
                result.pusch.push(UlAllocation {
                    rnti,
                    nof_prb: free_prb,
                    tbs,
                    mcs,
                });
                served = Some((rnti, tbs));
            }
        }
        self.update_averages(Direction::Ul, enb_cc_idx, served);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(policy: SchedPolicy, nof_prb: u32) -> TimeScheduler {
        let mut sched = TimeScheduler::new(TimeSchedTuning {
            conres_delay: 0,
            ..Default::default()
        });
        sched
            .init(&SchedArgs {
                sched_policy: policy,
                ..Default::default()
            })
            .unwrap();
        sched.cell_cfg(&[CellConfig::default_for(nof_prb)]).unwrap();
        sched
    }

    /// Register `rntis`, run their contention resolution on TTI 0 and fill their buffers.
    fn connect(sched: &mut TimeScheduler, rntis: &[Rnti]) {
        for &rnti in rntis {
            sched.ue_cfg(rnti, &UeConfig::default()).unwrap();
        }
        let res = sched.dl_sched(TtiPoint::new(0), 0).unwrap();
        for &rnti in rntis {
            assert!(res.data.iter().any(|a| a.rnti == rnti && a.conres_ce));
            sched.dl_rlc_buffer_state(rnti, 3, 100_000, 0).unwrap();
            sched.ul_bsr(rnti, 1, 100_000).unwrap();
        }
    }

    #[test]
    fn calls_before_configuration_fail() {
        let mut sched = TimeScheduler::new(TimeSchedTuning::default());
        assert_eq!(
            sched.dl_sched(TtiPoint::new(0), 0),
            Err(SchedError::NotConfigured)
        );
        assert_eq!(
            sched.cell_cfg(&[CellConfig::default_for(25)]),
            Err(SchedError::NotConfigured)
        );
    }

    #[test]
    fn rejects_invalid_cell_and_unknown_users() {
        let mut sched = configured(SchedPolicy::TimeRr, 25);
        assert!(matches!(
            sched.ul_sched(TtiPoint::new(0), 1),
            Err(SchedError::InvalidCell { cc: 1, .. })
        ));
        assert_eq!(
            sched.ul_bsr(0x46, 1, 10),
            Err(SchedError::UnknownRnti(0x46))
        );
        sched.ue_cfg(0x46, &UeConfig::default()).unwrap();
        assert_eq!(
            sched.ue_cfg(0x46, &UeConfig::default()),
            Err(SchedError::DuplicateRnti(0x46))
        );
    }

    #[test]
    fn contention_resolution_waits_for_configured_delay() {
        let mut sched = TimeScheduler::new(TimeSchedTuning {
            conres_delay: 2,
            ..Default::default()
        });
        sched.init(&SchedArgs::default()).unwrap();
        sched.cell_cfg(&[CellConfig::default_for(25)]).unwrap();
        sched.ue_cfg(0x46, &UeConfig::default()).unwrap();

        let mut conres_at = None;
        for t in 0..5 {
            let res = sched.dl_sched(TtiPoint::new(t), 0).unwrap();
            if res.data.iter().any(|a| a.conres_ce) {
                conres_at = Some(t);
                break;
            }
        }
        assert_eq!(conres_at, Some(2));
    }

    #[test]
    fn connected_user_gets_full_bandwidth_at_best_cqi() {
        let mut sched = configured(SchedPolicy::TimeRr, 25);
        connect(&mut sched, &[0x46]);
        sched.dl_cqi_info(TtiPoint::new(1), 0x46, 0, 15).unwrap();
        sched.ul_snr_info(TtiPoint::new(1), 0x46, 0, 40.0).unwrap();

        let dl = sched.dl_sched(TtiPoint::new(1), 0).unwrap();
        assert_eq!(dl.data.len(), 1);
        assert_eq!(dl.data[0].nof_prb, 25);
        assert_eq!(dl.data[0].mcs[0], 28);
        assert_eq!(dl.data[0].total_tbs(), u64::from(tbs_bytes(28, 25, false)));

        let ul = sched.ul_sched(TtiPoint::new(5), 0).unwrap();
        assert_eq!(ul.pusch.len(), 1);
        assert_eq!(ul.pusch[0].nof_prb, 21);
        assert_eq!(ul.pusch[0].mcs, 28);
    }

    #[test]
    fn sib1_subframes_shrink_the_data_allocation() {
        let mut sched = configured(SchedPolicy::TimeRr, 25);
        connect(&mut sched, &[0x46]);
        let dl = sched.dl_sched(TtiPoint::new(5), 0).unwrap();
        assert_eq!(dl.broadcast.len(), 1);
        assert_eq!(dl.data[0].nof_prb, 21);

        let dl = sched.dl_sched(TtiPoint::new(15), 0).unwrap();
        assert!(dl.broadcast.is_empty());
        assert_eq!(dl.data[0].nof_prb, 25);
    }

    #[test]
    fn round_robin_alternates_between_users() {
        let mut sched = configured(SchedPolicy::TimeRr, 50);
        connect(&mut sched, &[0x46, 0x47]);

        let served: Vec<Rnti> = (2..6)
            .map(|t| {
                sched.dl_rlc_buffer_state(0x46, 3, 100_000, 0).unwrap();
                sched.dl_rlc_buffer_state(0x47, 3, 100_000, 0).unwrap();
                sched.dl_sched(TtiPoint::new(t), 0).unwrap().data[0].rnti
            })
            .collect();
        assert_eq!(served, vec![0x46, 0x47, 0x46, 0x47]);
    }

    #[test]
    fn proportional_fair_serves_both_users() {
        let mut sched = configured(SchedPolicy::TimePf, 50);
        connect(&mut sched, &[0x46, 0x47]);

        let mut counts = BTreeMap::<Rnti, u32>::new();
        for t in 2..202 {
            sched.dl_rlc_buffer_state(0x46, 3, 100_000, 0).unwrap();
            sched.dl_rlc_buffer_state(0x47, 3, 100_000, 0).unwrap();
            let res = sched.dl_sched(TtiPoint::new(t), 0).unwrap();
            *counts.entry(res.data[0].rnti).or_default() += 1;
        }
        assert!(counts[&0x46] >= 90, "{counts:?}");
        assert!(counts[&0x47] >= 90, "{counts:?}");
    }

    #[test]
    fn idle_users_are_not_scheduled() {
        let mut sched = configured(SchedPolicy::TimeRr, 25);
        sched.ue_cfg(0x46, &UeConfig::default()).unwrap();
        sched.dl_sched(TtiPoint::new(0), 0).unwrap();
        let dl = sched.dl_sched(TtiPoint::new(1), 0).unwrap();
        let ul = sched.ul_sched(TtiPoint::new(1), 0).unwrap();
        assert!(dl.data.is_empty());
        assert!(ul.pusch.is_empty());
    }
}
