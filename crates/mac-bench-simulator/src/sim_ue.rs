use std::collections::BTreeMap;

use mac_bench_abstract::{
    DlSchedResult, MacScheduler, Rnti, SchedError, TtiPoint, UeConfig, UlSchedResult,
};
use tracing::debug;

/// Feedback a user reports for one cell in one TTI. `None` keeps the last report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CcTtiEvents {
    pub enb_cc_idx: usize,
    pub dl_cqi: Option<u32>,
    pub ul_snr: Option<f32>,
}

/// Everything a user reports to the scheduler in one TTI.
#[derive(Debug, Clone, PartialEq)]
pub struct UeTtiEvents {
    pub rnti: Rnti,
    pub cc_list: Vec<CcTtiEvents>,
}

/// Last feedback forwarded to the scheduler for one of the user's cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CcFeedback {
    pub enb_cc_idx: usize,
    pub dl_cqi: Option<u32>,
    pub ul_snr: Option<f32>,
}

/// Protocol state of one simulated user.
#[derive(Debug, Clone, PartialEq)]
pub struct SimUeContext {
    pub rnti: Rnti,
    pub ue_cfg: UeConfig,
    pub prach_tti: TtiPoint,
    /// Contention resolution completed. Traffic is only injected afterwards.
    pub conres_rx: bool,
    pub conres_tti: Option<TtiPoint>,
    pub cc_list: Vec<CcFeedback>,
}

/// Decisions of one TTI across all cells, indexed by eNB cell index.
pub struct SfOutput<'a> {
    pub tti_rx: TtiPoint,
    pub dl_cc_results: &'a [DlSchedResult],
    pub ul_cc_results: &'a [UlSchedResult],
}

/// Tracks simulated users and derives their protocol state from the
/// scheduler's decisions.
#[derive(Debug, Default)]
pub struct SimUeTracker {
    ue_db: BTreeMap<Rnti, SimUeContext>,
}

impl SimUeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user whose random access happened on `prach_tti`.
    ///
    /// # Panics
    /// If `rnti` is already tracked.
    pub fn add_user(&mut self, rnti: Rnti, ue_cfg: &UeConfig, prach_tti: TtiPoint) {
        let cc_list = ue_cfg
            .supported_cc_list
            .iter()
            .map(|&enb_cc_idx| CcFeedback {
                enb_cc_idx,
                ..Default::default()
            })
            .collect();
        let previous = self.ue_db.insert(
            rnti,
            SimUeContext {
                rnti,
                ue_cfg: ue_cfg.clone(),
                prach_tti,
                conres_rx: false,
                conres_tti: None,
                cc_list,
            },
        );
        assert!(previous.is_none(), "rnti 0x{rnti:x} registered twice");
    }

    pub fn ue_db(&self) -> &BTreeMap<Rnti, SimUeContext> {
        &self.ue_db
    }

    pub fn get(&self, rnti: Rnti) -> Option<&SimUeContext> {
        self.ue_db.get(&rnti)
    }

    pub fn nof_ues(&self) -> usize {
        self.ue_db.len()
    }

    /// True once every registered user completed contention resolution.
    pub fn all_conres_rx(&self) -> bool {
        self.ue_db.values().all(|ue| ue.conres_rx)
    }

    /// Empty events for every tracked user, to be filled in before they are applied.
    pub fn pending_events(&self) -> Vec<UeTtiEvents> {
        self.ue_db
            .values()
            .map(|ue| UeTtiEvents {
                rnti: ue.rnti,
                cc_list: ue
                    .cc_list
                    .iter()
                    .map(|cc| CcTtiEvents {
                        enb_cc_idx: cc.enb_cc_idx,
                        ..Default::default()
                    })
                    .collect(),
            })
            .collect()
    }

    /// Forward the feedback carried by `events` to the scheduler.
    pub fn apply_events(
        &mut self,
        sched: &mut dyn MacScheduler,
        tti_rx: TtiPoint,
        events: &[UeTtiEvents],
    ) -> Result<(), SchedError> {
        for ev in events {
            let ue = self
                .ue_db
                .get_mut(&ev.rnti)
                .ok_or(SchedError::UnknownRnti(ev.rnti))?;
            for (cc_ev, feedback) in ev.cc_list.iter().zip(ue.cc_list.iter_mut()) {
                if let Some(cqi) = cc_ev.dl_cqi {
                    sched.dl_cqi_info(tti_rx, ev.rnti, cc_ev.enb_cc_idx, cqi)?;
                    feedback.dl_cqi = Some(cqi);
                }
                if let Some(snr) = cc_ev.ul_snr {
                    sched.ul_snr_info(tti_rx, ev.rnti, cc_ev.enb_cc_idx, snr)?;
                    feedback.ul_snr = Some(snr);
                }
            }
        }
        Ok(())
    }

    /// Update user state from the decisions just taken.
    pub fn update(&mut self, sf_out: &SfOutput<'_>) {
        for (cc, dl) in sf_out.dl_cc_results.iter().enumerate() {
            for alloc in dl.data.iter().filter(|a| a.conres_ce) {
                let Some(ue) = self.ue_db.get_mut(&alloc.rnti) else {
                    debug!(
                        "tti={} cc={}: contention resolution for unknown rnti 0x{:x}",
                        sf_out.tti_rx, cc, alloc.rnti
                    );
                    continue;
                };
                if !ue.conres_rx {
                    debug!(
                        "tti={} rnti=0x{:x} contention resolution received on cc={}",
                        sf_out.tti_rx, alloc.rnti, cc
                    );
                    ue.conres_rx = true;
                    ue.conres_tti = Some(sf_out.tti_rx);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mac_bench_abstract::DlAllocation;

    #[test]
    fn no_users_means_everyone_is_ready() {
        assert!(SimUeTracker::new().all_conres_rx());
    }

    #[test]
    fn conres_allocation_marks_user_ready() {
        let mut tracker = SimUeTracker::new();
        tracker.add_user(0x46, &UeConfig::default(), TtiPoint::new(1));
        tracker.add_user(0x47, &UeConfig::default(), TtiPoint::new(11));
        assert!(!tracker.all_conres_rx());

        let mut alloc = DlAllocation::new(0x46, 2, 6, 0);
        alloc.conres_ce = true;
        let dl = [DlSchedResult {
            data: vec![alloc, DlAllocation::new(0x47, 2, 6, 0)],
            broadcast: vec![],
        }];
        tracker.update(&SfOutput {
            tti_rx: TtiPoint::new(20),
            dl_cc_results: &dl,
            ul_cc_results: &[UlSchedResult::default()],
        });

        assert!(tracker.get(0x46).unwrap().conres_rx);
        assert_eq!(tracker.get(0x46).unwrap().conres_tti, Some(TtiPoint::new(20)));
        assert!(!tracker.get(0x47).unwrap().conres_rx);
        assert!(!tracker.all_conres_rx());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut tracker = SimUeTracker::new();
        tracker.add_user(0x46, &UeConfig::default(), TtiPoint::new(1));
        tracker.add_user(0x46, &UeConfig::default(), TtiPoint::new(1));
    }

    #[test]
    fn new_tti_events_cover_every_supported_cell() {
        let mut tracker = SimUeTracker::new();
        let cfg = UeConfig {
            supported_cc_list: vec![0, 1],
            ..Default::default()
        };
        tracker.add_user(0x46, &cfg, TtiPoint::new(1));
        tracker.add_user(0x45, &UeConfig::default(), TtiPoint::new(11));
        let events = tracker.pending_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].rnti, 0x45);
        assert_eq!(events[0].cc_list.len(), 1);
        let events = &events[1..];
        assert_eq!(events[0].rnti, 0x46);
        assert_eq!(events[0].cc_list.len(), 2);
        assert!(events[0].cc_list.iter().all(|cc| cc.dl_cqi.is_none()));
    }
}
