//! FDD PRACH occasions (36.211 table 5.7.1-2).

use crate::tti::TtiPoint;

#[derive(Clone, Copy)]
enum SfnPattern {
    Even,
    Any,
}

const ALL_SUBFRAMES: &[u32] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

// The table repeats every 16 configuration indices, one block per preamble format.
const PATTERNS: [(SfnPattern, &[u32]); 16] = [
    (SfnPattern::Even, &[1]),
    (SfnPattern::Even, &[4]),
    (SfnPattern::Even, &[7]),
    (SfnPattern::Any, &[1]),
    (SfnPattern::Any, &[4]),
    (SfnPattern::Any, &[7]),
    (SfnPattern::Any, &[1, 6]),
    (SfnPattern::Any, &[2, 7]),
    (SfnPattern::Any, &[3, 8]),
    (SfnPattern::Any, &[1, 4, 7]),
    (SfnPattern::Any, &[2, 5, 8]),
    (SfnPattern::Any, &[3, 6, 9]),
    (SfnPattern::Any, &[0, 2, 4, 6, 8]),
    (SfnPattern::Any, &[1, 3, 5, 7, 9]),
    (SfnPattern::Any, ALL_SUBFRAMES),
    (SfnPattern::Even, &[9]),
];

// Entries marked N/A for FDD.
const NOT_AVAILABLE: [u32; 5] = [30, 46, 60, 61, 62];

/// Whether `tti` is a PRACH occasion for the FDD configuration `config_idx`.
///
/// Unsupported configuration indices never match.
pub fn is_prach_opportunity(config_idx: u32, tti: TtiPoint) -> bool {
    if config_idx >= 64 || NOT_AVAILABLE.contains(&config_idx) {
        return false;
    }
    let (sfn, subframes) = PATTERNS[(config_idx % 16) as usize];
    if matches!(sfn, SfnPattern::Even) && tti.sfn() % 2 != 0 {
        return false;
    }
    subframes.contains(&tti.sf_idx())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occasions(config_idx: u32, nof_ttis: u32) -> Vec<u32> {
        (0..nof_ttis)
            .filter(|t| is_prach_opportunity(config_idx, TtiPoint::new(*t)))
            .collect()
    }

    #[test]
    fn config_3_opens_every_frame_on_subframe_1() {
        assert_eq!(occasions(3, 40), vec![1, 11, 21, 31]);
    }

    #[test]
    fn config_0_opens_on_even_frames_only() {
        assert_eq!(occasions(0, 40), vec![1, 21]);
    }

    #[test]
    fn config_14_opens_every_subframe() {
        assert_eq!(occasions(14, 10).len(), 10);
    }

    #[test]
    fn unavailable_configs_never_match() {
        assert!(occasions(30, 100).is_empty());
        assert!(occasions(64, 100).is_empty());
    }
}
