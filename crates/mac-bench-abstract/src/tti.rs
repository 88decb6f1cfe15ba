use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Number of TTIs in one hyperframe cycle (1024 radio frames of 10 subframes).
pub const NOF_TTIS: u32 = 10240;

/// Processing delay between a TTI being received and the TTI its DL decision is sent in.
pub const TX_ENB_DELAY: u32 = 4;

/// A subframe counter that wraps at [`NOF_TTIS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TtiPoint(u32);

impl TtiPoint {
    pub fn new(tti: u32) -> Self {
        Self(tti % NOF_TTIS)
    }

    pub fn to_uint(self) -> u32 {
        self.0
    }

    /// System frame number.
    pub fn sfn(self) -> u32 {
        self.0 / 10
    }

    /// Subframe index within the radio frame.
    pub fn sf_idx(self) -> u32 {
        self.0 % 10
    }
}

impl Add<u32> for TtiPoint {
    type Output = TtiPoint;

    fn add(self, rhs: u32) -> TtiPoint {
        TtiPoint::new(self.0 + rhs % NOF_TTIS)
    }
}

impl AddAssign<u32> for TtiPoint {
    fn add_assign(&mut self, rhs: u32) {
        *self = *self + rhs;
    }
}

impl From<u32> for TtiPoint {
    fn from(tti: u32) -> Self {
        TtiPoint::new(tti)
    }
}

impl fmt::Display for TtiPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// TTI in which the DL decision taken for `tti_rx` goes on air.
pub fn to_tx_dl(tti_rx: TtiPoint) -> TtiPoint {
    tti_rx + TX_ENB_DELAY
}

/// TTI in which the UL grant issued for `tti_rx` is transmitted by the UE.
pub fn to_tx_ul(tti_rx: TtiPoint) -> TtiPoint {
    to_tx_dl(tti_rx) + TX_ENB_DELAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_hyperframe_boundary() {
        let tti = TtiPoint::new(NOF_TTIS - 1);
        assert_eq!((tti + 1).to_uint(), 0);
        assert_eq!((tti + 3).to_uint(), 2);
        assert_eq!(TtiPoint::new(NOF_TTIS + 5).to_uint(), 5);
    }

    #[test]
    fn splits_into_sfn_and_subframe() {
        let tti = TtiPoint::new(1234);
        assert_eq!(tti.sfn(), 123);
        assert_eq!(tti.sf_idx(), 4);
    }

    #[test]
    fn pipeline_delays() {
        let rx = TtiPoint::new(10);
        assert_eq!(to_tx_dl(rx).to_uint(), 14);
        assert_eq!(to_tx_ul(rx).to_uint(), 18);
        assert_eq!(to_tx_ul(TtiPoint::new(NOF_TTIS - 2)).to_uint(), 6);
    }
}
