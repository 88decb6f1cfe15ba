//! Transport block size and MCS lookups.
//!
//! The highest TBS index, the one MCS 28 maps to in both directions, uses its
//! row of the 36.213 TBS table (table 7.1.7.2.1-1) verbatim. Lower indices
//! follow the shape of that row, scaled by their 100-PRB entry and rounded
//! down to a whole byte.

/// Largest MCS index that maps to a transport block size.
pub const MAX_MCS: u32 = 28;

/// Largest PRB count covered by the TBS table.
pub const MAX_NOF_PRB: u32 = 110;

const TBS_100_PRB: [u32; 27] = [
    2792, 3624, 4584, 5736, 7224, 8760, 10296, 12216, 14112, 15840, 17568, 19848, 22920, 25456,
    28336, 30576, 32856, 36696, 39232, 43816, 46888, 51024, 55056, 57336, 61664, 63776, 75376,
];

/// Number of TBS indices.
pub const NOF_TBS_IDX: u32 = TBS_100_PRB.len() as u32;

/// Table row of the highest TBS index, 1..=110 PRBs.
const TBS_IDX_26: [u32; MAX_NOF_PRB as usize] = [
    712, 1480, 2216, 2984, 3752, 4392, 5160, 5992, 6712, 7480, //
    8248, 8760, 9528, 10296, 11064, 11832, 12576, 13536, 14112, 14688, //
    15264, 16416, 16992, 17568, 18336, 19080, 19848, 20616, 21384, 22152, //
    22920, 23688, 24496, 25456, 25456, 26416, 27376, 27376, 28336, 29296, //
    29296, 30576, 30576, 31704, 32856, 32856, 34008, 34008, 35160, 36696, //
    36696, 37888, 37888, 39232, 39232, 40576, 40576, 42368, 42368, 43816, //
    43816, 43816, 45352, 45352, 46888, 46888, 48936, 48936, 48936, 51024, //
    51024, 52752, 52752, 52752, 55056, 55056, 55056, 57336, 57336, 57336, //
    59256, 59256, 59256, 61664, 61664, 61664, 63776, 63776, 63776, 66592, //
    66592, 66592, 68808, 68808, 68808, 71112, 71112, 71112, 73712, 75376, //
    75376, 75376, 75376, 75376, 75376, 75376, 75376, 75376, 75376, 75376,
];

const TOP_TBS_IDX: usize = TBS_100_PRB.len() - 1;

const MIN_TBS_BITS: u32 = 16;

// CQI 0 is "out of range"; it maps to the most robust MCS.
const CQI_TO_MCS: [u32; 16] = [0, 0, 0, 2, 4, 6, 8, 11, 13, 16, 18, 21, 23, 25, 27, 28];

/// Map an MCS index to a TBS index.
///
/// # Panics
/// If `mcs` is above [`MAX_MCS`].
pub fn tbs_idx_from_mcs(mcs: u32, uplink: bool) -> u32 {
    assert!(mcs <= MAX_MCS, "mcs {mcs} has no TBS index");
    if uplink {
        match mcs {
            0..=10 => mcs,
            11..=20 => mcs - 1,
            _ => mcs - 2,
        }
    } else {
        match mcs {
            0..=9 => mcs,
            10..=16 => mcs - 1,
            17..=27 => mcs - 2,
            _ => 26,
        }
    }
}

/// Transport block size in bits for a TBS index and PRB allocation.
///
/// # Panics
/// If `tbs_idx` or `nof_prb` fall outside the table.
pub fn tbs_from_idx(tbs_idx: u32, nof_prb: u32) -> u32 {
    assert!(tbs_idx < NOF_TBS_IDX, "tbs index {tbs_idx} out of range");
    assert!(
        (1..=MAX_NOF_PRB).contains(&nof_prb),
        "nof_prb {nof_prb} out of range"
    );
    let top = TBS_IDX_26[nof_prb as usize - 1];
    let tbs_idx = tbs_idx as usize;
    if tbs_idx == TOP_TBS_IDX {
        return top;
    }
    let bits =
        u64::from(top) * u64::from(TBS_100_PRB[tbs_idx]) / u64::from(TBS_100_PRB[TOP_TBS_IDX]);
    // Never above the top row, fits in u32.
    let bits = (bits / 8 * 8) as u32;
    bits.max(MIN_TBS_BITS)
}

/// Transport block size in bytes for an MCS and PRB allocation.
pub fn tbs_bytes(mcs: u32, nof_prb: u32, uplink: bool) -> u32 {
    tbs_from_idx(tbs_idx_from_mcs(mcs, uplink), nof_prb) / 8
}

/// Highest DL MCS a wideband CQI report supports.
pub fn cqi_to_mcs(cqi: u32) -> u32 {
    CQI_TO_MCS[cqi.min(15) as usize]
}

/// Highest UL MCS an uplink SNR (dB) supports.
pub fn snr_to_ul_mcs(snr: f32) -> u32 {
    let mcs = ((snr + 5.0) * 0.8).floor();
    mcs.clamp(0.0, MAX_MCS as f32) as u32
}
