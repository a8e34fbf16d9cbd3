// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fmt;

use crate::pixel_stat::{PixelStat, BLUE, GREEN, NUM_BINS, RED};

/// A statistic that can be rendered from a finalized [PixelStat].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Arithmetic mean.
    Avg,
    /// Geometric mean.
    GeoAvg,
    Min,
    Max,
    /// Max minus min.
    Diff,
    /// Fraction of samples in histogram bucket k, scaled to full range.
    /// A k outside 0..NUM_BINS renders black.
    Bin(usize),
}

impl Selector {
    /// The statistics written when no histogram bins are requested.
    pub const STANDARD: [Selector; 5] = [Selector::Avg, Selector::GeoAvg,
                                         Selector::Min, Selector::Max,
                                         Selector::Diff];

    /// Returns `Bin(k)`, or None if `k` is not a bucket index.
    pub fn bin(k: usize) -> Option<Selector> {
        if k < NUM_BINS { Some(Selector::Bin(k)) } else { None }
    }

    /// All histogram bin selectors in bucket order.
    pub fn all_bins() -> impl Iterator<Item = Selector> {
        (0..NUM_BINS).filter_map(Selector::bin)
    }

    /// Suffix used in output file names.
    pub fn name(&self) -> String {
        match self {
            Selector::Avg => "avg".to_string(),
            Selector::GeoAvg => "geoavg".to_string(),
            Selector::Min => "min".to_string(),
            Selector::Max => "max".to_string(),
            Selector::Diff => "diff".to_string(),
            Selector::Bin(k) => format!("bin{:02}", k),
        }
    }

    /// Maps a finalized accumulator to an output color at the given bit
    /// depth's scale. Positions that never received a sample are black.
    pub fn select(&self, stat: &PixelStat, bit_depth: u32) -> [f64; 3] {
        if stat.sample_count == 0 {
            return [0.0; 3];
        }
        match *self {
            Selector::Avg => stat.sum,
            Selector::GeoAvg => stat.log_sum,
            Selector::Min => stat.min,
            Selector::Max => stat.max,
            Selector::Diff => [stat.max[RED] - stat.min[RED],
                               stat.max[GREEN] - stat.min[GREEN],
                               stat.max[BLUE] - stat.min[BLUE]],
            Selector::Bin(k) => {
                if k >= NUM_BINS {
                    return [0.0; 3];
                }
                let full_scale = ((1_u64 << bit_depth) - 1) as f64;
                let count = stat.sample_count as f64;
                [full_scale * stat.hist[RED][k] as f64 / count,
                 full_scale * stat.hist[GREEN][k] as f64 / count,
                 full_scale * stat.hist[BLUE][k] as f64 / count]
            },
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// mod tests.
