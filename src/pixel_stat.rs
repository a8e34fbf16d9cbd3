// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Running statistics for a single pixel position across a stack of images.

pub const RED: usize = 0;
pub const GREEN: usize = 1;
pub const BLUE: usize = 2;

/// Number of histogram buckets per channel.
pub const NUM_BINS: usize = 16;
/// log2(NUM_BINS). The top LOG_NUM_BINS bits of a sample select its bucket.
pub const LOG_NUM_BINS: u32 = 4;

/// Initial `min` value. Larger than any channel value of a 16 bit image.
pub const MIN_SENTINEL: f64 = (1_u32 << 30) as f64;

/// Weighted channel values at or below zero contribute log10(LOG_FLOOR) to
/// the geometric mean instead of an undefined logarithm.
pub const LOG_FLOOR: f64 = 1.0e-6;

/// Accumulates one pixel position. Before [PixelStat::finalize()] the `sum`
/// and `log_sum` fields are running totals; afterwards they hold the
/// arithmetic and geometric means.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelStat {
    /// Number of images that contributed a sample at this position.
    pub sample_count: u32,

    /// Sum of weighted channel values, indexed by RED/GREEN/BLUE.
    pub sum: [f64; 3],

    /// Sum of log10 of weighted channel values.
    pub log_sum: [f64; 3],

    /// Extrema of weighted channel values.
    pub min: [f64; 3],
    pub max: [f64; 3],

    /// Per-channel counts of unweighted samples falling in each of the
    /// NUM_BINS equal-width buckets spanning the full bit depth range.
    pub hist: [[u32; NUM_BINS]; 3],
}

impl Default for PixelStat {
    fn default() -> Self {
        PixelStat::new()
    }
}

impl PixelStat {
    pub fn new() -> Self {
        PixelStat{sample_count: 0,
                  sum: [0.0; 3],
                  log_sum: [0.0; 3],
                  min: [MIN_SENTINEL; 3],
                  max: [0.0; 3],
                  hist: [[0; NUM_BINS]; 3]}
    }

    pub fn reset(&mut self) {
        *self = PixelStat::new();
    }

    /// Adds one image's sample at this position. `raw` holds the channel
    /// values at the image's native scale (0..2^bit_depth); `sum`, `log_sum`,
    /// `min` and `max` see `raw * weight` while the histogram bucket is taken
    /// from the unweighted value.
    pub fn update(&mut self, bit_depth: u32, raw: [f64; 3], weight: f64) {
        self.sample_count += 1;
        for c in [RED, GREEN, BLUE] {
            let v = raw[c] * weight;
            self.sum[c] += v;
            self.log_sum[c] += safe_log10(v);
            if v < self.min[c] {
                self.min[c] = v;
            }
            if v > self.max[c] {
                self.max[c] = v;
            }
            self.hist[c][histogram_bucket(raw[c], bit_depth)] += 1;
        }
    }

    /// Converts the running totals into means, dividing by `divisor`. Only
    /// `sum` and `log_sum` change; positions without samples are left alone.
    ///
    /// Must be called exactly once: the division and exponentiation are not
    /// idempotent.
    pub fn finalize(&mut self, divisor: f64) {
        if self.sample_count == 0 {
            return;
        }
        for c in [RED, GREEN, BLUE] {
            self.sum[c] /= divisor;
            self.log_sum[c] = 10_f64.powf(self.log_sum[c] / divisor);
        }
    }

    /// Sets the means to zero. Used when finalization has no usable divisor.
    pub(crate) fn zero_means(&mut self) {
        self.sum = [0.0; 3];
        self.log_sum = [0.0; 3];
    }
}

fn safe_log10(v: f64) -> f64 {
    // NaN also fails the comparison and gets the floor.
    if v > LOG_FLOOR {
        v.log10()
    } else {
        LOG_FLOOR.log10()
    }
}

/// Returns the histogram bucket for an unweighted sample at the given bit
/// depth: the top LOG_NUM_BINS bits of the value. Always in 0..NUM_BINS.
pub fn histogram_bucket(raw: f64, bit_depth: u32) -> usize {
    if !(raw > 0.0) {
        return 0;
    }
    let shift = bit_depth.saturating_sub(LOG_NUM_BINS);
    // Float to int casts saturate, so huge values land in the top bucket.
    let value = raw.floor() as u64;
    let bucket = value.checked_shr(shift).unwrap_or(0);
    bucket.min(NUM_BINS as u64 - 1) as usize
}

// mod tests.
