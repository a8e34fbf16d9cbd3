// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Streams a sequence of equally sized frames into a grid of [PixelStat]
//! accumulators, then finalizes the grid and renders statistics from it.

use std::time::Instant;

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::image_funcs::Frame;
use crate::pixel_stat::PixelStat;
use crate::selector::Selector;

/// Running per-pixel statistics for a stack of frames. Sized from the
/// reference frame; every accepted frame must have the same dimensions.
#[derive(Debug)]
pub struct StackAccumulator {
    width: u32,
    height: u32,
    depth: u32,

    // Row-major, width * height entries.
    stats: Vec<PixelStat>,

    total_weight: f64,
    accepted_count: u32,
    skipped_count: u32,
}

impl StackAccumulator {
    /// `depth` is the bit depth of the reference frame, used when rendering.
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        let stats = vec![PixelStat::new(); width as usize * height as usize];
        StackAccumulator{width, height, depth, stats,
                         total_weight: 0.0, accepted_count: 0, skipped_count: 0}
    }

    /// Creates an accumulator with the reference frame's dimensions and depth.
    /// The reference frame itself is not accumulated.
    pub fn for_reference(reference: &Frame) -> Self {
        let (width, height) = reference.dimensions();
        StackAccumulator::new(width, height, reference.depth())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Sum of the weights of accepted frames.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn accepted_count(&self) -> u32 {
        self.accepted_count
    }

    pub fn skipped_count(&self) -> u32 {
        self.skipped_count
    }

    pub fn stats(&self) -> &[PixelStat] {
        &self.stats
    }

    /// Feeds every pixel of `frame`, multiplied by `weight`, into the
    /// accumulator at the same position. A frame whose width or height
    /// differs is rejected with [Error::DimensionMismatch] and contributes
    /// nothing.
    pub fn accumulate(&mut self, weight: f64, frame: &Frame) -> Result<()> {
        let actual = frame.dimensions();
        if actual != (self.width, self.height) {
            self.skipped_count += 1;
            return Err(Error::DimensionMismatch{
                expected: (self.width, self.height), actual});
        }
        let accumulate_start = Instant::now();
        let depth = frame.depth();
        let width = self.width as usize;
        if width > 0 {
            self.stats.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
                for (x, stat) in row.iter_mut().enumerate() {
                    stat.update(depth, frame.sample(x as u32, y as u32), weight);
                }
            });
        }
        self.total_weight += weight;
        self.accepted_count += 1;
        debug!("Accumulated frame {} (weight {}) in {:?}",
               self.accepted_count, weight, accumulate_start.elapsed());
        Ok(())
    }

    /// The divisor that turns running totals into means. With unit weights
    /// (total weight equal to the frame count) each position divides by its
    /// own sample count; otherwise all positions divide by the total weight.
    fn divisor_for(&self, stat: &PixelStat) -> f64 {
        if self.is_unit_weighted() {
            stat.sample_count as f64
        } else {
            self.total_weight
        }
    }

    pub fn is_unit_weighted(&self) -> bool {
        self.total_weight == self.accepted_count as f64
    }

    /// Converts the running totals into means. Consumes the accumulator so
    /// that finalization happens exactly once.
    pub fn finalize(mut self) -> FinalizedStack {
        let finalize_start = Instant::now();
        let mut stats = std::mem::take(&mut self.stats);
        if !self.is_unit_weighted() && !(self.total_weight > 0.0) {
            warn!("Total weight {} of {} frames is not positive; \
                   means will be zero", self.total_weight, self.accepted_count);
            stats.par_iter_mut().for_each(|stat| stat.zero_means());
        } else {
            let acc = &self;
            stats.par_iter_mut().for_each(|stat| {
                let divisor = acc.divisor_for(stat);
                stat.finalize(divisor);
            });
        }
        debug!("Finalized {} positions in {:?}",
               stats.len(), finalize_start.elapsed());
        FinalizedStack{width: self.width, height: self.height,
                       depth: self.depth, stats}
    }
}

/// Per-pixel statistics after finalization; `sum` and `log_sum` hold the
/// arithmetic and geometric means.
#[derive(Debug)]
pub struct FinalizedStack {
    width: u32,
    height: u32,
    depth: u32,
    stats: Vec<PixelStat>,
}

impl FinalizedStack {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn stats(&self) -> &[PixelStat] {
        &self.stats
    }

    pub fn stat(&self, x: u32, y: u32) -> &PixelStat {
        &self.stats[y as usize * self.width as usize + x as usize]
    }

    /// Renders `selector` into a new frame with the reference's dimensions
    /// and bit depth.
    pub fn render(&self, selector: Selector) -> Frame {
        let render_start = Instant::now();
        let depth = self.depth;
        let colors: Vec<[f64; 3]> = self.stats.par_iter()
            .map(|stat| selector.select(stat, depth))
            .collect();
        let width = self.width as usize;
        let frame = Frame::from_fn(self.width, self.height, depth, |x, y| {
            colors[y as usize * width + x as usize]
        });
        debug!("Rendered {} in {:?}", selector, render_start.elapsed());
        frame
    }
}

#[cfg(test)]
mod tests {
    extern crate approx;
    use approx::assert_abs_diff_eq;
    use image::{Rgb, RgbImage};
    use imageproc::rgb_image;
    use super::*;
    use crate::image_funcs::Rgb16Image;
    use crate::pixel_stat::{RED, GREEN, BLUE};

    fn uniform_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame::Rgb8(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    #[test]
    fn test_two_frames_unit_weight() {
        let first = Frame::Rgb8(rgb_image!([10, 10, 10], [1, 2, 3]));
        let second = Frame::Rgb8(rgb_image!([30, 30, 30], [1, 2, 3]));
        let mut acc = StackAccumulator::for_reference(&first);
        acc.accumulate(1.0, &first).unwrap();
        acc.accumulate(1.0, &second).unwrap();
        assert_eq!(acc.accepted_count(), 2);
        assert_eq!(acc.total_weight(), 2.0);
        assert!(acc.is_unit_weighted());

        let finalized = acc.finalize();
        let stat = finalized.stat(0, 0);
        assert_abs_diff_eq!(stat.sum[RED], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(stat.log_sum[GREEN], 300_f64.sqrt(), epsilon = 1e-9);

        let avg = finalized.render(Selector::Avg);
        assert_eq!(avg.sample(0, 0), [20.0, 20.0, 20.0]);
        assert_eq!(avg.sample(1, 0), [1.0, 2.0, 3.0]);
        let geoavg = finalized.render(Selector::GeoAvg);
        assert_eq!(geoavg.sample(0, 0), [17.0, 17.0, 17.0]);
        assert_eq!(finalized.render(Selector::Min).sample(0, 0), [10.0; 3]);
        assert_eq!(finalized.render(Selector::Max).sample(0, 0), [30.0; 3]);
        assert_eq!(finalized.render(Selector::Diff).sample(0, 0), [20.0; 3]);
        assert_eq!(finalized.render(Selector::Diff).sample(1, 0), [0.0; 3]);
    }

    #[test]
    fn test_weighted_global_normalization() {
        let frame = uniform_frame(1, 1, 100);
        let mut acc = StackAccumulator::for_reference(&frame);
        for weight in [0.2, 0.3, 0.5] {
            acc.accumulate(weight, &frame).unwrap();
        }
        assert_eq!(acc.accepted_count(), 3);
        assert!(!acc.is_unit_weighted());
        let finalized = acc.finalize();
        let stat = finalized.stat(0, 0);
        for c in [RED, GREEN, BLUE] {
            assert_abs_diff_eq!(stat.sum[c], 100.0, epsilon = 1e-9);
        }
        assert_eq!(finalized.render(Selector::Avg).sample(0, 0), [100.0; 3]);
    }

    #[test]
    fn test_weights_summing_to_count_use_sample_count() {
        let frame = uniform_frame(1, 1, 100);
        let mut acc = StackAccumulator::for_reference(&frame);
        acc.accumulate(0.5, &frame).unwrap();
        acc.accumulate(1.5, &frame).unwrap();
        assert!(acc.is_unit_weighted());
        assert_eq!(acc.divisor_for(&acc.stats()[0]), 2.0);
        let finalized = acc.finalize();
        assert_abs_diff_eq!(finalized.stat(0, 0).sum[RED], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mismatched_frame_skipped() {
        let reference = uniform_frame(2, 2, 50);
        let wider = uniform_frame(3, 2, 200);
        let taller = uniform_frame(2, 3, 200);
        let mut acc = StackAccumulator::for_reference(&reference);
        acc.accumulate(1.0, &reference).unwrap();
        for frame in [&wider, &taller] {
            let err = acc.accumulate(0.7, frame).unwrap_err();
            assert!(err.is_recoverable());
            assert!(matches!(err, Error::DimensionMismatch{..}));
        }
        assert_eq!(acc.accepted_count(), 1);
        assert_eq!(acc.skipped_count(), 2);
        assert_eq!(acc.total_weight(), 1.0);
        for stat in acc.stats() {
            assert_eq!(stat.sample_count, 1);
            assert_eq!(stat.max, [50.0; 3]);
        }
        let finalized = acc.finalize();
        assert_eq!(finalized.render(Selector::Avg).sample(1, 1), [50.0; 3]);
    }

    #[test]
    fn test_histogram_matches_sample_count() {
        let frames = [uniform_frame(2, 1, 0), uniform_frame(2, 1, 255),
                      uniform_frame(2, 1, 128)];
        let mut acc = StackAccumulator::for_reference(&frames[0]);
        for frame in &frames {
            acc.accumulate(1.0, frame).unwrap();
            for stat in acc.stats() {
                for c in [RED, GREEN, BLUE] {
                    assert_eq!(stat.hist[c].iter().sum::<u32>(), stat.sample_count);
                }
            }
        }
        let finalized = acc.finalize();
        let bin0 = finalized.render(Selector::Bin(0));
        let bin8 = finalized.render(Selector::Bin(8));
        let bin15 = finalized.render(Selector::Bin(15));
        // One of three samples in each bucket: 255 / 3 = 85.
        assert_eq!(bin0.sample(0, 0), [85.0; 3]);
        assert_eq!(bin8.sample(1, 0), [85.0; 3]);
        assert_eq!(bin15.sample(0, 0), [85.0; 3]);
        assert_eq!(finalized.render(Selector::Bin(4)).sample(0, 0), [0.0; 3]);
    }

    #[test]
    fn test_zero_channel_geoavg() {
        let first = Frame::Rgb8(rgb_image!([0, 100, 100]));
        let second = Frame::Rgb8(rgb_image!([100, 0, 100]));
        let mut acc = StackAccumulator::for_reference(&first);
        acc.accumulate(1.0, &first).unwrap();
        acc.accumulate(1.0, &second).unwrap();
        let geoavg = acc.finalize().render(Selector::GeoAvg);
        // Channels holding a zero collapse to black; blue is untouched.
        assert_eq!(geoavg.sample(0, 0), [0.0, 0.0, 100.0]);
    }

    #[test]
    fn test_zero_total_weight() {
        let frame = uniform_frame(1, 1, 100);
        let mut acc = StackAccumulator::for_reference(&frame);
        acc.accumulate(0.0, &frame).unwrap();
        acc.accumulate(0.0, &frame).unwrap();
        let finalized = acc.finalize();
        assert_eq!(finalized.render(Selector::Avg).sample(0, 0), [0.0; 3]);
        assert_eq!(finalized.render(Selector::GeoAvg).sample(0, 0), [0.0; 3]);
        assert_eq!(finalized.render(Selector::Bin(6)).sample(0, 0), [255.0; 3]);
    }

    #[test]
    fn test_no_frames_renders_black() {
        let acc = StackAccumulator::new(2, 2, 8);
        let finalized = acc.finalize();
        for selector in Selector::STANDARD {
            let frame = finalized.render(selector);
            assert_eq!(frame.dimensions(), (2, 2));
            assert_eq!(frame.sample(1, 1), [0.0; 3]);
        }
    }

    #[test]
    fn test_render_keeps_reference_depth() {
        let mut img = Rgb16Image::new(1, 1);
        img.put_pixel(0, 0, Rgb([65535, 4096, 1]));
        let frame = Frame::Rgb16(img);
        let mut acc = StackAccumulator::for_reference(&frame);
        acc.accumulate(1.0, &frame).unwrap();
        assert_eq!(acc.depth(), 16);
        let finalized = acc.finalize();
        let max = finalized.render(Selector::Max);
        assert_eq!(max.depth(), 16);
        assert_eq!(max.sample(0, 0), [65535.0, 4096.0, 1.0]);
        assert_eq!(finalized.render(Selector::Bin(15)).sample(0, 0),
                   [65535.0, 0.0, 0.0]);
        assert_eq!(finalized.render(Selector::Bin(1)).sample(0, 0),
                   [0.0, 65535.0, 0.0]);
    }
}  // mod tests.
