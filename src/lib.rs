// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! avgimg computes per-pixel statistics across a stack of co-registered
//! images of identical dimensions, and renders images from them: arithmetic
//! mean, geometric mean, minimum, maximum, range (max - min), and the
//! fraction of samples falling in each of 16 histogram buckets per channel.
//!
//! # Algorithm
//!
//! A [pixel_stat::PixelStat] accumulator is kept for every pixel position of
//! the first (reference) image. Each input image is decoded and drained into
//! the accumulators before the next one is read, optionally multiplied by a
//! per-image weight. Once all images are in, the accumulators are finalized
//! exactly once, and each requested statistic is rendered into a fresh image
//! with the reference's dimensions and bit depth.
//!
//! Normalization: when every weight is 1 (more precisely, when the weights
//! add up to the number of accepted images) each position is divided by its
//! own sample count. Otherwise all positions are divided by the total weight.
//!
//! # Caveats
//!
//! * Images whose dimensions differ from the reference are skipped with a
//!   warning rather than resized.
//! * A zero channel value has no logarithm. It contributes
//!   [pixel_stat::LOG_FLOOR] to the geometric mean, so the geometric mean of a
//!   channel that is ever zero renders as (nearly) black.
//! * Histogram buckets use the unweighted sample, while all other statistics
//!   use the weighted sample.
//! * Alpha channels are dropped.

pub mod error;
pub mod image_funcs;
pub mod input;
pub mod pipeline;
pub mod pixel_stat;
pub mod selector;
pub mod stack;
