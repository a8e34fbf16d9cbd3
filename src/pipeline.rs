// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::image_funcs::{decode_frame, save_frame};
use crate::input::WeightedInput;
use crate::selector::Selector;
use crate::stack::StackAccumulator;

/// Which statistics a run writes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// avg, geoavg, min, max and diff, each to `<output>-<name>.png`.
    #[default]
    Standard,
    /// Standard outputs plus the 16 histogram bin images.
    WithBins,
    /// Only the geometric mean, written to `<output>` itself.
    GeometricOnly,
    /// Only the arithmetic mean, written to `<output>` itself.
    MeanOnly,
}

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub mode: OutputMode,

    /// File name prefix, or the output file for the single-image modes.
    pub output: PathBuf,

    /// The first input is the reference image; it fixes the output
    /// dimensions and bit depth.
    pub inputs: Vec<WeightedInput>,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunSummary {
    pub accepted_count: u32,
    pub skipped_count: u32,
    pub total_weight: f64,
    pub written: Vec<PathBuf>,
}

/// Lists each statistic to render with the path it is written to.
pub fn plan_outputs(mode: OutputMode, output: &Path) -> Vec<(Selector, PathBuf)> {
    let named = |selector: Selector| {
        let mut name = OsString::from(output.as_os_str());
        name.push(format!("-{}.png", selector.name()));
        (selector, PathBuf::from(name))
    };
    match mode {
        OutputMode::Standard => Selector::STANDARD.into_iter().map(named).collect(),
        OutputMode::WithBins => Selector::STANDARD.into_iter()
            .chain(Selector::all_bins())
            .map(named)
            .collect(),
        OutputMode::GeometricOnly => vec![(Selector::GeoAvg, output.to_path_buf())],
        OutputMode::MeanOnly => vec![(Selector::Avg, output.to_path_buf())],
    }
}

/// Decodes every input, accumulates the frames, finalizes and writes the
/// requested statistics. Decode and encode failures abort the run; outputs
/// written before the failure are left in place. Inputs whose dimensions
/// differ from the reference are skipped with a warning.
pub fn run(options: &PipelineOptions) -> Result<RunSummary> {
    let run_start = Instant::now();
    let Some(first) = options.inputs.first() else {
        return Err(Error::NoInputs);
    };

    info!("Reading reference {}", first.path.display());
    let reference = decode_frame(&first.path)?;
    let mut acc = StackAccumulator::for_reference(&reference);
    let (width, height) = acc.dimensions();
    info!("Output: {} ({}x{}, {} bit)",
          options.output.display(), width, height, acc.depth());

    // The reference is also the first input; it is decoded only once.
    let mut reference = Some(reference);
    for input in &options.inputs {
        let frame = match reference.take() {
            Some(frame) => frame,
            None => {
                info!("Reading {}", input.path.display());
                decode_frame(&input.path)?
            },
        };
        let frame = if frame.depth() != acc.depth() {
            debug!("Converting {} from {} to {} bit",
                   input.path.display(), frame.depth(), acc.depth());
            frame.to_depth(acc.depth())
        } else {
            frame
        };
        match acc.accumulate(input.weight, &frame) {
            Ok(()) => (),
            Err(e) if e.is_recoverable() => {
                warn!("Ignoring {}: {}", input.path.display(), e);
            },
            Err(e) => return Err(e),
        }
    }

    let accepted_count = acc.accepted_count();
    let skipped_count = acc.skipped_count();
    let total_weight = acc.total_weight();
    info!("Computing statistics over {} images ({} skipped), total weight {}",
          accepted_count, skipped_count, total_weight);
    let finalized = acc.finalize();

    let mut written = Vec::new();
    for (selector, path) in plan_outputs(options.mode, &options.output) {
        let frame = finalized.render(selector);
        save_frame(&frame, &path)?;
        info!("Saved {} to {}", selector, path.display());
        written.push(path);
    }
    info!("Wrote {} images in {:?}", written.len(), run_start.elapsed());
    Ok(RunSummary{accepted_count, skipped_count, total_weight, written})
}

// mod tests.
