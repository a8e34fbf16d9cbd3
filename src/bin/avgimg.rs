// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger;
use log::{error, info};

use avgimg::error::Error;
use avgimg::input::WeightedInput;
use avgimg::pipeline::{self, OutputMode, PipelineOptions};

/// Computes per-pixel average, geometric average, minimum, maximum and range
/// across a stack of equally sized images.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Also write the 16 per-channel histogram bin images
    /// (<output>-bin00.png .. <output>-bin15.png).
    #[arg(short = 'b', long, conflicts_with_all = ["geometric", "mean"])]
    bins: bool,

    /// Write only the geometric average, to <output>.
    #[arg(short = 'g', long, conflicts_with = "mean")]
    geometric: bool,

    /// Write only the arithmetic average, to <output>.
    #[arg(short = 'm', long)]
    mean: bool,

    /// Output file name prefix; the output file itself with -g or -m.
    output: PathBuf,

    /// Input images, each optionally prefixed by a weight: [<weight>:]<path>.
    /// The first input fixes the output dimensions.
    #[arg(required = true)]
    inputs: Vec<WeightedInput>,
}

impl Args {
    fn mode(&self) -> OutputMode {
        if self.bins {
            OutputMode::WithBins
        } else if self.geometric {
            OutputMode::GeometricOnly
        } else if self.mean {
            OutputMode::MeanOnly
        } else {
            OutputMode::Standard
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // Help and version requests are not usage errors.
            return if e.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        },
    };
    let options = PipelineOptions{mode: args.mode(),
                                  output: args.output,
                                  inputs: args.inputs};
    match pipeline::run(&options) {
        Ok(summary) => {
            info!("Done: {} images averaged, {} skipped",
                  summary.accepted_count, summary.skipped_count);
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::from(exit_status(&e))
        },
    }
}

// 1 for usage errors, 2 for image I/O failures.
fn exit_status(e: &Error) -> u8 {
    match e {
        Error::NoInputs => 1,
        _ => 2,
    }
}

// mod tests.
