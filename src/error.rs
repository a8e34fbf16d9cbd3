// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Error type shared by the accumulation pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No input images given")]
    NoInputs,

    #[error("Failed to open image '{path}': {source}")]
    ImageOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode image '{path}': {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image '{path}': {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The frame's dimensions differ from the reference image. Not fatal; the
    /// frame is skipped.
    #[error("Input dimensions {}x{} do not match output dimensions {}x{}",
            .actual.0, .actual.1, .expected.0, .expected.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl Error {
    /// Whether the run can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
