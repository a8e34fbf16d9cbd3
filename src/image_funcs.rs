// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, ImageBuffer, ImageReader, Rgb, RgbImage};
use log::debug;

use crate::error::{Error, Result};

pub type Rgb16Image = ImageBuffer<Rgb<u16>, Vec<u16>>;

/// An RGB raster at its native bit depth. Input images are decoded into a
/// Frame and each rendered statistic is produced as a Frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Rgb8(RgbImage),
    Rgb16(Rgb16Image),
}

impl Frame {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Frame::Rgb8(img) => img.dimensions(),
            Frame::Rgb16(img) => img.dimensions(),
        }
    }

    /// Bits per channel.
    pub fn depth(&self) -> u32 {
        match self {
            Frame::Rgb8(_) => 8,
            Frame::Rgb16(_) => 16,
        }
    }

    /// Channel values of the pixel at (x, y), in the range 0..2^depth.
    pub fn sample(&self, x: u32, y: u32) -> [f64; 3] {
        match self {
            Frame::Rgb8(img) => {
                let p = img.get_pixel(x, y).0;
                [p[0] as f64, p[1] as f64, p[2] as f64]
            },
            Frame::Rgb16(img) => {
                let p = img.get_pixel(x, y).0;
                [p[0] as f64, p[1] as f64, p[2] as f64]
            },
        }
    }

    /// Returns this frame rescaled to the given depth (8 or 16). A frame
    /// already at `depth` is returned unchanged.
    pub fn to_depth(self, depth: u32) -> Frame {
        match (self, depth) {
            (Frame::Rgb8(img), 16) => {
                Frame::Rgb16(DynamicImage::ImageRgb8(img).into_rgb16())
            },
            (Frame::Rgb16(img), 8) => {
                Frame::Rgb8(DynamicImage::ImageRgb16(img).into_rgb8())
            },
            (frame, _) => frame,
        }
    }

    /// Builds a frame of the given size and depth, computing each pixel with
    /// `f`. Values are rounded and clamped to the depth's range.
    pub fn from_fn<F>(width: u32, height: u32, depth: u32, mut f: F) -> Frame
    where F: FnMut(u32, u32) -> [f64; 3]
    {
        if depth > 8 {
            Frame::Rgb16(Rgb16Image::from_fn(width, height, |x, y| {
                let v = f(x, y);
                Rgb([quantize(v[0], u16::MAX as f64) as u16,
                     quantize(v[1], u16::MAX as f64) as u16,
                     quantize(v[2], u16::MAX as f64) as u16])
            }))
        } else {
            Frame::Rgb8(RgbImage::from_fn(width, height, |x, y| {
                let v = f(x, y);
                Rgb([quantize(v[0], u8::MAX as f64) as u8,
                     quantize(v[1], u8::MAX as f64) as u8,
                     quantize(v[2], u8::MAX as f64) as u8])
            }))
        }
    }
}

/// Rounds `value` to the nearest integer in 0..=full_scale. NaN maps to 0.
pub fn quantize(value: f64, full_scale: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.round().clamp(0.0, full_scale)
}

/// Reads and decodes the image at `path` as RGB. Images with more than 8 bits
/// per channel become 16 bit frames. Any alpha channel is discarded.
pub fn decode_frame(path: &Path) -> Result<Frame> {
    let decode_start = Instant::now();
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| Error::ImageOpen{path: path.to_path_buf(), source})?;
    let img = reader.decode()
        .map_err(|source| Error::ImageDecode{path: path.to_path_buf(), source})?;
    let color = img.color();
    let bytes_per_channel =
        color.bytes_per_pixel() as u32 / color.channel_count() as u32;
    let frame = if bytes_per_channel > 1 {
        Frame::Rgb16(img.into_rgb16())
    } else {
        Frame::Rgb8(img.into_rgb8())
    };
    let (width, height) = frame.dimensions();
    debug!("Decoded {:?} ({}x{}, {:?}) in {:?}",
           path, width, height, color, decode_start.elapsed());
    Ok(frame)
}

/// Encodes `frame` to `path`; the format follows the file extension.
pub fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    let result = match frame {
        Frame::Rgb8(img) => img.save(path),
        Frame::Rgb16(img) => img.save(path),
    };
    result.map_err(|source| Error::ImageEncode{path: path.to_path_buf(), source})
}

// mod tests.
