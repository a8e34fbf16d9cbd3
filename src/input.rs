// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::warn;

/// Separates an optional weight from the image path: `0.25:frame.png`.
pub const WEIGHT_DELIMITER: char = ':';

/// An input image reference together with the weight its samples are
/// multiplied by.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedInput {
    pub weight: f64,
    pub path: PathBuf,
}

impl WeightedInput {
    pub fn new(weight: f64, path: impl Into<PathBuf>) -> Self {
        WeightedInput{weight, path: path.into()}
    }

    /// Parses `[<weight>:]<path>`. Without a delimiter the weight is 1.0.
    /// Weight text that does not parse as a number gives weight 0.0, which
    /// silences the image; a warning is logged since that is rarely intended.
    pub fn parse(arg: &str) -> Self {
        match arg.split_once(WEIGHT_DELIMITER) {
            None => WeightedInput::new(1.0, arg),
            Some((weight_text, path)) => {
                let weight = match weight_text.trim().parse::<f64>() {
                    Ok(w) if w.is_finite() => w,
                    _ => {
                        warn!("Malformed weight '{}' for {}; using weight 0",
                              weight_text, path);
                        0.0
                    },
                };
                WeightedInput::new(weight, path)
            },
        }
    }
}

impl FromStr for WeightedInput {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(WeightedInput::parse(s))
    }
}

impl fmt::Display for WeightedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.weight, WEIGHT_DELIMITER, self.path.display())
    }
}

// mod tests.
