use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::core::Error;

/// An inclusive voltage interval `[min, max]` that an output can produce.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoltageRange {
    min: f64,
    max: f64,
}

impl VoltageRange {
    pub const UNIPOLAR_5V: VoltageRange = VoltageRange { min: 0.0, max: 5.0 };

    pub fn new(min: f64, max: f64) -> Result<VoltageRange, Error> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(Error::InvalidRange { min, max });
        }

        Ok(VoltageRange { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, volts: f64) -> bool {
        volts >= self.min && volts <= self.max
    }

    /// Truncates to the nearest bound. NaN maps to the lower bound.
    pub fn clamp(&self, volts: f64) -> f64 {
        if volts.is_nan() {
            return self.min;
        }

        volts.clamp(self.min, self.max)
    }
}

impl Display for VoltageRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}V to {}V", self.min, self.max)
    }
}
