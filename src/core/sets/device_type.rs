use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::VoltageRange;

/// LabJack product families, as reported by the `PRODUCT_ID` register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    T4,
    T7,
    T8,
    TSERIES,
    DIGIT,
    #[default]
    ANY,
    EMULATED(i32),
    UNKNOWN(i32),
}

impl From<i32> for DeviceType {
    fn from(value: i32) -> Self {
        match value {
            4 => DeviceType::T4,
            7 => DeviceType::T7,
            8 => DeviceType::T8,
            200 => DeviceType::DIGIT,
            -999..=-1 => DeviceType::EMULATED(value),
            value => DeviceType::UNKNOWN(value),
        }
    }
}

impl DeviceType {
    /// Whether a discovered device of type `found` satisfies this filter.
    pub fn accepts(&self, found: DeviceType) -> bool {
        match self {
            DeviceType::ANY => true,
            DeviceType::TSERIES => {
                matches!(found, DeviceType::T4 | DeviceType::T7 | DeviceType::T8)
            }
            filter => *filter == found,
        }
    }

    /// The span of the DAC outputs. Both the T4 and T7 drive DAC0/DAC1 from 0 to 5V.
    pub fn dac_range(&self) -> Option<VoltageRange> {
        match self {
            DeviceType::T4 | DeviceType::T7 => Some(VoltageRange::UNIPOLAR_5V),
            _ => None,
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::T4 => write!(f, "T4"),
            DeviceType::T7 => write!(f, "T7"),
            DeviceType::T8 => write!(f, "T8"),
            DeviceType::TSERIES => write!(f, "TSERIES"),

            DeviceType::DIGIT => write!(f, "DIGIT"),
            DeviceType::ANY => write!(f, "ANY"),

            DeviceType::EMULATED(value) => write!(f, "EMULATED::[{value}]"),
            DeviceType::UNKNOWN(value) => write!(f, "UNKNOWN::[{value}]"),
        }
    }
}
