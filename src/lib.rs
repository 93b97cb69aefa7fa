#[macro_use]
extern crate enum_primitive;

pub mod bridge;
pub mod config;
pub mod core;
pub mod output;
pub mod pubsub;
pub mod queue;
pub mod sine;

#[cfg(test)]
pub mod test;

pub mod prelude {
    pub use crate::core::*;

    pub use crate::bridge::{OutputBridge, PreparedBridge};
    pub use crate::config::{BridgeConfig, DeviceSelector};
    pub use crate::output::*;
    pub use crate::pubsub::*;
    pub use crate::sine::{SineDriver, SineWave, MAX_VOLTAGE, MIN_VOLTAGE};
}
