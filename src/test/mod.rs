//! End-to-end checks of the output loops against a recording device.

mod bridge;

pub use observed::*;
pub use recording::*;
