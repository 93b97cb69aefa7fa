pub mod dac;
pub mod range;

pub use dac::*;
pub use range::*;
