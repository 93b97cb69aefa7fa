pub mod connection_type;
pub mod device_type;

pub use connection_type::*;
pub use device_type::*;
