pub mod client;
pub mod connection;
pub mod conversion;
pub mod data_types;
pub mod device;
pub mod dist;
pub mod modbus;
pub mod sets;

pub use client::*;
pub use connection::*;
pub use conversion::*;
pub use data_types::*;
pub use device::*;
pub use dist::*;
pub use modbus::*;
pub use sets::*;
