pub mod composite;
pub mod error;
pub mod function;
pub mod transport;
pub mod transports;

pub use composite::*;
pub use error::*;
pub use function::*;
pub use transport::*;
pub use transports::*;

pub const MODBUS_HEADER_SIZE: usize = 7;
pub const MODBUS_MAX_PACKET_SIZE: usize = 260;
