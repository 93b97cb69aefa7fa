pub mod policy;
pub mod session;
pub mod sink;

pub use policy::*;
pub use session::*;
pub use sink::*;
