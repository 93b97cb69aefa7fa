//! Topic transports delivering `Float32` messages to the bridge.

pub mod bus;
pub mod codec;
pub mod udp;

pub use bus::*;
pub use codec::*;
pub use udp::*;

use crate::core::Error;

/// The default port the UDP topic transport listens on.
pub const DEFAULT_TOPIC_PORT: u16 = 7447;

/// An ordered stream of scalar messages from one topic.
#[allow(async_fn_in_trait)]
pub trait Subscription {
    fn topic(&self) -> &str;

    /// The next message, or `None` once the topic can deliver no more.
    async fn next(&mut self) -> Option<Result<f32, Error>>;
}
