use std::net::{Ipv4Addr, SocketAddr};

use futures_util::sink::SinkExt;
use log::{debug, trace, warn};
use tokio::net::UdpSocket;
use tokio_stream::StreamExt;
use tokio_util::udp::UdpFramed;

use crate::core::Error;

use super::{Float32Codec, Float32Message, Subscription};

/// Receives `Float32` datagrams and yields those published on one topic.
pub struct UdpSubscription {
    topic: String,
    framed: UdpFramed<Float32Codec>,
}

impl UdpSubscription {
    pub async fn bind(addr: SocketAddr, topic: impl Into<String>) -> Result<Self, Error> {
        let socket = UdpSocket::bind(addr).await?;
        let topic = topic.into();
        debug!("Listening for topic {topic} on {}", socket.local_addr()?);

        Ok(UdpSubscription {
            topic,
            framed: UdpFramed::new(socket, Float32Codec),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.framed.get_ref().local_addr()?)
    }
}

impl Subscription for UdpSubscription {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn next(&mut self) -> Option<Result<f32, Error>> {
        loop {
            match self.framed.next().await? {
                Ok((message, from)) if message.topic == self.topic => {
                    trace!("{} <- {} from {from}", message.topic, message.value);
                    return Some(Ok(message.value));
                }
                Ok((message, from)) => {
                    trace!("Ignoring topic {} from {from}", message.topic);
                }
                Err(Error::InvalidData(reason)) => {
                    warn!("Dropping malformed datagram: {reason:?}");
                }
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

/// Publishes `Float32` messages to one subscriber address.
pub struct UdpPublisher {
    target: SocketAddr,
    framed: UdpFramed<Float32Codec>,
}

impl UdpPublisher {
    pub async fn connect(target: SocketAddr) -> Result<Self, Error> {
        let local = match target {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local).await?;

        Ok(UdpPublisher {
            target,
            framed: UdpFramed::new(socket, Float32Codec),
        })
    }

    pub async fn publish(&mut self, topic: &str, value: f32) -> Result<(), Error> {
        let message = Float32Message {
            topic: topic.to_string(),
            value,
        };
        self.framed.send((message, self.target)).await
    }
}
