use std::net::SocketAddr;

use clap::Parser;
use log::info;

use labjack_bridge::prelude::*;

/// Publishes one value on a topic, for driving a bridge by hand
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Topic name
    topic: String,

    /// Value to publish, 0.0 to 1.0 spans the output range
    #[clap(allow_hyphen_values = true)]
    value: f32,

    /// Address the bridge listens on
    #[clap(long, default_value = "127.0.0.1:7447")]
    to: SocketAddr,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    let mut publisher = UdpPublisher::connect(args.to).await?;
    publisher.publish(&args.topic, args.value).await?;

    info!("Published {} on {} to {}", args.value, args.topic, args.to);
    Ok(())
}
