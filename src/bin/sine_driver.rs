use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;

use labjack_bridge::prelude::*;
use labjack_bridge::sine;

/// Outputs a software-timed sine wave on a LabJack analog output
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(flatten)]
    wave: SineWave,

    /// Analog output channel, 0 for DAC0
    #[clap(long, default_value = "0")]
    channel: u8,

    /// Serial number of the device, -2 for the emulated device
    #[clap(long, allow_hyphen_values = true)]
    serial: Option<i32>,

    /// Known device address, skips discovery
    #[clap(long)]
    ip: Option<IpAddr>,

    /// What to do when a write fails
    #[clap(long, value_enum, default_value_t = WriteFailurePolicy::Terminate)]
    on_write_failure: WriteFailurePolicy,

    /// Discovery timeout in milliseconds
    #[clap(long, default_value = "2000")]
    discovery_timeout_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();
    dac_register(args.channel)?;

    let selector = DeviceSelector {
        serial: args.serial.map(LabJackSerialNumber),
        ip: args.ip,
        device_type: DeviceType::ANY,
    };

    sine::launch(
        &selector,
        Duration::from_millis(args.discovery_timeout_ms),
        args.wave,
        args.channel,
        args.on_write_failure,
        tokio::signal::ctrl_c(),
    )
    .await?;

    Ok(())
}
