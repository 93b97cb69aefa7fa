use std::path::PathBuf;

use clap::Parser;
use log::info;

use labjack_bridge::bridge;
use labjack_bridge::prelude::*;

/// Writes every value published on a topic to a LabJack analog output
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// YAML configuration file
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();
    let Some(path) = args.config else {
        println!("Usage: analog_output_bridge <config.yaml>");
        return Ok(());
    };

    let config = BridgeConfig::from_file(&path)?;
    let written = bridge::launch(&config, tokio::signal::ctrl_c()).await?;

    info!("Bridge stopped after {written} write(s)");
    Ok(())
}
