//! Drives an analog output from the values published on a topic.

use std::future::Future;
use std::net::SocketAddr;

use log::{info, warn};

use crate::config::BridgeConfig;
use crate::core::{
    Connect, Dac, Emulated, Error, LabJack, LabJackDevice, Normalized, Tcp, VoltageRange,
};
use crate::output::{AnalogOutput, DeviceSession, WriteFailurePolicy};
use crate::pubsub::{Subscription, UdpSubscription};

/// Maps normalized values onto one output channel, one write per value.
pub struct OutputBridge<S>
where
    S: AnalogOutput,
{
    session: DeviceSession<S>,
    scale: Normalized,
    channel: u8,
    policy: WriteFailurePolicy,
    written: u64,
}

impl<S> OutputBridge<S>
where
    S: AnalogOutput,
{
    /// Queries the device range the bridge scales into.
    pub async fn start(
        mut session: DeviceSession<S>,
        channel: u8,
        policy: WriteFailurePolicy,
    ) -> Result<Self, Error> {
        let range = session.output_range().await?;

        Ok(OutputBridge {
            session,
            scale: Normalized(range),
            channel,
            policy,
            written: 0,
        })
    }

    pub fn range(&self) -> VoltageRange {
        self.scale.0
    }

    /// Writes one value and returns the voltage it mapped to.
    pub async fn handle(&mut self, value: f32) -> Result<f64, Error> {
        let voltage = self.scale.to_voltage(value as f64);
        info!("Outputting voltage: {voltage:.2} V");

        match self.session.write(self.channel, voltage).await {
            Ok(()) => self.written += 1,
            Err(failure) => self.policy.handle(failure)?,
        }

        Ok(voltage)
    }

    /// Handles messages until the subscription ends or `shutdown` resolves, then
    /// releases the device. Returns how many writes reached the device.
    ///
    /// Shutdown also abandons a write that is still waiting on the device.
    pub async fn run<Sub, F>(mut self, subscription: &mut Sub, shutdown: F) -> Result<u64, Error>
    where
        Sub: Subscription,
        F: Future,
    {
        tokio::pin!(shutdown);

        let outcome = loop {
            let value = tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                message = subscription.next() => match message {
                    Some(Ok(value)) => value,
                    Some(Err(error)) => {
                        warn!("Dropping message on {}: {error}", subscription.topic());
                        continue;
                    }
                    None => {
                        info!("Subscription to {} ended", subscription.topic());
                        break Ok(());
                    }
                }
            };

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    warn!("Shutdown requested while writing {value}");
                    break Ok(());
                }
                handled = self.handle(value) => {
                    if let Err(error) = handled {
                        break Err(error);
                    }
                }
            }
        };

        let written = self.written;
        let released = self.session.close();

        outcome?;
        released?;
        Ok(written)
    }
}

/// Locates the configured device, subscribes to the configured topic and bridges
/// until `shutdown` resolves.
pub async fn launch<F>(config: &BridgeConfig, shutdown: F) -> Result<u64, Error>
where
    F: Future,
{
    PreparedBridge::new(config).await?.run(shutdown).await
}

/// A located device and a bound subscription, not yet connected.
pub struct PreparedBridge {
    device: LabJackDevice,
    subscription: UdpSubscription,
    channel: u8,
    policy: WriteFailurePolicy,
}

impl PreparedBridge {
    pub async fn new(config: &BridgeConfig) -> Result<Self, Error> {
        config.validate()?;
        let device = LabJack::locate(&config.device, config.discovery_timeout()).await?;

        let subscription = UdpSubscription::bind(config.listen, &config.subscriber_topic).await?;
        info!("Subscribed to topic: {}", subscription.topic());

        Ok(PreparedBridge {
            device,
            subscription,
            channel: config.channel,
            policy: config.on_write_failure,
        })
    }

    pub fn device(&self) -> &LabJackDevice {
        &self.device
    }

    /// Where the subscription receives, with any port `0` resolved.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.subscription.local_addr()
    }

    /// Connects over the transport the located device calls for, then bridges.
    pub async fn run<F>(self, shutdown: F) -> Result<u64, Error>
    where
        F: Future,
    {
        if self.device.serial_number.is_emulated() {
            self.serve::<Emulated, F>(shutdown).await
        } else {
            self.serve::<Tcp, F>(shutdown).await
        }
    }

    pub async fn serve<C, F>(mut self, shutdown: F) -> Result<u64, Error>
    where
        C: Connect,
        F: Future,
    {
        let session = DeviceSession::establish::<C>(self.device).await?;
        let bridge = OutputBridge::start(session, self.channel, self.policy).await?;

        bridge.run(&mut self.subscription, shutdown).await
    }
}
