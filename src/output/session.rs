use log::{info, warn};

use crate::core::{Connect, Error, LabJack, LabJackClient, LabJackDevice, Transport, VoltageRange};

use super::AnalogOutput;

/// Lifecycle of the single device connection a process holds.
///
/// ```text
/// Uninitialized -> Connecting -> Connected -> Disconnecting -> Terminated
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Connecting,
    Connected,
    Disconnecting,
    Terminated,
}

/// Exclusive ownership of a connected output device.
///
/// The device is released exactly once: by [`DeviceSession::close`], or when the
/// session drops on any other exit path. Writes after that fail with [`Error::Released`].
#[derive(Debug)]
pub struct DeviceSession<S>
where
    S: AnalogOutput,
{
    sink: S,
    state: SessionState,
    range: Option<VoltageRange>,
}

impl<S> DeviceSession<S>
where
    S: AnalogOutput,
{
    /// Wraps a sink that is already connected.
    pub fn new(sink: S) -> DeviceSession<S> {
        DeviceSession {
            sink,
            state: SessionState::Connected,
            range: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Queries the output range once; later calls reuse it.
    pub async fn output_range(&mut self) -> Result<VoltageRange, Error> {
        if let Some(range) = self.range {
            return Ok(range);
        }

        self.ensure_connected()?;
        let range = self.sink.output_range().await?;
        info!("Output range: {range}");

        self.range = Some(range);
        Ok(range)
    }

    pub async fn write(&mut self, channel: u8, volts: f64) -> Result<(), Error> {
        self.ensure_connected()?;
        self.sink.write_voltage(channel, volts).await
    }

    /// Releases the device, reporting a failure to disconnect.
    pub fn close(mut self) -> Result<(), Error> {
        self.release()
    }

    fn ensure_connected(&self) -> Result<(), Error> {
        match self.state {
            SessionState::Connected => Ok(()),
            _ => Err(Error::Released),
        }
    }

    fn release(&mut self) -> Result<(), Error> {
        if self.state != SessionState::Connected {
            return Ok(());
        }

        self.state = SessionState::Disconnecting;
        let result = self.sink.release();
        self.state = SessionState::Terminated;

        info!("Device released");
        result
    }
}

impl<T> DeviceSession<LabJackClient<T>>
where
    T: Transport,
{
    /// Connects to a located device through `C`.
    pub async fn establish<C>(device: LabJackDevice) -> Result<Self, Error>
    where
        C: Connect<Transport = T>,
    {
        info!("Connecting to device: {device}");
        let client = LabJack::connect_with::<C>(device).await?;

        info!("Connected");
        Ok(DeviceSession::new(client))
    }
}

impl<S> Drop for DeviceSession<S>
where
    S: AnalogOutput,
{
    fn drop(&mut self) {
        if let Err(error) = self.release() {
            warn!("Failed to release device: {error}");
        }
    }
}
