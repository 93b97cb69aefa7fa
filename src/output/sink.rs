use log::trace;

use crate::core::{dac_register, Error, LabJackClient, Transport, VoltageRange};

/// A connected device able to drive analog output channels.
#[allow(async_fn_in_trait)]
pub trait AnalogOutput {
    /// The span every channel of this device can produce.
    async fn output_range(&mut self) -> Result<VoltageRange, Error>;

    async fn write_voltage(&mut self, channel: u8, volts: f64) -> Result<(), Error>;

    /// Disconnects from the device.
    fn release(&mut self) -> Result<(), Error>;
}

impl<T> AnalogOutput for LabJackClient<T>
where
    T: Transport,
{
    async fn output_range(&mut self) -> Result<VoltageRange, Error> {
        self.dac_range().await
    }

    async fn write_voltage(&mut self, channel: u8, volts: f64) -> Result<(), Error> {
        let register = dac_register(channel)?;
        trace!("{} <- {volts}V", register.name);
        self.write_register(register, volts).await
    }

    fn release(&mut self) -> Result<(), Error> {
        self.close()
    }
}
