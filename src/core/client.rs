use log::debug;

use crate::prelude::*;

/// A connected device. Owns its transport exclusively.
#[derive(Debug)]
pub struct LabJackClient<T>
where
    T: Transport,
{
    pub device: LabJackDevice,
    transport: T,
}

impl<T> LabJackClient<T>
where
    T: Transport,
{
    pub fn new(device: LabJackDevice, transport: T) -> LabJackClient<T> {
        LabJackClient { device, transport }
    }

    pub async fn read_register(&mut self, register: Register) -> Result<LabJackDataValue, Error> {
        self.transport.read_register(register).await
    }

    /// Writes a scalar, converted to the register's native type.
    pub async fn write_register(&mut self, register: Register, value: f64) -> Result<(), Error> {
        if !register.is_writable() {
            return Err(Error::InvalidData(Reason::NotWritable));
        }

        let value = register.encode(value);
        debug!("Writing {}={:?}", register.name, value);
        self.transport.write_register(register, value).await
    }

    /// Reads the product id and derives the DAC span for that product.
    pub async fn dac_range(&mut self) -> Result<VoltageRange, Error> {
        let product_id = self.read_register(PRODUCT_ID).await?.as_f64();

        DeviceType::from(product_id as i32)
            .dac_range()
            .ok_or(Error::UnsupportedDevice(product_id))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn close(&mut self) -> Result<(), Error> {
        self.transport.close()
    }
}
