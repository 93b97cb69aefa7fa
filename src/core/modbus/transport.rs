use crate::core::{LabJackDataValue, LabJackDevice, Register};

use super::Error;

/// A register-level link to one device.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn read_register(&mut self, register: Register) -> Result<LabJackDataValue, Error>;

    async fn write_register(
        &mut self,
        register: Register,
        value: LabJackDataValue,
    ) -> Result<(), Error>;

    /// Releases the link. Every later call fails with [`Error::Released`].
    fn close(&mut self) -> Result<(), Error>;
}

/// The means by which a [`Transport`] is established to a located device.
#[allow(async_fn_in_trait)]
pub trait Connect {
    type Transport: Transport;

    async fn connect(device: LabJackDevice) -> Result<Self::Transport, Error>;
}
