pub type Address = u16;
pub type Quantity = u16;

/// Register reads issued against a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFunction {
    HoldingRegisters(Address, Quantity),
}

/// Register writes issued against a device. The payload is the big-endian
/// register content, two bytes per register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteFunction {
    MultipleRegisters(Address, Vec<u8>),
}

impl ReadFunction {
    pub(crate) fn code(&self) -> u8 {
        match self {
            ReadFunction::HoldingRegisters(..) => 0x03,
        }
    }
}

impl WriteFunction {
    pub(crate) fn code(&self) -> u8 {
        match self {
            WriteFunction::MultipleRegisters(..) => 0x10,
        }
    }
}
