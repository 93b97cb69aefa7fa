use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::core::modbus::{Address, Error, Quantity, Reason};

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabJackDataType {
    Uint16 = 0,
    Uint32 = 1,
    Int32 = 2,
    Float32 = 3,
}

impl LabJackDataType {
    /// Width of the type in 16-bit Modbus registers.
    pub const fn size(&self) -> Quantity {
        match self {
            LabJackDataType::Uint16 => 1,
            LabJackDataType::Uint32 | LabJackDataType::Int32 | LabJackDataType::Float32 => 2,
        }
    }

    /// Width of the type in bytes on the wire.
    pub const fn bytes(&self) -> usize {
        self.size() as usize * 2
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LabJackDataValue {
    Uint16(u16),
    Uint32(u32),
    Int32(i32),
    Float32(f32),
}

impl LabJackDataValue {
    pub fn r#type(&self) -> LabJackDataType {
        match self {
            LabJackDataValue::Uint16(_) => LabJackDataType::Uint16,
            LabJackDataValue::Uint32(_) => LabJackDataType::Uint32,
            LabJackDataValue::Int32(_) => LabJackDataType::Int32,
            LabJackDataValue::Float32(_) => LabJackDataType::Float32,
        }
    }

    /// Decodes the big-endian register content of `data_type`. Trailing bytes are ignored.
    pub fn from_bytes(data_type: LabJackDataType, bytes: &[u8]) -> Result<Self, Error> {
        let mut rdr = Cursor::new(bytes);
        let decoding = |_| Error::InvalidData(Reason::DecodingError);

        Ok(match data_type {
            LabJackDataType::Uint16 => {
                LabJackDataValue::Uint16(rdr.read_u16::<BigEndian>().map_err(decoding)?)
            }
            LabJackDataType::Uint32 => {
                LabJackDataValue::Uint32(rdr.read_u32::<BigEndian>().map_err(decoding)?)
            }
            LabJackDataType::Int32 => {
                LabJackDataValue::Int32(rdr.read_i32::<BigEndian>().map_err(decoding)?)
            }
            LabJackDataType::Float32 => {
                LabJackDataValue::Float32(rdr.read_f32::<BigEndian>().map_err(decoding)?)
            }
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            LabJackDataValue::Uint16(v) => v.to_be_bytes().to_vec(),
            LabJackDataValue::Uint32(v) => v.to_be_bytes().to_vec(),
            LabJackDataValue::Int32(v) => v.to_be_bytes().to_vec(),
            LabJackDataValue::Float32(v) => v.to_be_bytes().to_vec(),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            LabJackDataValue::Uint16(v) => v as f64,
            LabJackDataValue::Uint32(v) => v as f64,
            LabJackDataValue::Int32(v) => v as f64,
            LabJackDataValue::Float32(v) => v as f64,
        }
    }

    /// Zero of the given type, the value of a register that was never written.
    pub fn zero(data_type: LabJackDataType) -> Self {
        match data_type {
            LabJackDataType::Uint16 => LabJackDataValue::Uint16(0),
            LabJackDataType::Uint32 => LabJackDataValue::Uint32(0),
            LabJackDataType::Int32 => LabJackDataValue::Int32(0),
            LabJackDataType::Float32 => LabJackDataValue::Float32(0.0),
        }
    }
}

/// Defines whether a register can be written or read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessControl {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Register {
    pub name: &'static str,
    pub address: Address,
    pub data_type: LabJackDataType,
    pub access: AccessControl,
}

impl Register {
    pub const fn new(
        name: &'static str,
        address: Address,
        data_type: LabJackDataType,
        access: AccessControl,
    ) -> Register {
        Register {
            name,
            address,
            data_type,
            access,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.access != AccessControl::ReadOnly
    }

    /// Converts a scalar into the register's native type. Float registers lose
    /// precision beyond `f32`, integer registers saturate at their bounds.
    pub fn encode(&self, value: f64) -> LabJackDataValue {
        match self.data_type {
            LabJackDataType::Uint16 => LabJackDataValue::Uint16(value as u16),
            LabJackDataType::Uint32 => LabJackDataValue::Uint32(value as u32),
            LabJackDataType::Int32 => LabJackDataValue::Int32(value as i32),
            LabJackDataType::Float32 => LabJackDataValue::Float32(value as f32),
        }
    }
}

/**
 * #### DAC0
 *
 * Pass a voltage for the specified analog output.
 */
pub const DAC0: Register = Register::new(
    "DAC0",
    1000,
    LabJackDataType::Float32,
    AccessControl::ReadWrite,
);

/**
 * #### DAC1
 *
 * Pass a voltage for the specified analog output.
 */
pub const DAC1: Register = Register::new(
    "DAC1",
    1002,
    LabJackDataType::Float32,
    AccessControl::ReadWrite,
);

/**
 * #### PRODUCT_ID
 *
 * The numeric identifier of the device, such as 7 for a T7.
 */
pub const PRODUCT_ID: Register = Register::new(
    "PRODUCT_ID",
    60000,
    LabJackDataType::Float32,
    AccessControl::ReadOnly,
);

/**
 * #### SERIAL_NUMBER
 *
 * The serial number of the device.
 */
pub const SERIAL_NUMBER: Register = Register::new(
    "SERIAL_NUMBER",
    60028,
    LabJackDataType::Uint32,
    AccessControl::ReadOnly,
);

/// Maps an analog output channel index onto its DAC register.
pub fn dac_register(channel: u8) -> Result<Register, Error> {
    match channel {
        0 => Ok(DAC0),
        1 => Ok(DAC1),
        other => Err(Error::UnsupportedChannel(other)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assert_correct_address() {
        assert_eq!(DAC0.address, 1000);
        assert_eq!(DAC1.address, 1002);
        assert_eq!(DAC0.data_type, LabJackDataType::Float32);
        assert_eq!(SERIAL_NUMBER.address - PRODUCT_ID.address, 28);
    }

    #[test]
    fn channels_map_to_dacs() {
        assert_eq!(dac_register(0).expect("DAC0").address, DAC0.address);
        assert_eq!(dac_register(1).expect("DAC1").address, DAC1.address);
        assert!(matches!(dac_register(2), Err(Error::UnsupportedChannel(2))));
    }

    #[test]
    fn float_register_content() {
        let value = DAC0.encode(2.5);
        assert_eq!(value.to_bytes(), vec![0x40, 0x20, 0x00, 0x00]);

        let decoded = LabJackDataValue::from_bytes(LabJackDataType::Float32, &value.to_bytes())
            .expect("Must decode");
        assert_eq!(decoded, LabJackDataValue::Float32(2.5));
    }

    #[test]
    fn short_content_fails_to_decode() {
        let result = LabJackDataValue::from_bytes(LabJackDataType::Uint32, &[0x00, 0x11]);
        assert!(matches!(
            result,
            Err(Error::InvalidData(Reason::DecodingError))
        ));
    }

    #[test]
    fn read_only_registers_refuse_writes() {
        assert!(!PRODUCT_ID.is_writable());
        assert!(DAC1.is_writable());
    }
}
