use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::core::modbus::{Address, Connect, Error, ExceptionCode, Reason, Transport};
use crate::core::{LabJackDataValue, LabJackDevice, Register, PRODUCT_ID, SERIAL_NUMBER};

/// The product id reported by an emulated device, that of a T7.
pub const EMULATED_PRODUCT_ID: f32 = 7.0;

/// Every write an emulated device accepted, oldest first. Outlives the transport.
pub type WriteLog = Arc<Mutex<Vec<(Register, LabJackDataValue)>>>;

/// An in-memory register file standing in for a device. Allows for testing behaviour
/// without a device present, similar to the LJM demo mode.
#[derive(Debug)]
pub struct EmulatedTransport {
    pub device: LabJackDevice,

    registers: HashMap<Address, LabJackDataValue>,
    writes: WriteLog,
    closes: Arc<AtomicUsize>,
    fail_writes: bool,
    closed: bool,
}

impl EmulatedTransport {
    pub fn new(device: LabJackDevice) -> EmulatedTransport {
        let mut registers = HashMap::new();
        registers.insert(
            PRODUCT_ID.address,
            LabJackDataValue::Float32(EMULATED_PRODUCT_ID),
        );
        registers.insert(
            SERIAL_NUMBER.address,
            LabJackDataValue::Uint32(*device.serial_number as u32),
        );

        EmulatedTransport {
            device,
            registers,
            writes: WriteLog::default(),
            closes: Arc::new(AtomicUsize::new(0)),
            fail_writes: false,
            closed: false,
        }
    }

    /// Every write accepted so far, oldest first.
    pub fn writes(&self) -> Vec<(Register, LabJackDataValue)> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write_log(&self) -> WriteLog {
        Arc::clone(&self.writes)
    }

    /// A counter of how often the transport was closed. It outlives the transport.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    /// Makes every following write fail as a device-side failure would.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Transport for EmulatedTransport {
    async fn read_register(&mut self, register: Register) -> Result<LabJackDataValue, Error> {
        if self.closed {
            return Err(Error::Released);
        }

        Ok(self
            .registers
            .get(&register.address)
            .copied()
            .unwrap_or(LabJackDataValue::zero(register.data_type)))
    }

    async fn write_register(
        &mut self,
        register: Register,
        value: LabJackDataValue,
    ) -> Result<(), Error> {
        if self.closed {
            return Err(Error::Released);
        }

        if value.r#type() != register.data_type {
            return Err(Error::InvalidData(Reason::TypeMismatch));
        }

        if self.fail_writes {
            return Err(Error::Exception(ExceptionCode::SlaveOrServerFailure));
        }

        debug!("Emulated write {}={:?}", register.name, value);
        self.registers.insert(register.address, value);
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((register, value));
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::Released);
        }

        self.closed = true;
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Emulated;

impl Connect for Emulated {
    type Transport = EmulatedTransport;

    async fn connect(device: LabJackDevice) -> Result<Self::Transport, Error> {
        Ok(EmulatedTransport::new(device))
    }
}
