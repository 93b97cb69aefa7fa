use std::io;
use std::path::PathBuf;

enum_from_primitive! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Modbus exception codes returned from the server.
    pub enum ExceptionCode {
        IllegalFunction         = 0x01,
        IllegalDataAddress      = 0x02,
        IllegalDataValue        = 0x03,
        SlaveOrServerFailure    = 0x04,
        Acknowledge             = 0x05,
        SlaveOrServerBusy       = 0x06,
        NegativeAcknowledge     = 0x07,
        MemoryParity            = 0x08,
        NotDefined              = 0x09,
        GatewayPath             = 0x0a,
        GatewayTarget           = 0x0b
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    UnexpectedReplySize,
    RecvBufferEmpty,
    SendBufferTooBig,
    DecodingError,
    TypeMismatch,
    NotWritable,
    TopicTooLong,
    MalformedMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The reader stopped before the reply for a transaction arrived.
    ReplyDropped,
    FrameSizeTooLarge,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("device answered with exception {0:?}")]
    Exception(ExceptionCode),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("device reply did not match the request")]
    InvalidResponse,
    #[error("invalid data: {0:?}")]
    InvalidData(Reason),
    #[error("reply queue: {0:?}")]
    Queue(QueueError),
    #[error("no DAQ devices found")]
    DeviceNotFound,
    #[error("device with product id {0} has no known analog output range")]
    UnsupportedDevice(f64),
    #[error("analog output channel {0} does not exist on this device")]
    UnsupportedChannel(u8),
    #[error("invalid voltage range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid waveform: {0}")]
    InvalidWaveform(&'static str),
    #[error("could not read configuration {path:?}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed configuration: {0}")]
    Config(#[from] serde_yml::Error),
    #[error("device connection already released")]
    Released,
}

impl From<Reason> for Error {
    fn from(reason: Reason) -> Error {
        Error::InvalidData(reason)
    }
}

impl From<ExceptionCode> for Error {
    fn from(err: ExceptionCode) -> Error {
        Error::Exception(err)
    }
}

impl From<QueueError> for Error {
    fn from(err: QueueError) -> Error {
        Error::Queue(err)
    }
}
