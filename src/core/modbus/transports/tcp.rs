use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::sink::SinkExt;
use log::{debug, error, trace};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio_stream::StreamExt;
use tokio_util::bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder, FramedRead, FramedWrite};

use crate::core::modbus::{
    get_reply_data, validate_response_code, validate_response_header, ComposedMessage,
    Compositor, Connect, Error, Header, QueueError, ReadFunction, Reason, Transport,
    WriteFunction, BASE_UNIT_ID, MODBUS_HEADER_SIZE,
};
use crate::core::{LabJackDataValue, LabJackDevice, Register};
use crate::queue::PendingReplies;

/// Describes the maximum amount of data that can be sent in an Ethernet packet.
///
/// Referenced from the [Packet Size Limits](https://support.labjack.com/docs/protocol-details-direct-modbus-tcp#ProtocolDetails[DirectModbusTCP]-PacketSizeLimits) documentation.
pub const MAX_DATA_LENGTH: usize = 1040;

/// The base transaction ID. Each new message increments it, wrapping at [`u16::MAX`].
const STARTING_TRANSACTION_ID: u16 = 0;

#[derive(Debug)]
pub struct TcpTransport {
    transaction_id: u16,
    unit_id: u8,

    cancel: Arc<Notify>,
    stream_write: FramedWrite<OwnedWriteHalf, FrameCodec>,
    replies: Arc<PendingReplies>,
    closed: bool,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> TcpTransport {
        let (read, write) = stream.into_split();
        let fr = FramedRead::new(read, FrameCodec);
        let fw = FramedWrite::new(write, FrameCodec);

        let replies = Arc::new(PendingReplies::new());
        let notify = Arc::new(Notify::new());

        tokio::spawn(TcpTransport::listen(
            Arc::clone(&replies),
            Arc::clone(&notify),
            fr,
        ));

        TcpTransport {
            transaction_id: STARTING_TRANSACTION_ID,
            unit_id: BASE_UNIT_ID,

            cancel: notify,
            stream_write: fw,
            replies,
            closed: false,
        }
    }

    async fn listen(
        replies: Arc<PendingReplies>,
        notify: Arc<Notify>,
        mut read: FramedRead<OwnedReadHalf, FrameCodec>,
    ) {
        loop {
            tokio::select! {
                data = read.next() => {
                    match data {
                        Some(Ok((header, packet))) => {
                            trace!(
                                "Obtained packet of length {}. TxnID={}",
                                header.length,
                                header.transaction_id
                            );
                            replies.deliver(header, packet).await;
                        }
                        Some(Err(err)) => {
                            error!("Error reading from the device stream: {:?}", err);
                        }
                        None => {
                            debug!("Device closed the stream");
                            break;
                        }
                    }
                }
                _ = notify.notified() => {
                    break
                }
            }
        }

        replies.close().await;
        debug!("Listening ended.")
    }

    fn compositor(&mut self) -> Compositor {
        Compositor::new(&mut self.transaction_id, self.unit_id)
    }

    async fn round_trip(&mut self, message: &ComposedMessage) -> Result<Vec<u8>, Error> {
        if self.closed {
            return Err(Error::Released);
        }

        // Fails once the reader has stopped, as no reply could ever arrive.
        let pending = self.replies.register(message.header.transaction_id).await?;
        self.stream_write.send(message.content.clone()).await?;

        let (response_header, packet) = pending.wait().await?;
        debug!("Response Header={response_header:?}. Packet={packet:?}");

        validate_response_header(&message.header, &response_header)?;
        validate_response_code(&message.content, &packet)?;
        Ok(packet)
    }
}

impl Transport for TcpTransport {
    async fn read_register(&mut self, register: Register) -> Result<LabJackDataValue, Error> {
        let function = ReadFunction::HoldingRegisters(register.address, register.data_type.size());
        let message = self.compositor().compose_read(&function)?;

        let packet = self.round_trip(&message).await?;
        let bytes = get_reply_data(&packet, message.expected_bytes)?;

        LabJackDataValue::from_bytes(register.data_type, bytes)
    }

    async fn write_register(
        &mut self,
        register: Register,
        value: LabJackDataValue,
    ) -> Result<(), Error> {
        if value.r#type() != register.data_type {
            return Err(Error::InvalidData(Reason::TypeMismatch));
        }

        let function = WriteFunction::MultipleRegisters(register.address, value.to_bytes());
        let message = self.compositor().compose_write(&function)?;

        self.round_trip(&message).await.map(|_| ())
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::Released);
        }

        // The write half shuts the socket down once the transport drops.
        self.closed = true;
        self.cancel.notify_one();
        Ok(())
    }
}

/// The TCP ModBus connection, used to reach a device over Ethernet.
pub struct Tcp;

impl Connect for Tcp {
    type Transport = TcpTransport;

    async fn connect(device: LabJackDevice) -> Result<Self::Transport, Error> {
        let addr = SocketAddr::new(device.ip_address, device.port);
        let stream = TcpStream::connect(addr).await?;

        Ok(TcpTransport::new(stream))
    }
}

/// Splits the device stream into whole Modbus frames.
#[derive(Debug)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = (Header, Vec<u8>);
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < MODBUS_HEADER_SIZE {
            // Not enough data to read the length marker.
            return Ok(None);
        }

        let header = Header::unpack(
            src.get(..MODBUS_HEADER_SIZE)
                .ok_or(Error::InvalidData(Reason::UnexpectedReplySize))?,
        )?;

        if header.length as usize > MAX_DATA_LENGTH {
            return Err(Error::Queue(QueueError::FrameSizeTooLarge));
        }

        // The unit id is counted by `length` but already sits in the header.
        let expected_size = MODBUS_HEADER_SIZE + (header.length as usize).saturating_sub(1);
        if src.len() < expected_size {
            src.reserve(expected_size - src.len());
            return Ok(None);
        }

        let data = src
            .get(..expected_size)
            .ok_or(Error::InvalidResponse)?
            .to_vec();
        src.advance(expected_size);

        Ok(Some((header, data)))
    }
}

impl Encoder<Vec<u8>> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Vec<u8>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}
