//! We need to be able to discover the labjack device on the network, we
//! can do this through UDP broadcast.
//!
//! Support seen [here](https://support.labjack.com/docs/protocol-details-direct-modbus-tcp#ProtocolDetails%5BDirectModbusTCP%5D-ReadT-SeriesProductID(Searchnetworkforadevice)).
//! Every T-series device on the segment answers a Modbus read sent to the
//! broadcast address, which is the logical equivalent of LJM's `ListAll`.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::{debug, trace};
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};

use crate::core::modbus::{
    get_reply_data, validate_response_code, validate_response_header, ComposedMessage,
    Compositor, Error, Header, Quantity, ReadFunction, Reason, BASE_UNIT_ID,
};
use crate::core::{
    ConnectionType, DeviceType, LabJackDataValue, LabJackDevice, PRODUCT_ID, SERIAL_NUMBER,
};

/// The port by which ModBus communication occurs over a standard connection to a
/// LabJack device over Ethernet.
pub const MODBUS_COMMUNICATION_PORT: u16 = 502;

/// The port devices listen on for broadcast discovery requests.
pub const DISCOVERY_PORT: u16 = 52362;

pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

const BROADCAST_IP: Ipv4Addr = Ipv4Addr::BROADCAST;

/// Covers `PRODUCT_ID` through `SERIAL_NUMBER` in a single read.
const IDENTITY_REGISTERS: Quantity = SERIAL_NUMBER.address - PRODUCT_ID.address + 2;

pub struct Discover;

impl Discover {
    /// Broadcasts an identity read and collects every reply that arrives before
    /// `timeout` elapses. Replies that fail to decode are kept as errors.
    pub async fn search(timeout: Duration) -> Result<Vec<Result<LabJackDevice, Error>>, Error> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;

        let mut transaction_id = 0;
        let request = Discover::identity_request(&mut transaction_id)?;
        socket
            .send_to(&request.content, (BROADCAST_IP, DISCOVERY_PORT))
            .await?;

        let deadline = Instant::now() + timeout;
        let mut found = vec![];
        let mut buf = [0u8; 1024];

        loop {
            match timeout_at(deadline, socket.recv_from(&mut buf)).await {
                Err(_) => break,
                Ok(Err(error)) => found.push(Err(Error::Io(error))),
                Ok(Ok((size, addr))) => {
                    trace!("LabJack Found! PacketSize={}, Addr={}", size, addr);
                    found.push(Discover::identify(&request, &buf[..size], addr));
                }
            }
        }

        debug!("Discovery concluded with {} replies", found.len());
        Ok(found)
    }

    fn identity_request(transaction_id: &mut u16) -> Result<ComposedMessage, Error> {
        Compositor::new(transaction_id, BASE_UNIT_ID).compose_read(&ReadFunction::HoldingRegisters(
            PRODUCT_ID.address,
            IDENTITY_REGISTERS,
        ))
    }

    /// Decodes a reply to the identity read into the device that sent it.
    fn identify(
        request: &ComposedMessage,
        reply: &[u8],
        from: SocketAddr,
    ) -> Result<LabJackDevice, Error> {
        let header = Header::unpack(reply)?;
        validate_response_header(&request.header, &header)?;
        validate_response_code(&request.content, reply)?;

        let data = get_reply_data(reply, request.expected_bytes)?;
        let serial_offset = (SERIAL_NUMBER.address - PRODUCT_ID.address) as usize * 2;

        let product_id = LabJackDataValue::from_bytes(PRODUCT_ID.data_type, data)?.as_f64();
        let serial = match LabJackDataValue::from_bytes(
            SERIAL_NUMBER.data_type,
            data.get(serial_offset..)
                .ok_or(Error::InvalidData(Reason::UnexpectedReplySize))?,
        )? {
            LabJackDataValue::Uint32(serial) => serial as i32,
            _ => return Err(Error::InvalidData(Reason::DecodingError)),
        };

        Ok(LabJackDevice {
            device_type: DeviceType::from(product_id as i32),
            connection_type: ConnectionType::ETHERNET,
            ip_address: from.ip(),
            serial_number: serial.into(),
            port: MODBUS_COMMUNICATION_PORT,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reply_for(request: &ComposedMessage, product_id: f32, serial: u32) -> Vec<u8> {
        let mut data = vec![0u8; request.expected_bytes];
        data[..4].copy_from_slice(&product_id.to_be_bytes());
        data[56..60].copy_from_slice(&serial.to_be_bytes());

        let mut reply = request.content[..7].to_vec();
        let length = (3 + data.len()) as u16;
        reply[4..6].copy_from_slice(&length.to_be_bytes());
        reply.push(0x03);
        reply.push(data.len() as u8);
        reply.extend(data);
        reply
    }

    #[test]
    fn identity_read_spans_serial_number() {
        let mut tid = 0;
        let request = Discover::identity_request(&mut tid).expect("Must compose");

        assert_eq!(IDENTITY_REGISTERS, 30);
        assert_eq!(request.expected_bytes, 60);
    }

    #[test]
    fn reply_identifies_device() {
        let mut tid = 0;
        let request = Discover::identity_request(&mut tid).expect("Must compose");
        let reply = reply_for(&request, 7.0, 470_031_743);
        let from: SocketAddr = "192.168.1.25:52362".parse().unwrap();

        let device = Discover::identify(&request, &reply, from).expect("Must identify");

        assert_eq!(device.device_type, DeviceType::T7);
        assert_eq!(*device.serial_number, 470_031_743);
        assert_eq!(device.ip_address, from.ip());
        assert_eq!(device.port, MODBUS_COMMUNICATION_PORT);
    }

    #[test]
    fn truncated_reply_is_rejected() {
        let mut tid = 0;
        let request = Discover::identity_request(&mut tid).expect("Must compose");
        let mut reply = reply_for(&request, 4.0, 1);
        reply.truncate(30);

        let from: SocketAddr = "10.0.0.2:52362".parse().unwrap();
        assert!(Discover::identify(&request, &reply, from).is_err());
    }
}
