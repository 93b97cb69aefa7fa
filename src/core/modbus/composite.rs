use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use enum_primitive::FromPrimitive;

use super::{
    Error, ExceptionCode, Quantity, ReadFunction, Reason, WriteFunction, MODBUS_HEADER_SIZE,
    MODBUS_MAX_PACKET_SIZE,
};

pub const MODBUS_PROTOCOL_TCP: u16 = 0x0000;

/// As referenced in the LabJack manual fields documentation for ModBus messages,
/// the UnitID field is not used (as bridging is not used). The suggested value is 1.
///
/// Referenced Documentation: [LabJack Modbus Protocol Details: Fields](https://support.labjack.com/docs/protocol-details-direct-modbus-tcp#ProtocolDetails[DirectModbusTCP]-Fields).
pub const BASE_UNIT_ID: u8 = 1;

/// Ephemeral structure created from a transport to compose messages. It only borrows
/// the parts of the transport that change from message to message, which is the
/// transaction id.
pub struct Compositor<'a> {
    pub transaction_id: &'a mut u16,
    pub unit_id: u8,
}

#[derive(Debug)]
pub struct ComposedMessage {
    pub content: Vec<u8>,

    pub(crate) header: Header,
    pub(crate) expected_bytes: usize,
}

/// The MBAP header on a given modbus message.
///
/// `length` counts every byte that follows it, the unit id included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub length: u16,
    pub unit_id: u8,
}

impl<'a> Compositor<'a> {
    pub fn new(transaction_id: &'a mut u16, unit_id: u8) -> Self {
        Self {
            transaction_id,
            unit_id,
        }
    }

    fn new_tid(&mut self) -> u16 {
        *self.transaction_id = self.transaction_id.wrapping_add(1);
        *self.transaction_id
    }

    pub fn compose_read(&mut self, function: &ReadFunction) -> Result<ComposedMessage, Error> {
        let ReadFunction::HoldingRegisters(addr, count) = *function;

        if count < 1 {
            return Err(Error::InvalidData(Reason::RecvBufferEmpty));
        }

        let expected_bytes = 2 * count as usize;
        if MODBUS_HEADER_SIZE + 2 + expected_bytes > MODBUS_MAX_PACKET_SIZE {
            return Err(Error::InvalidData(Reason::UnexpectedReplySize));
        }

        // Function code, starting address and register count.
        let header = Header::for_pdu(self, 5);
        let mut content = header.pack()?;

        content.write_u8(function.code())?;
        content.write_u16::<BigEndian>(addr)?;
        content.write_u16::<BigEndian>(count)?;

        Ok(ComposedMessage {
            content,
            header,
            expected_bytes,
        })
    }

    pub fn compose_write(&mut self, function: &WriteFunction) -> Result<ComposedMessage, Error> {
        let WriteFunction::MultipleRegisters(addr, bytes) = function;

        if bytes.is_empty() || bytes.len() % 2 != 0 {
            return Err(Error::InvalidData(Reason::TypeMismatch));
        }

        // Function code, address, quantity, byte count, then the payload.
        let pdu_len = 6 + bytes.len();
        if MODBUS_HEADER_SIZE + pdu_len > MODBUS_MAX_PACKET_SIZE {
            return Err(Error::InvalidData(Reason::SendBufferTooBig));
        }

        let header = Header::for_pdu(self, pdu_len as u16);
        let mut content = header.pack()?;

        content.write_u8(function.code())?;
        content.write_u16::<BigEndian>(*addr)?;
        content.write_u16::<BigEndian>((bytes.len() / 2) as Quantity)?;
        content.write_u8(bytes.len() as u8)?;
        content.extend_from_slice(bytes);

        Ok(ComposedMessage {
            content,
            header,
            expected_bytes: 0,
        })
    }
}

impl Header {
    fn for_pdu(compositor: &mut Compositor, pdu_len: u16) -> Header {
        Header {
            transaction_id: compositor.new_tid(),
            protocol_id: MODBUS_PROTOCOL_TCP,
            length: pdu_len + 1,
            unit_id: compositor.unit_id,
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>, Error> {
        let mut buff = Vec::with_capacity(MODBUS_HEADER_SIZE);
        buff.write_u16::<BigEndian>(self.transaction_id)?;
        buff.write_u16::<BigEndian>(self.protocol_id)?;
        buff.write_u16::<BigEndian>(self.length)?;
        buff.write_u8(self.unit_id)?;
        Ok(buff)
    }

    pub fn unpack(buff: &[u8]) -> Result<Header, Error> {
        let mut rdr = io::Cursor::new(buff);
        Ok(Header {
            transaction_id: rdr.read_u16::<BigEndian>()?,
            protocol_id: rdr.read_u16::<BigEndian>()?,
            length: rdr.read_u16::<BigEndian>()?,
            unit_id: rdr.read_u8()?,
        })
    }
}

pub fn validate_response_header(req: &Header, resp: &Header) -> Result<(), Error> {
    if req.transaction_id != resp.transaction_id || resp.protocol_id != MODBUS_PROTOCOL_TCP {
        Err(Error::InvalidResponse)
    } else {
        Ok(())
    }
}

pub fn validate_response_code(req: &[u8], res: &[u8]) -> Result<(), Error> {
    let req_code = *req.get(7).ok_or(Error::InvalidResponse)?;
    let res_code = *res.get(7).ok_or(Error::InvalidResponse)?;

    match res_code {
        code if code == req_code | 0x80 => {
            let exception = *res.get(8).ok_or(Error::InvalidResponse)?;
            match ExceptionCode::from_u8(exception) {
                Some(code) => Err(Error::Exception(code)),
                None => Err(Error::InvalidResponse),
            }
        }
        code if code == req_code => Ok(()),
        _ => Err(Error::InvalidResponse),
    }
}

/// Strips the header, function code and byte count from a read reply.
pub fn get_reply_data(reply: &[u8], expected_bytes: usize) -> Result<&[u8], Error> {
    let given_response_length = *reply
        .get(8)
        .ok_or(Error::InvalidData(Reason::UnexpectedReplySize))? as usize;
    let reply_length_does_not_match = reply.len() != MODBUS_HEADER_SIZE + expected_bytes + 2;

    if given_response_length != expected_bytes || reply_length_does_not_match {
        return Err(Error::InvalidData(Reason::UnexpectedReplySize));
    }

    reply
        .get(MODBUS_HEADER_SIZE + 2..)
        .ok_or(Error::InvalidData(Reason::UnexpectedReplySize))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_frame_layout() {
        let mut tid = 0;
        let message = Compositor::new(&mut tid, BASE_UNIT_ID)
            .compose_read(&ReadFunction::HoldingRegisters(55100, 2))
            .expect("Must compose");

        assert_eq!(
            message.content,
            vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0xD7, 0x3C, 0x00, 0x02]
        );
        assert_eq!(message.expected_bytes, 4);
        assert_eq!(tid, 1);
    }

    #[test]
    fn write_frame_layout() {
        let mut tid = 41;
        let payload = 2.5f32.to_be_bytes().to_vec();
        let message = Compositor::new(&mut tid, BASE_UNIT_ID)
            .compose_write(&WriteFunction::MultipleRegisters(1000, payload))
            .expect("Must compose");

        assert_eq!(
            message.content,
            vec![
                0x00, 0x2A, 0x00, 0x00, 0x00, 0x0B, 0x01, 0x10, 0x03, 0xE8, 0x00, 0x02, 0x04, 0x40,
                0x20, 0x00, 0x00
            ]
        );
        assert_eq!(message.header.length as usize, message.content.len() - 6);
    }

    #[test]
    fn transaction_id_wraps() {
        let mut tid = u16::MAX;
        let message = Compositor::new(&mut tid, BASE_UNIT_ID)
            .compose_read(&ReadFunction::HoldingRegisters(0, 1))
            .expect("Must compose");
        assert_eq!(message.header.transaction_id, 0);
    }

    #[test]
    fn empty_read_is_rejected() {
        let mut tid = 0;
        let result =
            Compositor::new(&mut tid, BASE_UNIT_ID).compose_read(&ReadFunction::HoldingRegisters(0, 0));
        assert!(matches!(
            result,
            Err(Error::InvalidData(Reason::RecvBufferEmpty))
        ));
    }

    #[test]
    fn exception_reply_is_decoded() {
        let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x02];
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, 0x83, 0x02];

        let result = validate_response_code(&request, &reply);
        assert!(
            matches!(result, Err(Error::Exception(ExceptionCode::IllegalDataAddress))),
            "result={result:?}"
        );
    }

    #[test]
    fn mismatched_transaction_is_rejected() {
        let req = Header {
            transaction_id: 4,
            protocol_id: 0,
            length: 6,
            unit_id: 1,
        };
        let resp = Header {
            transaction_id: 5,
            ..req
        };
        assert!(validate_response_header(&req, &resp).is_err());
    }

    #[test]
    fn reply_data_checks_byte_count() {
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x07, 0x01, 0x03, 0x04, 0x00, 0x11, 0x22, 0x33];
        assert_eq!(
            get_reply_data(&reply, 4).expect("Must extract"),
            &[0x00, 0x11, 0x22, 0x33]
        );
        assert!(get_reply_data(&reply, 2).is_err());
    }
}
