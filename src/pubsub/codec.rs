use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use tokio_util::bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::{Error, Reason};

/// One scalar published on a named topic.
#[derive(Clone, Debug, PartialEq)]
pub struct Float32Message {
    pub topic: String,
    pub value: f32,
}

/// Datagram layout: `[topic length: u8][topic: UTF-8][value: f32 big-endian]`.
#[derive(Debug, Default)]
pub struct Float32Codec;

impl Decoder for Float32Codec {
    type Item = Float32Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        // A datagram is always consumed whole, even when it does not parse.
        let datagram = src.split_to(src.len());
        let mut rdr = Cursor::new(datagram.as_ref());
        let malformed = |_| Error::InvalidData(Reason::MalformedMessage);

        let topic_len = rdr.read_u8().map_err(malformed)? as usize;
        let topic = datagram
            .get(1..1 + topic_len)
            .ok_or(Error::InvalidData(Reason::MalformedMessage))?;
        let topic = std::str::from_utf8(topic)
            .map_err(|_| Error::InvalidData(Reason::MalformedMessage))?
            .to_string();

        rdr.set_position((1 + topic_len) as u64);
        let value = rdr.read_f32::<BigEndian>().map_err(malformed)?;

        if rdr.position() as usize != datagram.len() {
            return Err(Error::InvalidData(Reason::MalformedMessage));
        }

        Ok(Some(Float32Message { topic, value }))
    }
}

impl Encoder<Float32Message> for Float32Codec {
    type Error = Error;

    fn encode(&mut self, item: Float32Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let topic_len =
            u8::try_from(item.topic.len()).map_err(|_| Error::InvalidData(Reason::TopicTooLong))?;

        dst.reserve(1 + item.topic.len() + 4);
        dst.put_u8(topic_len);
        dst.put_slice(item.topic.as_bytes());
        dst.put_f32(item.value);
        Ok(())
    }
}
