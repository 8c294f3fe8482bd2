//! Fixed-layout datagram exchanged with the loopback relay.
//!
//! ```text
//! 0      44     88     132          196              424
//! | src  | dst  | rsv  | control    | payload ...     |
//! ```
//!
//! Each address block stores the address length at byte 4 and the ASCII
//! address from byte 8. The control region holds the source port, the
//! destination port and the payload length, all big-endian `u16`.

use crate::common::SmsPort;

pub const MAX_PACKET_SIZE: usize = 424;
pub const ADDRESS_BLOCK_SIZE: usize = 44;
pub const HEADER_SIZE: usize = ADDRESS_BLOCK_SIZE * 3 + 64;
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

const ADDRESS_LENGTH_INDEX: usize = 4;
const ADDRESS_START_INDEX: usize = 8;
pub const MAX_ADDRESS_LENGTH: usize = ADDRESS_BLOCK_SIZE - ADDRESS_START_INDEX;

const SOURCE_OFFSET: usize = 0;
const DESTINATION_OFFSET: usize = ADDRESS_BLOCK_SIZE;
const CONTROL_OFFSET: usize = ADDRESS_BLOCK_SIZE * 3;
const SOURCE_PORT_OFFSET: usize = CONTROL_OFFSET;
const DESTINATION_PORT_OFFSET: usize = CONTROL_OFFSET + 2;
const PAYLOAD_LENGTH_OFFSET: usize = CONTROL_OFFSET + 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("address `{0}` is longer than {max} bytes", max = MAX_ADDRESS_LENGTH)]
    AddressTooLong(String),
    #[error("payload of {0} bytes exceeds the {max} byte limit", max = MAX_PAYLOAD_SIZE)]
    PayloadTooLarge(usize),
    #[error("datagram of {0} bytes is shorter than the {header} byte header", header = HEADER_SIZE)]
    Truncated(usize),
    #[error("{field} length {length} does not fit the datagram")]
    BadLength { field: &'static str, length: usize },
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

/// Decoded form of a relay datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsDatagram {
    pub source: String,
    pub destination: String,
    pub source_port: SmsPort,
    pub destination_port: SmsPort,
    pub payload: String,
}

impl SmsDatagram {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let payload = self.payload.as_bytes();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(CodecError::PayloadTooLarge(payload.len()));
        }

        let mut data = vec![0u8; HEADER_SIZE + payload.len()];
        write_address(&mut data[SOURCE_OFFSET..DESTINATION_OFFSET], &self.source)?;
        write_address(
            &mut data[DESTINATION_OFFSET..DESTINATION_OFFSET + ADDRESS_BLOCK_SIZE],
            &self.destination,
        )?;
        write_u16(&mut data, SOURCE_PORT_OFFSET, self.source_port.number());
        write_u16(&mut data, DESTINATION_PORT_OFFSET, self.destination_port.number());
        // Bounded by MAX_PAYLOAD_SIZE above.
        write_u16(&mut data, PAYLOAD_LENGTH_OFFSET, payload.len() as u16);
        data[HEADER_SIZE..].copy_from_slice(payload);

        Ok(data)
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < HEADER_SIZE {
            return Err(CodecError::Truncated(data.len()));
        }

        let source = read_address(&data[SOURCE_OFFSET..DESTINATION_OFFSET], "source")?;
        let destination = read_address(
            &data[DESTINATION_OFFSET..DESTINATION_OFFSET + ADDRESS_BLOCK_SIZE],
            "destination",
        )?;

        let payload_length = read_u16(data, PAYLOAD_LENGTH_OFFSET) as usize;
        if payload_length > MAX_PAYLOAD_SIZE || HEADER_SIZE + payload_length > data.len() {
            return Err(CodecError::BadLength {
                field: "payload",
                length: payload_length,
            });
        }
        let payload = std::str::from_utf8(&data[HEADER_SIZE..HEADER_SIZE + payload_length])
            .map_err(|_| CodecError::InvalidUtf8("payload"))?
            .to_string();

        Ok(Self {
            source,
            destination,
            source_port: SmsPort::from_number(read_u16(data, SOURCE_PORT_OFFSET)),
            destination_port: SmsPort::from_number(read_u16(data, DESTINATION_PORT_OFFSET)),
            payload,
        })
    }
}

/// Swap the source and destination blocks and ports of an encoded datagram.
pub fn swap_endpoints(data: &mut [u8]) -> Result<(), CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::Truncated(data.len()));
    }

    let (source, rest) = data.split_at_mut(DESTINATION_OFFSET);
    source.swap_with_slice(&mut rest[..ADDRESS_BLOCK_SIZE]);

    let source_port = read_u16(data, SOURCE_PORT_OFFSET);
    let destination_port = read_u16(data, DESTINATION_PORT_OFFSET);
    write_u16(data, SOURCE_PORT_OFFSET, destination_port);
    write_u16(data, DESTINATION_PORT_OFFSET, source_port);
    Ok(())
}

fn write_address(block: &mut [u8], address: &str) -> Result<(), CodecError> {
    let bytes = address.as_bytes();
    if bytes.len() > MAX_ADDRESS_LENGTH {
        return Err(CodecError::AddressTooLong(address.to_string()));
    }
    block[ADDRESS_LENGTH_INDEX] = bytes.len() as u8;
    block[ADDRESS_START_INDEX..ADDRESS_START_INDEX + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn read_address(block: &[u8], field: &'static str) -> Result<String, CodecError> {
    let length = block[ADDRESS_LENGTH_INDEX] as usize;
    if length > MAX_ADDRESS_LENGTH {
        return Err(CodecError::BadLength { field, length });
    }
    std::str::from_utf8(&block[ADDRESS_START_INDEX..ADDRESS_START_INDEX + length])
        .map(str::to_string)
        .map_err(|_| CodecError::InvalidUtf8(field))
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}
