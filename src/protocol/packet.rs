use std::io::{BufRead, Write};

use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::constant::MAX_PAYLOAD_LEN;
use crate::error::{Error, Result, eyre};

/// MySQL packet header (zero-copy)
///
/// Layout matches MySQL wire protocol:
/// - length: 3 bytes (little-endian, payload length)
/// - sequence_id: 1 byte
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable, IntoBytes)]
pub struct PacketHeader {
    pub length: [u8; 3],
    pub sequence_id: u8,
}

impl PacketHeader {
    pub fn encode(length: usize, sequence_id: u8) -> Self {
        let len = u32::to_le_bytes(length as u32);
        Self {
            length: [len[0], len[1], len[2]],
            sequence_id,
        }
    }

    pub fn length(&self) -> usize {
        u32::from_le_bytes([self.length[0], self.length[1], self.length[2], 0]) as usize
    }
}

/// Read a complete MySQL payload, concatenating packets if they span multiple 16MB chunks
///
/// Returns the sequence_id of the last packet read.
#[tracing::instrument(skip_all)]
pub fn read_payload<R: BufRead>(reader: &mut R, buffer: &mut Vec<u8>) -> Result<u8> {
    buffer.clear();

    let mut header = PacketHeader::new_zeroed();
    loop {
        reader.read_exact(header.as_mut_bytes())?;
        let length = header.length();

        let start = buffer.len();
        buffer.resize(start + length, 0);
        reader.read_exact(&mut buffer[start..])?;

        if length < MAX_PAYLOAD_LEN {
            return Ok(header.sequence_id);
        }
    }
}

/// Write the payload held in `packet[4..]`, starting at `sequence_id`
///
/// The first 4 bytes of `packet` are reserved for the header (see `BufferSet::new_write_buffer`).
/// Payloads of 16MB or more are split, and an exact multiple of 16MB is terminated with an empty packet.
/// Returns the sequence_id of the last packet written.
#[tracing::instrument(skip_all)]
pub fn write_payload<W: Write>(writer: &mut W, sequence_id: u8, packet: &mut [u8]) -> Result<u8> {
    if packet.len() < 4 {
        return Err(Error::LibraryBug(eyre!(
            "write buffer is missing its header space: {} < 4",
            packet.len()
        )));
    }
    let payload_len = packet.len() - 4;

    if payload_len < MAX_PAYLOAD_LEN {
        packet[..4].copy_from_slice(PacketHeader::encode(payload_len, sequence_id).as_bytes());
        writer.write_all(packet)?;
        writer.flush()?;
        return Ok(sequence_id);
    }

    let mut sequence_id = sequence_id;
    for (i, chunk) in packet[4..].chunks(MAX_PAYLOAD_LEN).enumerate() {
        if i > 0 {
            sequence_id = sequence_id.wrapping_add(1);
        }
        writer.write_all(PacketHeader::encode(chunk.len(), sequence_id).as_bytes())?;
        writer.write_all(chunk)?;
    }
    if payload_len % MAX_PAYLOAD_LEN == 0 {
        sequence_id = sequence_id.wrapping_add(1);
        writer.write_all(PacketHeader::encode(0, sequence_id).as_bytes())?;
    }
    writer.flush()?;
    Ok(sequence_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_roundtrip() {
        let header = PacketHeader::encode(0x123456, 7);
        assert_eq!(header.as_bytes(), &[0x56, 0x34, 0x12, 7]);
        assert_eq!(header.length(), 0x123456);
    }

    #[test]
    fn write_then_read_small_payload() {
        let mut wire = Vec::new();
        let mut packet = vec![0u8; 4];
        packet.extend_from_slice(b"\x03SELECT 1");
        let seq = write_payload(&mut wire, 3, &mut packet).unwrap();
        assert_eq!(seq, 3);
        assert_eq!(&wire[..4], &[9, 0, 0, 3]);

        let mut buffer = Vec::new();
        let seq = read_payload(&mut Cursor::new(wire), &mut buffer).unwrap();
        assert_eq!(seq, 3);
        assert_eq!(buffer, b"\x03SELECT 1");
    }

    #[test]
    fn empty_payload_is_one_empty_packet() {
        let mut wire = Vec::new();
        write_payload(&mut wire, 0, &mut [0u8; 4]).unwrap();
        assert_eq!(wire, vec![0, 0, 0, 0]);
    }

    #[test]
    fn missing_header_space_is_a_bug() {
        let mut wire = Vec::new();
        assert!(matches!(
            write_payload(&mut wire, 0, &mut [1u8, 2]),
            Err(Error::LibraryBug(_))
        ));
    }
}
