use crate::constant::{MAX_PAYLOAD_LEN, ServerStatusFlags};
use crate::error::{Error, Result};
use crate::protocol::primitive::*;

/// Payload of an OK packet (header 0x00, or 0xFE when it replaces EOF)
#[derive(Debug, Clone, Copy)]
pub struct OkPayloadBytes<'a>(pub &'a [u8]);

impl<'a> OkPayloadBytes<'a> {
    pub fn bytes(&self) -> &'a [u8] {
        self.0
    }
}

/// Payload of an ERR packet (header 0xFF)
#[derive(Debug, Clone, Copy)]
pub struct ErrPayloadBytes<'a>(pub &'a [u8]);

/// Classification of a generic response payload
#[derive(Debug, Clone, Copy)]
pub enum Response<'a> {
    Ok(OkPayloadBytes<'a>),
    Err(ErrPayloadBytes<'a>),
    /// Anything else: a result set header, a row, or command-specific data
    Other(&'a [u8]),
}

/// Classify a payload by its first byte
///
/// With CLIENT_DEPRECATE_EOF the terminating packet of a result set is an OK packet
/// with header 0xFE, so a 0xFE payload shorter than a full packet is treated as OK.
pub fn classify(payload: &[u8]) -> Result<Response<'_>> {
    match payload.first() {
        None => Err(Error::InvalidPacket),
        Some(0x00) => Ok(Response::Ok(OkPayloadBytes(payload))),
        Some(0xFE) if payload.len() < MAX_PAYLOAD_LEN => Ok(Response::Ok(OkPayloadBytes(payload))),
        Some(0xFF) => Ok(Response::Err(ErrPayloadBytes(payload))),
        Some(_) => Ok(Response::Other(payload)),
    }
}

/// OK packet response
#[derive(Debug, Clone)]
pub struct OkPayload {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: ServerStatusFlags,
    pub warnings: u16,
}

impl TryFrom<OkPayloadBytes<'_>> for OkPayload {
    type Error = Error;

    fn try_from(bytes: OkPayloadBytes<'_>) -> Result<Self> {
        let (header, data) = read_int_1(bytes.bytes())?;
        if header != 0x00 && header != 0xFE {
            return Err(Error::InvalidPacket);
        }

        let (affected_rows, rest) = read_int_lenenc(data)?;
        let (last_insert_id, rest) = read_int_lenenc(rest)?;
        let (status_flags, rest) = read_int_2(rest)?;
        let (warnings, _info) = read_int_2(rest)?;

        Ok(OkPayload {
            affected_rows,
            last_insert_id,
            status_flags: ServerStatusFlags::from_bits_truncate(status_flags),
            warnings,
        })
    }
}

/// Server status carried by the packet that ends a result set
///
/// A classic EOF packet is exactly 5 bytes; with CLIENT_DEPRECATE_EOF it is an OK packet.
pub fn read_eof_status(payload: &[u8]) -> Result<ServerStatusFlags> {
    if payload.len() == 5 {
        let (header, data) = read_int_1(payload)?;
        if header != 0xFE {
            return Err(Error::InvalidPacket);
        }
        let (_warnings, data) = read_int_2(data)?;
        let (status_flags, _) = read_int_2(data)?;
        return Ok(ServerStatusFlags::from_bits_truncate(status_flags));
    }
    Ok(OkPayload::try_from(OkPayloadBytes(payload))?.status_flags)
}

/// ERR packet response
#[derive(Debug, Clone, thiserror::Error)]
#[error("ERROR {} ({}): {}", self.error_code, self.sql_state, self.message)]
pub struct ErrPayload {
    pub error_code: u16,
    pub sql_state: String,
    pub message: String,
}

impl TryFrom<ErrPayloadBytes<'_>> for ErrPayload {
    type Error = Error;

    fn try_from(bytes: ErrPayloadBytes<'_>) -> Result<Self> {
        let (header, data) = read_int_1(bytes.0)?;
        if header != 0xFF {
            return Err(Error::InvalidPacket);
        }

        let (error_code, data) = read_int_2(data)?;

        // SQL state is present when preceded by the '#' marker
        let (sql_state, rest) = match data.split_first() {
            Some((b'#', rest)) => {
                let (state, rest) = read_string_fix(rest, 5)?;
                (String::from_utf8_lossy(state).into_owned(), rest)
            }
            _ => (String::new(), data),
        };

        Ok(ErrPayload {
            error_code,
            sql_state,
            message: String::from_utf8_lossy(rest).into_owned(),
        })
    }
}
