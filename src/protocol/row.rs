use crate::constant::MAX_PAYLOAD_LEN;
use crate::error::{Error, Result};
use crate::protocol::command::ColumnTypeAndFlags;
use crate::protocol::primitive::*;
use crate::protocol::response::ErrPayloadBytes;
use crate::protocol::value::{NullBitmap, Value};

/// The payload part of a binary protocol row packet.
#[derive(Debug, Clone)]
pub struct BinaryRowPayload<'a> {
    null_bitmap: NullBitmap<'a>,
    values: &'a [u8],
    num_columns: usize,
}

impl<'a> BinaryRowPayload<'a> {
    pub fn null_bitmap(&self) -> NullBitmap<'a> {
        self.null_bitmap
    }

    pub fn values(&self) -> &'a [u8] {
        self.values
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Decode every column of the row
    pub fn decode(&self, columns: &[ColumnTypeAndFlags]) -> Result<Vec<Value<'a>>> {
        if columns.len() != self.num_columns {
            return Err(Error::InvalidPacket);
        }
        let mut out = Vec::with_capacity(self.num_columns);
        let mut data = self.values;
        for (i, column) in columns.iter().enumerate() {
            if self.null_bitmap.is_null(i) {
                out.push(Value::Null);
                continue;
            }
            let (value, rest) = Value::parse(column, data)?;
            out.push(value);
            data = rest;
        }
        Ok(out)
    }
}

/// A packet read while a result set is streaming
#[derive(Debug, Clone, Copy)]
pub enum RowPacket<'a> {
    Row(&'a [u8]),
    /// EOF, or the OK packet that replaces it under CLIENT_DEPRECATE_EOF
    End(&'a [u8]),
    Err(ErrPayloadBytes<'a>),
}

/// Classify a packet inside a result set
///
/// Binary rows start with 0x00, so the generic OK classification cannot be used here.
pub fn classify_row(payload: &[u8]) -> Result<RowPacket<'_>> {
    match payload.first() {
        None => Err(Error::InvalidPacket),
        Some(0xFE) if payload.len() < MAX_PAYLOAD_LEN => Ok(RowPacket::End(payload)),
        Some(0xFF) => Ok(RowPacket::Err(ErrPayloadBytes(payload))),
        Some(_) => Ok(RowPacket::Row(payload)),
    }
}

/// Read a binary protocol row packet
pub fn read_binary_row(payload: &[u8], num_columns: usize) -> Result<BinaryRowPayload<'_>> {
    let (header, data) = read_int_1(payload)?;
    if header != 0x00 {
        return Err(Error::InvalidPacket);
    }

    // NULL bitmap: (num_columns + 7 + 2) / 8 bytes
    let null_bitmap_len = (num_columns + 7 + 2) >> 3;
    let (null_bitmap, values) = read_string_fix(data, null_bitmap_len)?;

    Ok(BinaryRowPayload {
        null_bitmap: NullBitmap::for_result_set(null_bitmap),
        values,
        num_columns,
    })
}
