use crate::constant::{ColumnFlags, ColumnType};
use crate::error::{Error, Result, eyre};
use crate::protocol::primitive::*;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Represents a payload part of a column definition packet
#[derive(Debug, Clone, Copy)]
pub struct ColumnDefinitionBytes<'a>(pub &'a [u8]);

impl<'a> ColumnDefinitionBytes<'a> {
    /// Get a reference to the fixed-size tail of the column definition
    ///
    /// The tail is always the last 12 bytes of the column definition packet
    pub fn tail(&self) -> Result<&'a ColumnDefinitionTail> {
        let start = self.0.len().checked_sub(12).ok_or(Error::UnexpectedEof)?;
        let tail_bytes = self.0.get(start..).ok_or(Error::UnexpectedEof)?;
        ColumnDefinitionTail::ref_from_bytes(tail_bytes).map_err(Error::from_debug)
    }

    /// Column alias as seen by the client (`SELECT x AS alias`)
    pub fn name(&self) -> Result<&'a [u8]> {
        let (_catalog, data) = read_string_lenenc(self.0)?;
        let (_schema, data) = read_string_lenenc(data)?;
        let (_table_alias, data) = read_string_lenenc(data)?;
        let (_table_original, data) = read_string_lenenc(data)?;
        let (name_alias, _data) = read_string_lenenc(data)?;
        Ok(name_alias)
    }
}

/// Fixed-size tail of Column Definition packet (12 bytes)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct ColumnDefinitionTail {
    charset: U16LE,
    column_length: U32LE,
    column_type: u8,
    flags: U16LE,
    decimals: u8,
    reserved: U16LE,
}

impl ColumnDefinitionTail {
    pub fn charset(&self) -> u16 {
        self.charset.get()
    }

    pub fn column_length(&self) -> u32 {
        self.column_length.get()
    }

    pub fn column_type(&self) -> Result<ColumnType> {
        ColumnType::from_u8(self.column_type).ok_or_else(|| {
            Error::LibraryBug(eyre!("unknown column type: 0x{:02X}", self.column_type))
        })
    }

    pub fn flags(&self) -> ColumnFlags {
        ColumnFlags::from_bits_truncate(self.flags.get())
    }
}

/// What a binary row decoder needs to know about one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTypeAndFlags {
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
}

impl ColumnTypeAndFlags {
    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED_FLAG)
    }
}

impl TryFrom<ColumnDefinitionBytes<'_>> for ColumnTypeAndFlags {
    type Error = Error;

    fn try_from(bytes: ColumnDefinitionBytes<'_>) -> Result<Self> {
        let tail = bytes.tail()?;
        Ok(Self {
            column_type: tail.column_type()?,
            flags: tail.flags(),
        })
    }
}
