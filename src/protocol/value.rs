/// MySQL Binary Protocol Value Types
use crate::constant::ColumnType;
use crate::error::{Error, Result, eyre};
use crate::protocol::command::ColumnTypeAndFlags;
use crate::protocol::primitive::*;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

#[derive(Debug, Clone, Copy)]
pub enum Value<'a> {
    /// NULL value
    Null,
    /// Signed integer (TINYINT, SMALLINT, INT, BIGINT)
    SignedInt(i64),
    /// Unsigned integer (TINYINT UNSIGNED, SMALLINT UNSIGNED, INT UNSIGNED, BIGINT UNSIGNED)
    UnsignedInt(u64),
    /// FLOAT - 4-byte floating point
    Float(f32),
    /// DOUBLE - 8-byte floating point
    Double(f64),
    /// DATE/DATETIME/TIMESTAMP
    Timestamp(Timestamp),
    /// TIME
    Time(Time),
    /// BLOB, GEOMETRY, STRING, VARCHAR, DECIMAL, JSON, ..
    Byte(&'a [u8]),
}

impl<'a> Value<'a> {
    /// Parse a single binary protocol value based on column type and flags
    ///
    /// Returns the parsed value and the remaining bytes
    pub fn parse(column: &ColumnTypeAndFlags, data: &'a [u8]) -> Result<(Self, &'a [u8])> {
        let is_unsigned = column.is_unsigned();

        match column.column_type {
            ColumnType::MYSQL_TYPE_NULL => Ok((Value::Null, data)),

            ColumnType::MYSQL_TYPE_TINY => {
                let (val, rest) = read_int_1(data)?;
                let value = if is_unsigned {
                    Value::UnsignedInt(val as u64)
                } else {
                    Value::SignedInt(val as i8 as i64)
                };
                Ok((value, rest))
            }

            ColumnType::MYSQL_TYPE_SHORT | ColumnType::MYSQL_TYPE_YEAR => {
                let (val, rest) = read_int_2(data)?;
                let value = if is_unsigned {
                    Value::UnsignedInt(val as u64)
                } else {
                    Value::SignedInt(val as i16 as i64)
                };
                Ok((value, rest))
            }

            ColumnType::MYSQL_TYPE_INT24 | ColumnType::MYSQL_TYPE_LONG => {
                let (val, rest) = read_int_4(data)?;
                let value = if is_unsigned {
                    Value::UnsignedInt(val as u64)
                } else {
                    Value::SignedInt(val as i32 as i64)
                };
                Ok((value, rest))
            }

            ColumnType::MYSQL_TYPE_LONGLONG => {
                let (val, rest) = read_int_8(data)?;
                let value = if is_unsigned {
                    Value::UnsignedInt(val)
                } else {
                    Value::SignedInt(val as i64)
                };
                Ok((value, rest))
            }

            ColumnType::MYSQL_TYPE_FLOAT => {
                let (val, rest) = read_int_4(data)?;
                Ok((Value::Float(f32::from_bits(val)), rest))
            }

            ColumnType::MYSQL_TYPE_DOUBLE => {
                let (val, rest) = read_int_8(data)?;
                Ok((Value::Double(f64::from_bits(val)), rest))
            }

            ColumnType::MYSQL_TYPE_DATE
            | ColumnType::MYSQL_TYPE_DATETIME
            | ColumnType::MYSQL_TYPE_TIMESTAMP
            | ColumnType::MYSQL_TYPE_TIMESTAMP2
            | ColumnType::MYSQL_TYPE_DATETIME2
            | ColumnType::MYSQL_TYPE_NEWDATE => {
                let date_only = matches!(
                    column.column_type,
                    ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
                );
                let (ts, rest) = read_timestamp(data)?;
                Ok((Value::Timestamp(Timestamp { date_only, ..ts }), rest))
            }

            ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => {
                let (time, rest) = read_time(data)?;
                Ok((Value::Time(time), rest))
            }

            ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_STRING
            | ColumnType::MYSQL_TYPE_BLOB
            | ColumnType::MYSQL_TYPE_TINY_BLOB
            | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
            | ColumnType::MYSQL_TYPE_LONG_BLOB
            | ColumnType::MYSQL_TYPE_GEOMETRY
            | ColumnType::MYSQL_TYPE_JSON
            | ColumnType::MYSQL_TYPE_DECIMAL
            | ColumnType::MYSQL_TYPE_NEWDECIMAL
            | ColumnType::MYSQL_TYPE_ENUM
            | ColumnType::MYSQL_TYPE_SET
            | ColumnType::MYSQL_TYPE_BIT
            | ColumnType::MYSQL_TYPE_VECTOR
            | ColumnType::MYSQL_TYPE_TYPED_ARRAY => {
                let (bytes, rest) = read_string_lenenc(data)?;
                Ok((Value::Byte(bytes), rest))
            }
        }
    }
}

// ============================================================================
// Temporal Types
// ============================================================================

/// DATE/DATETIME/TIMESTAMP value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
    /// DATE columns carry no time of day
    pub date_only: bool,
}

/// TIME value; hours beyond a day are carried in `days`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Time {
    pub is_negative: bool,
    pub days: u32,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
}

impl Time {
    pub fn total_hours(&self) -> u64 {
        self.days as u64 * 24 + self.hour as u64
    }
}

/// TIMESTAMP - 4 bytes (ymd)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
struct Timestamp4 {
    year: U16LE,
    month: u8,
    day: u8,
}

/// TIMESTAMP - 7 bytes (ymd + hms)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
struct Timestamp7 {
    date: Timestamp4,
    hour: u8,
    minute: u8,
    second: u8,
}

/// TIMESTAMP - 11 bytes (ymd + hms + microseconds)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
struct Timestamp11 {
    datetime: Timestamp7,
    microsecond: U32LE,
}

/// TIME - 8 bytes
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
struct Time8 {
    is_negative: u8,
    days: U32LE,
    hour: u8,
    minute: u8,
    second: u8,
}

/// TIME - 12 bytes
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
struct Time12 {
    time: Time8,
    microsecond: U32LE,
}

fn read_timestamp(data: &[u8]) -> Result<(Timestamp, &[u8])> {
    let (len, rest) = read_int_1(data)?;
    let (body, rest) = read_string_fix(rest, len as usize)?;
    let ts = match len {
        0 => Timestamp::default(),
        4 => {
            let d = Timestamp4::ref_from_bytes(body).map_err(Error::from_debug)?;
            Timestamp {
                year: d.year.get(),
                month: d.month,
                day: d.day,
                ..Timestamp::default()
            }
        }
        7 | 11 => {
            let (dt, us) = if len == 7 {
                (
                    *Timestamp7::ref_from_bytes(body).map_err(Error::from_debug)?,
                    0,
                )
            } else {
                let ts = Timestamp11::ref_from_bytes(body).map_err(Error::from_debug)?;
                (ts.datetime, ts.microsecond.get())
            };
            Timestamp {
                year: dt.date.year.get(),
                month: dt.date.month,
                day: dt.date.day,
                hour: dt.hour,
                minute: dt.minute,
                second: dt.second,
                microsecond: us,
                date_only: false,
            }
        }
        _ => {
            return Err(Error::LibraryBug(eyre!(
                "invalid timestamp length: {}",
                len
            )));
        }
    };
    Ok((ts, rest))
}

fn read_time(data: &[u8]) -> Result<(Time, &[u8])> {
    let (len, rest) = read_int_1(data)?;
    let (body, rest) = read_string_fix(rest, len as usize)?;
    let (t, us) = match len {
        0 => return Ok((Time::default(), rest)),
        8 => (*Time8::ref_from_bytes(body).map_err(Error::from_debug)?, 0),
        12 => {
            let t = Time12::ref_from_bytes(body).map_err(Error::from_debug)?;
            (t.time, t.microsecond.get())
        }
        _ => return Err(Error::LibraryBug(eyre!("invalid time length: {}", len))),
    };
    Ok((
        Time {
            is_negative: t.is_negative != 0,
            days: t.days.get(),
            hour: t.hour,
            minute: t.minute,
            second: t.second,
            microsecond: us,
        },
        rest,
    ))
}

// ============================================================================
// NULL Bitmap
// ============================================================================

/// NULL bitmap of a binary protocol row
///
/// Result set rows reserve the first 2 bits, so column `i` lives at bit `i + 2`.
#[derive(Debug, Clone, Copy)]
pub struct NullBitmap<'a> {
    bitmap: &'a [u8],
}

impl<'a> NullBitmap<'a> {
    pub fn for_result_set(bitmap: &'a [u8]) -> Self {
        Self { bitmap }
    }

    pub fn is_null(&self, idx: usize) -> bool {
        let bit_pos = idx + 2;
        let byte_pos = bit_pos >> 3;
        let bit_offset = bit_pos & 7;

        if byte_pos >= self.bitmap.len() {
            return false;
        }

        (self.bitmap[byte_pos] & (1 << bit_offset)) != 0
    }
}
