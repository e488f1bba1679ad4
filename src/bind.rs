//! Bind descriptors exchanged between the typed layer and a [`StmtDriver`](crate::driver::StmtDriver).
//!
//! An [`InputBind`] describes one statement parameter, an [`OutputBind`] one result column.
//! Fixed-width values are carried in native byte order; the wire driver converts them.

use std::borrow::Cow;

use crate::constant::ColumnType;

/// Initial capacity of an output buffer bound to a string or byte column
pub const DEFAULT_STRING_CAPACITY: usize = 20;

/// Wire type tag of a bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindType {
    Tiny,
    Short,
    Long,
    LongLong,
    Float,
    Double,
    String,
}

impl BindType {
    /// Width in bytes of a fixed-width type, `None` for strings
    pub const fn width(self) -> Option<usize> {
        match self {
            BindType::Tiny => Some(1),
            BindType::Short => Some(2),
            BindType::Long => Some(4),
            BindType::LongLong => Some(8),
            BindType::Float => Some(4),
            BindType::Double => Some(8),
            BindType::String => None,
        }
    }

    pub const fn column_type(self) -> ColumnType {
        match self {
            BindType::Tiny => ColumnType::MYSQL_TYPE_TINY,
            BindType::Short => ColumnType::MYSQL_TYPE_SHORT,
            BindType::Long => ColumnType::MYSQL_TYPE_LONG,
            BindType::LongLong => ColumnType::MYSQL_TYPE_LONGLONG,
            BindType::Float => ColumnType::MYSQL_TYPE_FLOAT,
            BindType::Double => ColumnType::MYSQL_TYPE_DOUBLE,
            BindType::String => ColumnType::MYSQL_TYPE_STRING,
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            BindType::Tiny | BindType::Short | BindType::Long | BindType::LongLong
        )
    }
}

/// Parameter descriptor
///
/// `buffer` borrows the caller's value for the duration of a bind call.
#[derive(Debug, Clone)]
pub struct InputBind<'a> {
    pub bind_type: BindType,
    pub is_unsigned: bool,
    pub buffer: Cow<'a, [u8]>,
}

impl<'a> InputBind<'a> {
    pub fn borrowed(bind_type: BindType, is_unsigned: bool, buffer: &'a [u8]) -> Self {
        Self {
            bind_type,
            is_unsigned,
            buffer: Cow::Borrowed(buffer),
        }
    }

    pub fn owned(bind_type: BindType, is_unsigned: bool, buffer: Vec<u8>) -> Self {
        Self {
            bind_type,
            is_unsigned,
            buffer: Cow::Owned(buffer),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Result column descriptor
///
/// The driver writes into `buffer[offset..]`. `length` always receives the full length of the
/// value, which may exceed the buffer capacity; the caller then grows the buffer and asks for
/// the remainder with `fetch_column`.
#[derive(Debug, Clone)]
pub struct OutputBind {
    pub bind_type: BindType,
    pub is_unsigned: bool,
    pub buffer: Vec<u8>,
    pub offset: usize,
    pub length: usize,
    pub is_null: bool,
    pub error: bool,
}

impl OutputBind {
    pub fn new(bind_type: BindType, is_unsigned: bool) -> Self {
        let capacity = bind_type.width().unwrap_or(DEFAULT_STRING_CAPACITY);
        Self {
            bind_type,
            is_unsigned,
            buffer: vec![0; capacity],
            offset: 0,
            length: 0,
            is_null: false,
            error: false,
        }
    }

    /// Number of bytes the buffer can hold
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the last fetch reported more bytes than the buffer holds
    pub fn is_truncated(&self) -> bool {
        !self.is_null && self.length > self.capacity()
    }

    /// Bytes of the fetched value, bounded by the buffer
    pub fn value(&self) -> &[u8] {
        &self.buffer[..self.length.min(self.buffer.len())]
    }

    /// Window the driver writes into
    pub fn window_mut(&mut self) -> &mut [u8] {
        let start = self.offset.min(self.buffer.len());
        &mut self.buffer[start..]
    }

    pub(crate) fn grow(&mut self, capacity: usize) {
        if capacity > self.buffer.len() {
            self.buffer.resize(capacity, 0);
        }
    }
}
