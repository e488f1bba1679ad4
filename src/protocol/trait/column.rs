use std::rc::Rc;
use std::sync::Arc;

use zerocopy::FromBytes;

use crate::bind::{BindType, OutputBind};
use crate::error::{Error, Result};

/// A type that one result column can be decoded into
///
/// The output buffer is allocated from `BIND_TYPE`: fixed-width types get exactly their width,
/// strings and byte strings start small and grow on truncation.
///
/// Decoding NULL fails unless the type overrides [`FromColumn::from_null`], as `Option<T>` does.
/// Raw pointers cannot be decoded into:
///
/// ```compile_fail
/// fn assert_column<T: typed_mysql::FromColumn>() {}
/// assert_column::<*mut u8>();
/// ```
pub trait FromColumn: Sized {
    const BIND_TYPE: BindType;
    const IS_UNSIGNED: bool = false;

    /// Value for a NULL column
    fn from_null(column: usize) -> Result<Self> {
        Err(Error::UnexpectedNull {
            column,
            type_name: std::any::type_name::<Self>(),
        })
    }

    /// Value from the fetched bytes of a non-NULL column
    fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self>;

    fn output_bind() -> OutputBind {
        OutputBind::new(Self::BIND_TYPE, Self::IS_UNSIGNED)
    }

    fn from_bind(column: usize, bind: &OutputBind) -> Result<Self> {
        if bind.is_null {
            Self::from_null(column)
        } else {
            Self::from_buffer(column, bind.value())
        }
    }
}

macro_rules! impl_from_column_fixed {
    ($($ty:ty => $bind:ident, $unsigned:literal;)*) => {
        $(
            impl FromColumn for $ty {
                const BIND_TYPE: BindType = BindType::$bind;
                const IS_UNSIGNED: bool = $unsigned;

                fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self> {
                    <$ty>::read_from_prefix(bytes)
                        .map(|(value, _rest)| value)
                        .map_err(|_| Error::Decode {
                            column,
                            message: format!(
                                "expected {} bytes for {}, got {}",
                                size_of::<$ty>(),
                                stringify!($ty),
                                bytes.len()
                            ),
                        })
                }
            }
        )*
    };
}

impl_from_column_fixed! {
    i8 => Tiny, false;
    u8 => Tiny, true;
    i16 => Short, false;
    u16 => Short, true;
    i32 => Long, false;
    u32 => Long, true;
    i64 => LongLong, false;
    u64 => LongLong, true;
    f32 => Float, false;
    f64 => Double, false;
}

impl FromColumn for String {
    const BIND_TYPE: BindType = BindType::String;

    fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self> {
        simdutf8::basic::from_utf8(bytes)
            .map(ToString::to_string)
            .map_err(|_| Error::Decode {
                column,
                message: "invalid UTF-8 in string column".to_string(),
            })
    }
}

impl FromColumn for Vec<u8> {
    const BIND_TYPE: BindType = BindType::String;

    fn from_buffer(_column: usize, bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    const BIND_TYPE: BindType = T::BIND_TYPE;
    const IS_UNSIGNED: bool = T::IS_UNSIGNED;

    fn from_null(_column: usize) -> Result<Self> {
        Ok(None)
    }

    fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self> {
        T::from_buffer(column, bytes).map(Some)
    }
}

macro_rules! impl_from_column_owning {
    ($($wrapper:ident),*) => {
        $(
            impl<T: FromColumn> FromColumn for $wrapper<T> {
                const BIND_TYPE: BindType = T::BIND_TYPE;
                const IS_UNSIGNED: bool = T::IS_UNSIGNED;

                fn from_null(column: usize) -> Result<Self> {
                    T::from_null(column).map($wrapper::new)
                }

                fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self> {
                    T::from_buffer(column, bytes).map($wrapper::new)
                }
            }
        )*
    };
}

impl_from_column_owning!(Box, Rc, Arc);
