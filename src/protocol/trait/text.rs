//! Textual fallback for types with no native wire tag.
//!
//! A value is sent as its `Display` rendering in a `String` bind and read back with `FromStr`.

use std::fmt::Display;
use std::str::FromStr;

use crate::bind::{BindType, InputBind};
use crate::error::{Error, Result};
use crate::protocol::r#trait::column::FromColumn;
use crate::protocol::r#trait::param::Param;

/// Carries `T` over the wire as text
///
/// ```
/// use typed_mysql::Text;
/// use std::net::Ipv4Addr;
///
/// let addr = Text(Ipv4Addr::new(10, 0, 0, 1));
/// assert_eq!(addr.0.to_string(), "10.0.0.1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Text<T>(pub T);

impl<T> Text<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

pub(crate) fn bind_display<T: Display + ?Sized>(value: &T) -> InputBind<'static> {
    InputBind::owned(BindType::String, false, value.to_string().into_bytes())
}

pub(crate) fn parse_text<T>(column: usize, bytes: &[u8]) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let text = String::from_buffer(column, bytes)?;
    text.parse::<T>().map_err(|e| Error::Decode {
        column,
        message: format!(
            "cannot parse {:?} as {}: {}",
            text,
            std::any::type_name::<T>(),
            e
        ),
    })
}

impl<T: Display> Param for Text<T> {
    const BIND_TYPE: BindType = BindType::String;

    fn bind(&self) -> InputBind<'_> {
        bind_display(&self.0)
    }
}

impl<T> FromColumn for Text<T>
where
    T: FromStr,
    T::Err: Display,
{
    const BIND_TYPE: BindType = BindType::String;

    fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self> {
        parse_text(column, bytes).map(Text)
    }
}

#[cfg(any(
    feature = "with-uuid",
    feature = "with-rust-decimal",
    feature = "with-chrono"
))]
macro_rules! impl_textual {
    ($($ty:ty),*) => {
        $(
            impl Param for $ty {
                const BIND_TYPE: BindType = BindType::String;

                fn bind(&self) -> InputBind<'_> {
                    bind_display(self)
                }
            }

            impl FromColumn for $ty {
                const BIND_TYPE: BindType = BindType::String;

                fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self> {
                    parse_text(column, bytes)
                }
            }
        )*
    };
}

#[cfg(feature = "with-uuid")]
impl_textual!(uuid::Uuid);

#[cfg(feature = "with-rust-decimal")]
impl_textual!(rust_decimal::Decimal);

#[cfg(feature = "with-chrono")]
impl_textual!(chrono::NaiveDate, chrono::NaiveTime);

// The server renders DATETIME with a space separator, which `FromStr` rejects.
#[cfg(feature = "with-chrono")]
impl Param for chrono::NaiveDateTime {
    const BIND_TYPE: BindType = BindType::String;

    fn bind(&self) -> InputBind<'_> {
        bind_display(&self.format("%Y-%m-%d %H:%M:%S%.f"))
    }
}

#[cfg(feature = "with-chrono")]
impl FromColumn for chrono::NaiveDateTime {
    const BIND_TYPE: BindType = BindType::String;

    fn from_buffer(column: usize, bytes: &[u8]) -> Result<Self> {
        let text = String::from_buffer(column, bytes)?;
        chrono::NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S"))
            .map_err(|e| Error::Decode {
                column,
                message: format!("cannot parse {:?} as NaiveDateTime: {}", text, e),
            })
    }
}
