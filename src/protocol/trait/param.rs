use std::rc::Rc;
use std::sync::Arc;

use zerocopy::IntoBytes;

use crate::bind::{BindType, InputBind};

/// A value that can be bound to a single `?` of a prepared statement
///
/// Fixed-width values are bound by reference to their own bytes; strings and byte strings
/// by reference to their contents. Nothing is copied until the driver encodes the packet.
///
/// There is no NULL parameter. Raw pointers are not parameters:
///
/// ```compile_fail
/// fn assert_param<T: typed_mysql::Param>() {}
/// assert_param::<*const u8>();
/// ```
pub trait Param {
    const BIND_TYPE: BindType;
    const IS_UNSIGNED: bool = false;

    fn bind(&self) -> InputBind<'_>;
}

macro_rules! impl_param_fixed {
    ($($ty:ty => $bind:ident, $unsigned:literal;)*) => {
        $(
            impl Param for $ty {
                const BIND_TYPE: BindType = BindType::$bind;
                const IS_UNSIGNED: bool = $unsigned;

                fn bind(&self) -> InputBind<'_> {
                    InputBind::borrowed(Self::BIND_TYPE, Self::IS_UNSIGNED, self.as_bytes())
                }
            }
        )*
    };
}

impl_param_fixed! {
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

impl Param for str {
    const BIND_TYPE: BindType = BindType::String;

    fn bind(&self) -> InputBind<'_> {
        InputBind::borrowed(BindType::String, false, self.as_bytes())
    }
}

impl Param for String {
    const BIND_TYPE: BindType = BindType::String;

    fn bind(&self) -> InputBind<'_> {
        self.as_str().bind()
    }
}

impl Param for [u8] {
    const BIND_TYPE: BindType = BindType::String;

    fn bind(&self) -> InputBind<'_> {
        InputBind::borrowed(BindType::String, false, self)
    }
}

impl Param for Vec<u8> {
    const BIND_TYPE: BindType = BindType::String;

    fn bind(&self) -> InputBind<'_> {
        self.as_slice().bind()
    }
}

impl<T: Param + ?Sized> Param for &T {
    const BIND_TYPE: BindType = T::BIND_TYPE;
    const IS_UNSIGNED: bool = T::IS_UNSIGNED;

    fn bind(&self) -> InputBind<'_> {
        (**self).bind()
    }
}

impl<T: Param + ?Sized> Param for Box<T> {
    const BIND_TYPE: BindType = T::BIND_TYPE;
    const IS_UNSIGNED: bool = T::IS_UNSIGNED;

    fn bind(&self) -> InputBind<'_> {
        (**self).bind()
    }
}

impl<T: Param + ?Sized> Param for Rc<T> {
    const BIND_TYPE: BindType = T::BIND_TYPE;
    const IS_UNSIGNED: bool = T::IS_UNSIGNED;

    fn bind(&self) -> InputBind<'_> {
        (**self).bind()
    }
}

impl<T: Param + ?Sized> Param for Arc<T> {
    const BIND_TYPE: BindType = T::BIND_TYPE;
    const IS_UNSIGNED: bool = T::IS_UNSIGNED;

    fn bind(&self) -> InputBind<'_> {
        (**self).bind()
    }
}
