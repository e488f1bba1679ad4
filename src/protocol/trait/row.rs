use crate::bind::OutputBind;
use crate::error::{Error, Result};
use crate::protocol::r#trait::column::FromColumn;

/// A fixed-arity row shape
///
/// Implemented for tuples of up to 16 [`FromColumn`] types and, through `#[derive(FromRow)]`,
/// for structs whose fields are bound to columns in declaration order.
pub trait FromRow: Sized {
    /// Number of columns the row shape consumes
    const ARITY: usize;

    /// One freshly allocated output descriptor per column
    fn output_binds() -> Vec<OutputBind>;

    /// Decode the fetched descriptors; `binds.len()` must equal `ARITY`
    fn from_binds(binds: &[OutputBind]) -> Result<Self>;
}

/// Fail unless exactly `arity` descriptors were fetched
pub fn check_arity(binds: &[OutputBind], arity: usize) -> Result<()> {
    if binds.len() == arity {
        Ok(())
    } else {
        Err(Error::ColumnCountMismatch {
            expected: binds.len(),
            actual: arity,
        })
    }
}

macro_rules! impl_from_row_for_tuple {
    ($len:expr; $($idx:tt $T:ident),+) => {
        impl<$($T: FromColumn),+> FromRow for ($($T,)+) {
            const ARITY: usize = $len;

            fn output_binds() -> Vec<OutputBind> {
                vec![$($T::output_bind()),+]
            }

            fn from_binds(binds: &[OutputBind]) -> Result<Self> {
                check_arity(binds, Self::ARITY)?;
                Ok(($($T::from_bind($idx, &binds[$idx])?,)+))
            }
        }
    };
}

impl_from_row_for_tuple!(1; 0 A);
impl_from_row_for_tuple!(2; 0 A, 1 B);
impl_from_row_for_tuple!(3; 0 A, 1 B, 2 C);
impl_from_row_for_tuple!(4; 0 A, 1 B, 2 C, 3 D);
impl_from_row_for_tuple!(5; 0 A, 1 B, 2 C, 3 D, 4 E);
impl_from_row_for_tuple!(6; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_from_row_for_tuple!(7; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_from_row_for_tuple!(8; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
impl_from_row_for_tuple!(9; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I);
impl_from_row_for_tuple!(10; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J);
impl_from_row_for_tuple!(11; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K);
impl_from_row_for_tuple!(12; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L);
impl_from_row_for_tuple!(13; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M);
impl_from_row_for_tuple!(14; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N);
impl_from_row_for_tuple!(15; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N, 14 O);
impl_from_row_for_tuple!(16; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N, 14 O, 15 P);
