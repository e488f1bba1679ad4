use crate::bind::InputBind;
use crate::protocol::r#trait::param::Param;

/// Positional parameter list of a prepared statement
///
/// Implemented for `()`, tuples of up to 16 [`Param`]s, and arrays, slices and vectors of one
/// [`Param`] type.
pub trait Params {
    /// Number of parameters
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one descriptor per parameter, in order
    fn push_binds<'a>(&'a self, out: &mut Vec<InputBind<'a>>);
}

/// Build the descriptor array for `params`
///
/// The descriptors borrow from `params`, which must outlive the bind call.
pub fn bind_params<P: Params + ?Sized>(params: &P) -> Vec<InputBind<'_>> {
    let mut out = Vec::with_capacity(params.len());
    params.push_binds(&mut out);
    out
}

impl Params for () {
    fn len(&self) -> usize {
        0
    }

    fn push_binds<'a>(&'a self, _out: &mut Vec<InputBind<'a>>) {}
}

impl<P: Params + ?Sized> Params for &P {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn push_binds<'a>(&'a self, out: &mut Vec<InputBind<'a>>) {
        (**self).push_binds(out)
    }
}

impl<T: Param> Params for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn push_binds<'a>(&'a self, out: &mut Vec<InputBind<'a>>) {
        out.extend(self.iter().map(Param::bind));
    }
}

impl<T: Param, const N: usize> Params for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn push_binds<'a>(&'a self, out: &mut Vec<InputBind<'a>>) {
        self.as_slice().push_binds(out)
    }
}

impl<T: Param> Params for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn push_binds<'a>(&'a self, out: &mut Vec<InputBind<'a>>) {
        self.as_slice().push_binds(out)
    }
}

macro_rules! impl_params_for_tuple {
    ($len:expr; $($idx:tt $T:ident),+) => {
        impl<$($T: Param),+> Params for ($($T,)+) {
            fn len(&self) -> usize {
                $len
            }

            fn push_binds<'a>(&'a self, out: &mut Vec<InputBind<'a>>) {
                $(out.push(self.$idx.bind());)+
            }
        }
    };
}

impl_params_for_tuple!(1; 0 A);
impl_params_for_tuple!(2; 0 A, 1 B);
impl_params_for_tuple!(3; 0 A, 1 B, 2 C);
impl_params_for_tuple!(4; 0 A, 1 B, 2 C, 3 D);
impl_params_for_tuple!(5; 0 A, 1 B, 2 C, 3 D, 4 E);
impl_params_for_tuple!(6; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_params_for_tuple!(7; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_params_for_tuple!(8; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
impl_params_for_tuple!(9; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I);
impl_params_for_tuple!(10; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J);
impl_params_for_tuple!(11; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K);
impl_params_for_tuple!(12; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L);
impl_params_for_tuple!(13; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M);
impl_params_for_tuple!(14; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N);
impl_params_for_tuple!(15; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N, 14 O);
impl_params_for_tuple!(16; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L, 12 M, 13 N, 14 O, 15 P);
