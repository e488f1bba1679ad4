use std::rc::Rc;
use std::sync::Arc;

use std::fmt::Debug;

use crate::bind::{BindType, DEFAULT_STRING_CAPACITY, OutputBind};
use crate::constant::ColumnFlags;
use crate::error::Error;
use crate::protocol::command::ColumnTypeAndFlags;
use crate::protocol::command::prepared::write_execute;
use crate::protocol::convert::store;
use crate::protocol::value::Value;
use crate::protocol::r#trait::{FromColumn, FromRow, Param, Params, bind_params};

fn filled(bind_type: BindType, unsigned: bool, bytes: &[u8]) -> OutputBind {
    let mut bind = OutputBind::new(bind_type, unsigned);
    bind.grow(bytes.len());
    bind.buffer[..bytes.len()].copy_from_slice(bytes);
    bind.length = bytes.len();
    bind
}

fn null(bind_type: BindType) -> OutputBind {
    let mut bind = OutputBind::new(bind_type, false);
    bind.is_null = true;
    bind
}

#[test]
fn test_param_i32() {
    let param: i32 = -42;
    let bind = param.bind();
    assert_eq!(bind.bind_type, BindType::Long);
    assert!(!bind.is_unsigned);
    assert_eq!(&*bind.buffer, &(-42i32).to_ne_bytes());
}

#[test]
fn test_param_u64() {
    let param: u64 = 12345678901234;
    let bind = param.bind();
    assert_eq!(bind.bind_type, BindType::LongLong);
    assert!(bind.is_unsigned);
    assert_eq!(&*bind.buffer, &12345678901234u64.to_ne_bytes());
}

#[test]
fn test_param_widths_match_tags() {
    let params = (1i8, 2u16, 3i32, 4u64, 5.0f32, 6.0f64);
    let binds = bind_params(&params);
    for bind in &binds {
        assert_eq!(Some(bind.len()), bind.bind_type.width());
    }
    assert_eq!(
        binds.iter().map(|b| b.bind_type).collect::<Vec<_>>(),
        vec![
            BindType::Tiny,
            BindType::Short,
            BindType::Long,
            BindType::LongLong,
            BindType::Float,
            BindType::Double
        ]
    );
}

#[test]
fn test_param_str() {
    let bind = "hello".bind();
    assert_eq!(bind.bind_type, BindType::String);
    assert_eq!(bind.len(), 5);
    assert_eq!(&*bind.buffer, b"hello");
}

#[test]
fn test_param_string_variants() {
    let owned = String::from("owned");
    let boxed: Box<str> = "boxed".into();
    let shared: Arc<str> = "shared".into();
    let counted: Rc<String> = Rc::new("counted".to_string());
    let params = (&owned, &&owned, boxed, shared, counted);
    let binds = bind_params(&params);
    let values: Vec<&[u8]> = binds.iter().map(|b| &*b.buffer).collect();
    assert_eq!(
        values,
        vec![
            &b"owned"[..],
            &b"owned"[..],
            &b"boxed"[..],
            &b"shared"[..],
            &b"counted"[..]
        ]
    );
}

#[test]
fn test_param_bytes() {
    let blob = vec![0xDE, 0xAD, 0xBE, 0xEF];
    let params = (blob.as_slice(), &blob);
    let binds = bind_params(&params);
    assert!(binds.iter().all(|b| b.bind_type == BindType::String));
    assert!(binds.iter().all(|b| *b.buffer == blob[..]));
}

#[test]
fn test_params_tuple_keeps_order() {
    let params = (42i32, "a@example.com", 30u8);
    assert_eq!(params.len(), 3);
    let binds = bind_params(&params);
    assert_eq!(binds[0].bind_type, BindType::Long);
    assert_eq!(&*binds[1].buffer, b"a@example.com");
    assert_eq!(binds[2].bind_type, BindType::Tiny);
    assert!(binds[2].is_unsigned);
}

#[test]
fn test_params_empty_and_collections() {
    assert!(().is_empty());
    assert!(bind_params(&()).is_empty());
    assert_eq!([1i64, 2, 3].len(), 3);
    assert_eq!(vec!["a", "b"].len(), 2);
    assert_eq!(bind_params(&[7u32; 4][..]).len(), 4);
}

#[test]
fn test_params_sixteen() {
    let params = (
        0i32, 1i32, 2i32, 3i32, 4i32, 5i32, 6i32, 7i32, 8i32, 9i32, 10i32, 11i32, 12i32, 13i32,
        14i32, 15i32,
    );
    let binds = bind_params(&params);
    assert_eq!(binds.len(), 16);
    assert_eq!(&*binds[15].buffer, &15i32.to_ne_bytes());
}

#[test]
fn test_column_fixed_width_allocation() {
    assert_eq!(i8::output_bind().capacity(), 1);
    assert_eq!(u16::output_bind().capacity(), 2);
    assert_eq!(f32::output_bind().capacity(), 4);
    assert_eq!(u64::output_bind().capacity(), 8);
    assert!(u64::output_bind().is_unsigned);
    assert_eq!(String::output_bind().capacity(), DEFAULT_STRING_CAPACITY);
    assert_eq!(Option::<i16>::output_bind().bind_type, BindType::Short);
}

#[test]
fn test_column_decode_numbers() {
    let bind = filled(BindType::Long, false, &(-7i32).to_ne_bytes());
    assert_eq!(i32::from_bind(0, &bind).unwrap(), -7);
    let bind = filled(BindType::Double, false, &2.5f64.to_ne_bytes());
    assert_eq!(f64::from_bind(0, &bind).unwrap(), 2.5);
}

#[test]
fn test_column_short_buffer_is_decode_error() {
    let bind = filled(BindType::LongLong, false, &[1, 2]);
    assert!(matches!(
        i64::from_buffer(4, bind.value()),
        Err(Error::Decode { column: 4, .. })
    ));
}

#[test]
fn test_column_string_uses_reported_length() {
    let mut bind = filled(BindType::String, false, b"hello world");
    bind.length = 5;
    assert_eq!(String::from_bind(0, &bind).unwrap(), "hello");
}

#[test]
fn test_column_invalid_utf8() {
    let bind = filled(BindType::String, false, &[0x66, 0xFF, 0x6F]);
    assert!(matches!(
        String::from_bind(2, &bind),
        Err(Error::Decode { column: 2, .. })
    ));
    assert_eq!(Vec::<u8>::from_bind(2, &bind).unwrap(), vec![0x66, 0xFF, 0x6F]);
}

#[test]
fn test_column_null_handling() {
    let bind = null(BindType::Long);
    assert_eq!(Option::<i32>::from_bind(0, &bind).unwrap(), None);
    match i32::from_bind(3, &bind) {
        Err(Error::UnexpectedNull { column, type_name }) => {
            assert_eq!(column, 3);
            assert_eq!(type_name, "i32");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(Box::<i32>::from_bind(0, &bind).is_err());
}

#[test]
fn test_column_owning_wrappers() {
    let bind = filled(BindType::String, false, b"shared");
    assert_eq!(*Arc::<String>::from_bind(0, &bind).unwrap(), "shared");
    assert_eq!(*Rc::<String>::from_bind(0, &bind).unwrap(), "shared");
    assert_eq!(*Box::<String>::from_bind(0, &bind).unwrap(), "shared");
}

#[test]
fn test_row_tuple() {
    assert_eq!(<(i32, String, Option<u8>)>::ARITY, 3);
    let binds = vec![
        filled(BindType::Long, false, &1i32.to_ne_bytes()),
        filled(BindType::String, false, b"a@example.com"),
        null(BindType::Tiny),
    ];
    let row = <(i32, String, Option<u8>)>::from_binds(&binds).unwrap();
    assert_eq!(row, (1, "a@example.com".to_string(), None));
}

#[test]
fn test_row_tuple_wrong_length() {
    let binds = vec![filled(BindType::Long, false, &1i32.to_ne_bytes())];
    assert!(matches!(
        <(i32, i32)>::from_binds(&binds),
        Err(Error::ColumnCountMismatch {
            expected: 1,
            actual: 2
        })
    ));
}

/// Encode `value` as a COM_STMT_EXECUTE parameter, parse the wire bytes back as a column of
/// the same type and decode them through an output bind
fn wire_round_trip<T: Param + FromColumn>(value: &T) -> T {
    let bind = value.bind();
    let width = bind.bind_type.width().unwrap();
    let mut packet = Vec::new();
    write_execute(&mut packet, 1, std::slice::from_ref(&bind)).unwrap();
    let wire = &packet[packet.len() - width..];

    let column = ColumnTypeAndFlags {
        column_type: bind.bind_type.column_type(),
        flags: if bind.is_unsigned {
            ColumnFlags::UNSIGNED_FLAG
        } else {
            ColumnFlags::empty()
        },
    };
    let (parsed, rest) = Value::parse(&column, wire).unwrap();
    assert!(rest.is_empty());

    let mut out = T::output_bind();
    assert!(!store(&parsed, &mut out, 0));
    T::from_bind(0, &out).unwrap()
}

fn assert_round_trips<T>(values: &[T])
where
    T: Param + FromColumn + PartialEq + Debug,
{
    for value in values {
        assert_eq!(&wire_round_trip(value), value);
    }
}

#[test]
fn test_scalars_round_trip_through_wire() {
    assert_round_trips(&[0i8, -1, i8::MIN, i8::MAX]);
    assert_round_trips(&[0u8, u8::MAX]);
    assert_round_trips(&[0i16, -1, i16::MIN, i16::MAX]);
    assert_round_trips(&[0u16, u16::MAX]);
    assert_round_trips(&[0i32, -1, i32::MIN, i32::MAX]);
    assert_round_trips(&[0u32, u32::MAX]);
    assert_round_trips(&[0i64, -1, i64::MIN, i64::MAX]);
    assert_round_trips(&[0u64, u64::MAX]);
    assert_round_trips(&[0.0f32, -1.5, f32::MIN, f32::MAX]);
    assert_round_trips(&[0.0f64, -1.5, f64::MIN, f64::MAX]);
}
