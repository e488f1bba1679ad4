//! Conversion of a received binary value into the representation an output bind asked for.
//!
//! Mirrors the classic client library: integers and floats are cast, text is parsed for
//! numeric binds, and any value can be read as text. A conversion that loses data still
//! stores the nearest value but raises the bind's error flag.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::bind::{BindType, OutputBind};
use crate::protocol::value::{Time, Timestamp, Value};

/// Bytes to store for one column and whether producing them lost data
#[derive(Debug)]
pub struct Converted<'a> {
    pub bytes: Cow<'a, [u8]>,
    pub lossy: bool,
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i128),
    Float(f64),
}

/// Convert `value` for a bind of `bind_type`; `None` for NULL
pub fn convert<'a>(value: &Value<'a>, bind_type: BindType, is_unsigned: bool) -> Option<Converted<'a>> {
    if let Value::Null = value {
        return None;
    }
    Some(match bind_type {
        BindType::String => Converted {
            bytes: to_text(value),
            lossy: false,
        },
        BindType::Float => {
            let (number, lossy) = to_number(value);
            let (v, narrowed) = match number {
                Number::Int(i) => (i as f32, false),
                Number::Float(f) => {
                    let v = f as f32;
                    (v, f.is_finite() && v.is_infinite())
                }
            };
            Converted {
                bytes: Cow::Owned(v.to_ne_bytes().to_vec()),
                lossy: lossy || narrowed,
            }
        }
        BindType::Double => {
            let (number, lossy) = to_number(value);
            let v = match number {
                Number::Int(i) => i as f64,
                Number::Float(f) => f,
            };
            Converted {
                bytes: Cow::Owned(v.to_ne_bytes().to_vec()),
                lossy,
            }
        }
        BindType::Tiny | BindType::Short | BindType::Long | BindType::LongLong => {
            let width = bind_type.width().unwrap_or(8);
            let (number, lossy) = to_number(value);
            let (v, clamped) = to_integer(number, width, is_unsigned);
            Converted {
                bytes: Cow::Owned(integer_bytes(v, width)),
                lossy: lossy || clamped,
            }
        }
    })
}

/// Store the converted `value` into `bind` starting at byte `offset` of the value
///
/// Returns true when the bind could not hold the whole value or the conversion lost data.
pub fn store(value: &Value<'_>, bind: &mut OutputBind, offset: usize) -> bool {
    let Some(converted) = convert(value, bind.bind_type, bind.is_unsigned) else {
        bind.is_null = true;
        bind.length = 0;
        bind.error = false;
        return false;
    };

    let bytes = converted.bytes.as_ref();
    bind.is_null = false;
    bind.length = bytes.len();
    bind.error = converted.lossy;

    let tail = bytes.get(offset..).unwrap_or_default();
    let window = bind.window_mut();
    let n = tail.len().min(window.len());
    window[..n].copy_from_slice(&tail[..n]);

    converted.lossy || bytes.len() > bind.capacity()
}

fn to_number(value: &Value<'_>) -> (Number, bool) {
    match *value {
        Value::Null => (Number::Int(0), false),
        Value::SignedInt(v) => (Number::Int(v as i128), false),
        Value::UnsignedInt(v) => (Number::Int(v as i128), false),
        Value::Float(v) => (Number::Float(v as f64), false),
        Value::Double(v) => (Number::Float(v), false),
        Value::Timestamp(ts) => {
            let date = ts.year as i128 * 10_000 + ts.month as i128 * 100 + ts.day as i128;
            if ts.date_only {
                return (Number::Int(date), false);
            }
            let whole = date * 1_000_000
                + ts.hour as i128 * 10_000
                + ts.minute as i128 * 100
                + ts.second as i128;
            with_micros(whole, ts.microsecond)
        }
        Value::Time(t) => {
            let whole = t.total_hours() as i128 * 10_000 + t.minute as i128 * 100 + t.second as i128;
            let (number, lossy) = with_micros(whole, t.microsecond);
            let number = match (t.is_negative, number) {
                (false, n) => n,
                (true, Number::Int(i)) => Number::Int(-i),
                (true, Number::Float(f)) => Number::Float(-f),
            };
            (number, lossy)
        }
        Value::Byte(bytes) => parse_number(bytes),
    }
}

fn with_micros(whole: i128, microsecond: u32) -> (Number, bool) {
    if microsecond == 0 {
        (Number::Int(whole), false)
    } else {
        (Number::Float(whole as f64 + microsecond as f64 / 1e6), false)
    }
}

fn parse_number(bytes: &[u8]) -> (Number, bool) {
    let Ok(text) = simdutf8::basic::from_utf8(bytes) else {
        return (Number::Int(0), true);
    };
    let text = text.trim();
    if let Ok(i) = text.parse::<i128>() {
        return (Number::Int(i), false);
    }
    match text.parse::<f64>() {
        Ok(f) => (Number::Float(f), false),
        Err(_) => (Number::Int(0), true),
    }
}

/// Fit `number` into an integer of `width` bytes, clamping when out of range
fn to_integer(number: Number, width: usize, is_unsigned: bool) -> (i128, bool) {
    let (v, mut lossy) = match number {
        Number::Int(i) => (i, false),
        Number::Float(f) if f.is_nan() => (0, true),
        Number::Float(f) => {
            let t = f.trunc();
            (t as i128, t != f)
        }
    };
    let bits = width as u32 * 8;
    let (min, max) = if is_unsigned {
        (0, (1i128 << bits) - 1)
    } else {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    };
    if v < min || v > max {
        lossy = true;
    }
    (v.clamp(min, max), lossy)
}

fn integer_bytes(v: i128, width: usize) -> Vec<u8> {
    match width {
        1 => (v as u8).to_ne_bytes().to_vec(),
        2 => (v as u16).to_ne_bytes().to_vec(),
        4 => (v as u32).to_ne_bytes().to_vec(),
        _ => (v as u64).to_ne_bytes().to_vec(),
    }
}

fn to_text<'a>(value: &Value<'a>) -> Cow<'a, [u8]> {
    match *value {
        Value::Byte(bytes) => Cow::Borrowed(bytes),
        Value::Null => Cow::Borrowed(&[]),
        Value::SignedInt(v) => Cow::Owned(v.to_string().into_bytes()),
        Value::UnsignedInt(v) => Cow::Owned(v.to_string().into_bytes()),
        Value::Float(v) => Cow::Owned(v.to_string().into_bytes()),
        Value::Double(v) => Cow::Owned(v.to_string().into_bytes()),
        Value::Timestamp(ts) => Cow::Owned(format_timestamp(&ts).into_bytes()),
        Value::Time(t) => Cow::Owned(format_time(&t).into_bytes()),
    }
}

/// `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS[.ffffff]`
pub fn format_timestamp(ts: &Timestamp) -> String {
    let mut out = format!("{:04}-{:02}-{:02}", ts.year, ts.month, ts.day);
    if !ts.date_only {
        let _ = write!(out, " {:02}:{:02}:{:02}", ts.hour, ts.minute, ts.second);
        if ts.microsecond != 0 {
            let _ = write!(out, ".{:06}", ts.microsecond);
        }
    }
    out
}

/// `[-]HH:MM:SS[.ffffff]` with hours beyond 24 folded in
pub fn format_time(t: &Time) -> String {
    let sign = if t.is_negative { "-" } else { "" };
    let mut out = format!(
        "{sign}{:02}:{:02}:{:02}",
        t.total_hours(),
        t.minute,
        t.second
    );
    if t.microsecond != 0 {
        let _ = write!(out, ".{:06}", t.microsecond);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::DEFAULT_STRING_CAPACITY;

    fn stored(value: Value<'_>, bind_type: BindType, is_unsigned: bool) -> (OutputBind, bool) {
        let mut bind = OutputBind::new(bind_type, is_unsigned);
        let truncated = store(&value, &mut bind, 0);
        (bind, truncated)
    }

    #[test]
    fn integer_to_matching_bind() {
        let (bind, truncated) = stored(Value::SignedInt(-5), BindType::Long, false);
        assert!(!truncated);
        assert_eq!(bind.value(), (-5i32).to_ne_bytes());
    }

    #[test]
    fn out_of_range_integer_is_clamped_and_flagged() {
        let (bind, truncated) = stored(Value::SignedInt(300), BindType::Tiny, false);
        assert!(truncated);
        assert!(bind.error);
        assert_eq!(bind.value(), 127i8.to_ne_bytes());

        let (bind, truncated) = stored(Value::SignedInt(-1), BindType::LongLong, true);
        assert!(truncated);
        assert_eq!(bind.value(), 0u64.to_ne_bytes());
    }

    #[test]
    fn decimal_text_to_integer_and_double() {
        let (bind, truncated) = stored(Value::Byte(b"42"), BindType::Long, false);
        assert!(!truncated);
        assert_eq!(bind.value(), 42i32.to_ne_bytes());

        let (bind, truncated) = stored(Value::Byte(b"12.50"), BindType::Double, false);
        assert!(!truncated);
        assert_eq!(bind.value(), 12.5f64.to_ne_bytes());

        let (_, truncated) = stored(Value::Byte(b"12.50"), BindType::Long, false);
        assert!(truncated);

        let (bind, truncated) = stored(Value::Byte(b"not a number"), BindType::Long, false);
        assert!(truncated);
        assert_eq!(bind.value(), 0i32.to_ne_bytes());
    }

    #[test]
    fn any_value_as_text() {
        let (bind, _) = stored(Value::UnsignedInt(18446744073709551615), BindType::String, false);
        assert_eq!(bind.value(), b"18446744073709551615");

        let (bind, _) = stored(Value::Double(1.5), BindType::String, false);
        assert_eq!(bind.value(), b"1.5");
    }

    #[test]
    fn long_text_reports_truncation() {
        let text = "x".repeat(200);
        let (bind, truncated) = stored(Value::Byte(text.as_bytes()), BindType::String, false);
        assert!(truncated);
        assert!(!bind.error);
        assert_eq!(bind.length, 200);
        assert_eq!(bind.value(), &text.as_bytes()[..DEFAULT_STRING_CAPACITY]);
    }

    #[test]
    fn tail_is_stored_at_window() {
        let text: Vec<u8> = (0..50u8).collect();
        let mut bind = OutputBind::new(BindType::String, false);
        store(&Value::Byte(&text), &mut bind, 0);
        bind.grow(51);
        bind.offset = DEFAULT_STRING_CAPACITY;
        let truncated = store(&Value::Byte(&text), &mut bind, DEFAULT_STRING_CAPACITY);
        assert!(!truncated);
        bind.offset = 0;
        assert_eq!(bind.value(), text.as_slice());
    }

    #[test]
    fn null_sets_flag() {
        let (bind, truncated) = stored(Value::Null, BindType::String, false);
        assert!(bind.is_null);
        assert!(!truncated);
    }

    #[test]
    fn temporal_values() {
        let ts = Timestamp {
            year: 2024,
            month: 3,
            day: 5,
            hour: 7,
            minute: 8,
            second: 9,
            microsecond: 0,
            date_only: false,
        };
        let (bind, _) = stored(Value::Timestamp(ts), BindType::String, false);
        assert_eq!(bind.value(), b"2024-03-05 07:08:09");

        let (bind, truncated) = stored(Value::Timestamp(ts), BindType::LongLong, false);
        assert!(!truncated);
        assert_eq!(bind.value(), 20240305070809i64.to_ne_bytes());

        let date = Timestamp {
            date_only: true,
            ..ts
        };
        assert_eq!(format_timestamp(&date), "2024-03-05");

        let t = Time {
            is_negative: true,
            days: 1,
            hour: 2,
            minute: 3,
            second: 4,
            microsecond: 500,
        };
        assert_eq!(format_time(&t), "-26:03:04.000500");
    }
}
