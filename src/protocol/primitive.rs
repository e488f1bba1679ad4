//! Fixed-width, length-encoded and null-terminated wire primitives.

use crate::error::{Error, Result};
use zerocopy::FromBytes;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE, U64 as U64LE};

/// Split `len` bytes off the front of `data`
fn split(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if data.len() < len {
        return Err(Error::UnexpectedEof);
    }
    Ok(data.split_at(len))
}

pub fn read_int_1(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((first, rest)) => Ok((*first, rest)),
        None => Err(Error::UnexpectedEof),
    }
}

pub fn read_int_2(data: &[u8]) -> Result<(u16, &[u8])> {
    let (value, rest) = U16LE::read_from_prefix(data).map_err(|_| Error::UnexpectedEof)?;
    Ok((value.get(), rest))
}

pub fn read_int_3(data: &[u8]) -> Result<(u32, &[u8])> {
    let (bytes, rest) = split(data, 3)?;
    Ok((u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]), rest))
}

pub fn read_int_4(data: &[u8]) -> Result<(u32, &[u8])> {
    let (value, rest) = U32LE::read_from_prefix(data).map_err(|_| Error::UnexpectedEof)?;
    Ok((value.get(), rest))
}

pub fn read_int_8(data: &[u8]) -> Result<(u64, &[u8])> {
    let (value, rest) = U64LE::read_from_prefix(data).map_err(|_| Error::UnexpectedEof)?;
    Ok((value.get(), rest))
}

/// Read length-encoded integer
pub fn read_int_lenenc(data: &[u8]) -> Result<(u64, &[u8])> {
    let (first, rest) = read_int_1(data)?;
    match first {
        0xFC => {
            let (val, rest) = read_int_2(rest)?;
            Ok((val as u64, rest))
        }
        0xFD => {
            let (val, rest) = read_int_3(rest)?;
            Ok((val as u64, rest))
        }
        0xFE => read_int_8(rest),
        // 0xFB is NULL in text rows and 0xFF starts an ERR packet; neither is a length
        0xFB | 0xFF => Err(Error::InvalidPacket),
        val => Ok((val as u64, rest)),
    }
}

pub fn read_string_fix(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    split(data, len)
}

pub fn read_string_null(data: &[u8]) -> Result<(&[u8], &[u8])> {
    match data.iter().position(|&byte| byte == 0) {
        Some(i) => Ok((&data[..i], &data[i + 1..])),
        None => Err(Error::UnexpectedEof),
    }
}

pub fn read_string_lenenc(data: &[u8]) -> Result<(&[u8], &[u8])> {
    let (len, rest) = read_int_lenenc(data)?;
    split(rest, len as usize)
}

pub fn write_int_1(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn write_int_2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_int_3(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

pub fn write_int_4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_int_8(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_int_lenenc(out: &mut Vec<u8>, value: u64) {
    if value < 251 {
        out.push(value as u8);
    } else if value < (1 << 16) {
        out.push(0xfc);
        write_int_2(out, value as u16);
    } else if value < (1 << 24) {
        out.push(0xfd);
        write_int_3(out, value as u32);
    } else {
        out.push(0xfe);
        write_int_8(out, value);
    }
}

pub fn write_string_null(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

pub fn write_bytes_lenenc(out: &mut Vec<u8>, data: &[u8]) {
    write_int_lenenc(out, data.len() as u64);
    out.extend_from_slice(data);
}
