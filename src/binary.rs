//! Little-endian integer, float and C-string codec
//!
//! Every multi-byte value is written byte by byte in little-endian order so
//! files are portable regardless of host endianness.

use std::io::{self, Read, Write};

use crate::consts::MAX_STRING;

pub fn put_index<W: Write>(w: &mut W, val: i32) -> io::Result<()> {
    w.write_all(&val.to_le_bytes())
}

pub fn get_index<R: Read>(r: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub fn put_short<W: Write>(w: &mut W, val: u16) -> io::Result<()> {
    w.write_all(&val.to_le_bytes())
}

pub fn get_short<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn put_float<W: Write>(w: &mut W, val: f32) -> io::Result<()> {
    w.write_all(&val.to_bits().to_le_bytes())
}

pub fn get_float<R: Read>(r: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_bits(u32::from_le_bytes(buf)))
}

/// Longest prefix of `s` that fits in a [`MAX_STRING`] buffer with its NUL,
/// cut on a char boundary. Interior NULs end the string.
pub fn clamp_string(s: &str) -> &str {
    let s = s.split('\0').next().unwrap_or_default();
    if s.len() < MAX_STRING {
        return s;
    }
    let mut end = MAX_STRING - 1;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Write a NUL-terminated string, truncated to fit [`MAX_STRING`]
pub fn put_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    w.write_all(clamp_string(s).as_bytes())?;
    w.write_all(&[0])
}

/// Read a NUL-terminated string.
///
/// Bytes past `MAX_STRING - 1` are consumed but dropped. Hitting end of file
/// before the terminator is an `UnexpectedEof` error.
pub fn get_string<R: Read>(r: &mut R) -> io::Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        r.read_exact(&mut byte)?;
        if byte[0] == 0 {
            break;
        }
        if bytes.len() < MAX_STRING - 1 {
            bytes.push(byte[0]);
        }
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(err) => {
            // Truncation by a foreign writer may have split a char
            let bytes = err.into_bytes();
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}
