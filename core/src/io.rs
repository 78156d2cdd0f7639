//! Byte-order-normalized binary IO.
//!
//! Every multi-byte integer in the on-disk formats is big-endian,
//! independent of host alignment and endianness. Strings are written as
//! a u32 length followed by the raw bytes.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::{Error, Result};

pub fn write_u32(w: &mut impl Write, v: u32) -> Result<()> {
    w.write_u32::<BigEndian>(v)?;
    Ok(())
}

pub fn read_u32(r: &mut impl Read) -> Result<u32> {
    Ok(r.read_u32::<BigEndian>()?)
}

pub fn write_i32(w: &mut impl Write, v: i32) -> Result<()> {
    w.write_i32::<BigEndian>(v)?;
    Ok(())
}

pub fn read_i32(r: &mut impl Read) -> Result<i32> {
    Ok(r.read_i32::<BigEndian>()?)
}

pub fn write_i16(w: &mut impl Write, v: i16) -> Result<()> {
    w.write_i16::<BigEndian>(v)?;
    Ok(())
}

pub fn read_i16(r: &mut impl Read) -> Result<i16> {
    Ok(r.read_i16::<BigEndian>()?)
}

pub fn write_u8(w: &mut impl Write, v: u8) -> Result<()> {
    w.write_u8(v)?;
    Ok(())
}

pub fn read_u8(r: &mut impl Read) -> Result<u8> {
    Ok(r.read_u8()?)
}

/// Length-prefixed string: u32 byte count, then the bytes.
pub fn write_string(w: &mut impl Write, s: &str) -> Result<()> {
    write_u32(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

pub fn read_string(r: &mut impl Read) -> Result<String> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| Error::invalid_data("string is not valid utf-8"))
}

pub fn read_exact(r: &mut impl Read, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_big_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x000fc613).unwrap();
        assert_eq!(buf, [0x00, 0x0f, 0xc6, 0x13]);
        write_i16(&mut buf, -2).unwrap();
        assert_eq!(&buf[4..], [0xff, 0xfe]);
    }

    #[test]
    fn string_roundtrip() {
        let mut buf = Vec::new();
        write_string(&mut buf, "你好").unwrap();
        let mut cur = std::io::Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "你好");
    }
}
