//! Pure byte-level readers/writers for the fixed set of protocol primitives.
//!
//! No primitive here knows about messages or protocol versions; they are the
//! leaf layer every data-type and message codec is built from. All
//! multi-byte integers are big-endian, matching `bytes::Buf`/`BufMut`'s
//! default `get_*`/`put_*` methods.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};

/// Sentinel returned by [`decode_bytes`] for the two negative-length markers
/// the `bytes` primitive defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bytes {
    /// `n >= 0`: an ordinary, possibly empty, byte string.
    Value(Vec<u8>),
    /// `n == -1`.
    Null,
    /// `n == -2`; only legal where the caller explicitly allows unset.
    Unset,
}

fn need(source: &impl Buf, n: usize) -> Result<()> {
    if source.remaining() < n {
        Err(Error::short_read(n, source.remaining()))
    } else {
        Ok(())
    }
}

// --- byte ---------------------------------------------------------------

pub fn encode_byte(value: u8, sink: &mut impl BufMut) {
    sink.put_u8(value);
}

pub fn decode_byte(source: &mut impl Buf) -> Result<u8> {
    need(source, 1)?;
    Ok(source.get_u8())
}

pub const fn length_byte() -> usize {
    1
}

// --- short (unsigned 16-bit BE) ------------------------------------------

pub fn encode_short(value: u16, sink: &mut impl BufMut) {
    sink.put_u16(value);
}

pub fn decode_short(source: &mut impl Buf) -> Result<u16> {
    need(source, 2)?;
    Ok(source.get_u16())
}

pub const fn length_short() -> usize {
    2
}

// --- int (signed 32-bit BE) ----------------------------------------------

pub fn encode_int(value: i32, sink: &mut impl BufMut) {
    sink.put_i32(value);
}

pub fn decode_int(source: &mut impl Buf) -> Result<i32> {
    need(source, 4)?;
    Ok(source.get_i32())
}

pub const fn length_int() -> usize {
    4
}

// --- long (signed 64-bit BE) ----------------------------------------------

pub fn encode_long(value: i64, sink: &mut impl BufMut) {
    sink.put_i64(value);
}

pub fn decode_long(source: &mut impl Buf) -> Result<i64> {
    need(source, 8)?;
    Ok(source.get_i64())
}

pub const fn length_long() -> usize {
    8
}

// --- string (short length-prefixed UTF-8) --------------------------------

pub fn encode_string(value: &str, sink: &mut impl BufMut) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(Error::invalid_argument(format!(
            "string of {} bytes exceeds short-length limit",
            bytes.len()
        )));
    }
    encode_short(bytes.len() as u16, sink);
    sink.put_slice(bytes);
    Ok(())
}

pub fn decode_string(source: &mut impl Buf) -> Result<String> {
    let len = decode_short(source)? as usize;
    need(source, len)?;
    let mut buf = vec![0u8; len];
    source.copy_to_slice(&mut buf);
    String::from_utf8(buf).map_err(|e| Error::invalid_encoding(format!("invalid utf-8: {e}")))
}

pub fn length_string(value: &str) -> usize {
    length_short() + value.len()
}

// --- long string (int length-prefixed UTF-8) ------------------------------

pub fn encode_long_string(value: &str, sink: &mut impl BufMut) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > i32::MAX as usize {
        return Err(Error::invalid_argument("long string too large"));
    }
    encode_int(bytes.len() as i32, sink);
    sink.put_slice(bytes);
    Ok(())
}

pub fn decode_long_string(source: &mut impl Buf) -> Result<String> {
    let len = decode_int(source)?;
    if len < 0 {
        return Err(Error::invalid_encoding("negative long string length"));
    }
    let len = len as usize;
    need(source, len)?;
    let mut buf = vec![0u8; len];
    source.copy_to_slice(&mut buf);
    String::from_utf8(buf).map_err(|e| Error::invalid_encoding(format!("invalid utf-8: {e}")))
}

pub fn length_long_string(value: &str) -> usize {
    length_int() + value.len()
}

// --- uuid (16 raw bytes) ---------------------------------------------------

pub fn encode_uuid(value: &[u8; 16], sink: &mut impl BufMut) {
    sink.put_slice(value);
}

pub fn decode_uuid(source: &mut impl Buf) -> Result<[u8; 16]> {
    need(source, 16)?;
    let mut buf = [0u8; 16];
    source.copy_to_slice(&mut buf);
    Ok(buf)
}

pub const fn length_uuid() -> usize {
    16
}

// --- string list -----------------------------------------------------------

pub fn encode_string_list(values: &[String], sink: &mut impl BufMut) -> Result<()> {
    if values.len() > u16::MAX as usize {
        return Err(Error::invalid_argument("string list too long"));
    }
    encode_short(values.len() as u16, sink);
    for value in values {
        encode_string(value, sink)?;
    }
    Ok(())
}

pub fn decode_string_list(source: &mut impl Buf) -> Result<Vec<String>> {
    let count = decode_short(source)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(decode_string(source)?);
    }
    Ok(out)
}

pub fn length_string_list(values: &[String]) -> usize {
    length_short() + values.iter().map(|v| length_string(v)).sum::<usize>()
}

// --- bytes (int length-prefixed, with null/unset sentinels) --------------

/// `allow_unset` gates whether `-2` is a legal length (only true for bound
/// values from protocol v4 onward).
pub fn encode_bytes(value: &Bytes, sink: &mut impl BufMut, allow_unset: bool) -> Result<()> {
    match value {
        Bytes::Value(bytes) => {
            if bytes.len() > i32::MAX as usize {
                return Err(Error::invalid_argument("bytes value too large"));
            }
            encode_int(bytes.len() as i32, sink);
            sink.put_slice(bytes);
        }
        Bytes::Null => encode_int(-1, sink),
        Bytes::Unset => {
            if !allow_unset {
                return Err(Error::invalid_argument(
                    "unset bytes marker not allowed here",
                ));
            }
            encode_int(-2, sink);
        }
    }
    Ok(())
}

pub fn decode_bytes(source: &mut impl Buf, allow_unset: bool) -> Result<Bytes> {
    let len = decode_int(source)?;
    match len {
        -1 => Ok(Bytes::Null),
        -2 if allow_unset => Ok(Bytes::Unset),
        -2 => Err(Error::invalid_encoding(
            "unset bytes marker not allowed here",
        )),
        n if n < 0 => Err(Error::invalid_encoding(format!(
            "invalid negative bytes length {n}"
        ))),
        n => {
            let n = n as usize;
            need(source, n)?;
            let mut buf = vec![0u8; n];
            source.copy_to_slice(&mut buf);
            Ok(Bytes::Value(buf))
        }
    }
}

pub fn length_bytes(value: &Bytes) -> usize {
    match value {
        Bytes::Value(bytes) => length_int() + bytes.len(),
        Bytes::Null | Bytes::Unset => length_int(),
    }
}

/// `bytes` with only the null sentinel, used for metadata payloads like
/// paging state where "unset" has no meaning.
pub fn encode_nullable_bytes(value: &Option<Vec<u8>>, sink: &mut impl BufMut) -> Result<()> {
    match value {
        Some(bytes) => encode_bytes(&Bytes::Value(bytes.clone()), sink, false),
        None => encode_bytes(&Bytes::Null, sink, false),
    }
}

pub fn decode_nullable_bytes(source: &mut impl Buf) -> Result<Option<Vec<u8>>> {
    match decode_bytes(source, false)? {
        Bytes::Value(bytes) => Ok(Some(bytes)),
        Bytes::Null => Ok(None),
        Bytes::Unset => unreachable!("allow_unset was false"),
    }
}

pub fn length_nullable_bytes(value: &Option<Vec<u8>>) -> usize {
    match value {
        Some(bytes) => length_int() + bytes.len(),
        None => length_int(),
    }
}

// --- short bytes (short length-prefixed, no negative lengths) -------------

pub fn encode_short_bytes(value: &[u8], sink: &mut impl BufMut) -> Result<()> {
    if value.len() > u16::MAX as usize {
        return Err(Error::invalid_argument("short bytes value too large"));
    }
    encode_short(value.len() as u16, sink);
    sink.put_slice(value);
    Ok(())
}

pub fn decode_short_bytes(source: &mut impl Buf) -> Result<Vec<u8>> {
    let len = decode_short(source)? as usize;
    need(source, len)?;
    let mut buf = vec![0u8; len];
    source.copy_to_slice(&mut buf);
    Ok(buf)
}

pub fn length_short_bytes(value: &[u8]) -> usize {
    length_short() + value.len()
}

// --- string map / string multimap / bytes map -----------------------------

pub fn encode_string_map(values: &[(String, String)], sink: &mut impl BufMut) -> Result<()> {
    if values.len() > u16::MAX as usize {
        return Err(Error::invalid_argument("string map too large"));
    }
    encode_short(values.len() as u16, sink);
    for (k, v) in values {
        encode_string(k, sink)?;
        encode_string(v, sink)?;
    }
    Ok(())
}

pub fn decode_string_map(source: &mut impl Buf) -> Result<Vec<(String, String)>> {
    let count = decode_short(source)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let k = decode_string(source)?;
        let v = decode_string(source)?;
        out.push((k, v));
    }
    Ok(out)
}

pub fn length_string_map(values: &[(String, String)]) -> usize {
    length_short()
        + values
            .iter()
            .map(|(k, v)| length_string(k) + length_string(v))
            .sum::<usize>()
}

pub fn encode_string_multimap(
    values: &[(String, Vec<String>)],
    sink: &mut impl BufMut,
) -> Result<()> {
    if values.len() > u16::MAX as usize {
        return Err(Error::invalid_argument("string multimap too large"));
    }
    encode_short(values.len() as u16, sink);
    for (k, v) in values {
        encode_string(k, sink)?;
        encode_string_list(v, sink)?;
    }
    Ok(())
}

pub fn decode_string_multimap(source: &mut impl Buf) -> Result<Vec<(String, Vec<String>)>> {
    let count = decode_short(source)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let k = decode_string(source)?;
        let v = decode_string_list(source)?;
        out.push((k, v));
    }
    Ok(out)
}

pub fn length_string_multimap(values: &[(String, Vec<String>)]) -> usize {
    length_short()
        + values
            .iter()
            .map(|(k, v)| length_string(k) + length_string_list(v))
            .sum::<usize>()
}

pub fn encode_bytes_map(values: &[(String, Vec<u8>)], sink: &mut impl BufMut) -> Result<()> {
    if values.len() > u16::MAX as usize {
        return Err(Error::invalid_argument("bytes map too large"));
    }
    encode_short(values.len() as u16, sink);
    for (k, v) in values {
        encode_string(k, sink)?;
        encode_bytes(&Bytes::Value(v.clone()), sink, false)?;
    }
    Ok(())
}

pub fn decode_bytes_map(source: &mut impl Buf) -> Result<Vec<(String, Vec<u8>)>> {
    let count = decode_short(source)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let k = decode_string(source)?;
        let v = match decode_bytes(source, false)? {
            Bytes::Value(bytes) => bytes,
            Bytes::Null => Vec::new(),
            Bytes::Unset => unreachable!("allow_unset was false"),
        };
        out.push((k, v));
    }
    Ok(out)
}

pub fn length_bytes_map(values: &[(String, Vec<u8>)]) -> usize {
    length_short()
        + values
            .iter()
            .map(|(k, v)| length_string(k) + length_int() + v.len())
            .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::bytes::BytesMut;

    fn roundtrip_short(value: u16) {
        let mut buf = BytesMut::new();
        encode_short(value, &mut buf);
        assert_eq!(buf.len(), length_short());
        let mut frozen = buf.freeze();
        assert_eq!(decode_short(&mut frozen).unwrap(), value);
    }

    #[test]
    fn short_roundtrips() {
        roundtrip_short(0);
        roundtrip_short(1);
        roundtrip_short(u16::MAX);
    }

    #[test]
    fn string_roundtrips() {
        let mut buf = BytesMut::new();
        encode_string("hello world", &mut buf).unwrap();
        assert_eq!(buf.len(), length_string("hello world"));
        let mut frozen = buf.freeze();
        assert_eq!(decode_string(&mut frozen).unwrap(), "hello world");
    }

    #[test]
    fn bytes_null_and_unset_sentinels() {
        let mut buf = BytesMut::new();
        encode_bytes(&Bytes::Null, &mut buf, false).unwrap();
        let mut frozen = buf.freeze();
        assert_eq!(decode_bytes(&mut frozen, false).unwrap(), Bytes::Null);

        let mut buf = BytesMut::new();
        encode_bytes(&Bytes::Unset, &mut buf, true).unwrap();
        let mut frozen = buf.freeze();
        assert_eq!(decode_bytes(&mut frozen, true).unwrap(), Bytes::Unset);
    }

    #[test]
    fn unset_rejected_when_not_allowed() {
        let mut buf = BytesMut::new();
        assert!(encode_bytes(&Bytes::Unset, &mut buf, false).is_err());

        let mut buf = BytesMut::new();
        encode_int(-2, &mut buf);
        let mut frozen = buf.freeze();
        assert!(decode_bytes(&mut frozen, false).is_err());
    }

    #[test]
    fn short_bytes_rejects_negative_length_on_decode() {
        let mut buf = BytesMut::new();
        encode_short(0xFFFF, &mut buf); // would read as a huge unsigned length
        let mut frozen = buf.freeze();
        // 0xFFFF as u16 is not negative, so this should just demand that many
        // bytes and fail as a short read rather than succeed.
        assert!(decode_short_bytes(&mut frozen).is_err());
    }

    #[test]
    fn short_read_reports_sizes() {
        let mut frozen = ::bytes::Bytes::from_static(&[0x00]);
        let err = decode_short(&mut frozen).unwrap_err();
        match err {
            Error::ShortRead { needed, available } => {
                assert_eq!(needed, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected ShortRead, got {other:?}"),
        }
    }

    #[test]
    fn string_map_roundtrips() {
        let values = vec![
            ("CQL_VERSION".to_string(), "3.0.0".to_string()),
            ("DRIVER_NAME".to_string(), "test-driver".to_string()),
        ];
        let mut buf = BytesMut::new();
        encode_string_map(&values, &mut buf).unwrap();
        assert_eq!(buf.len(), length_string_map(&values));
        let mut frozen = buf.freeze();
        assert_eq!(decode_string_map(&mut frozen).unwrap(), values);
    }
}
