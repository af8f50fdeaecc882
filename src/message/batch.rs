//! `BATCH` (opcode 0x0D): a batch type, a list of children, and the subset
//! of `QueryOptions` fields that make sense for a batch of statements.

use bytes::{Buf, BufMut};

use crate::consistency::ConsistencyLevel;
use crate::error::{Error, Result};
use crate::primitives::{
    decode_byte, decode_int, decode_long, decode_long_string, decode_short, decode_short_bytes,
    decode_string, encode_byte, encode_int, encode_long, encode_long_string, encode_short,
    encode_short_bytes, encode_string, length_int, length_long, length_long_string, length_short,
    length_short_bytes, length_string,
};
use crate::value::Value;
use crate::version::ProtocolVersion;

const SERIAL_CONSISTENCY: u32 = 0x0010;
const DEFAULT_TIMESTAMP: u32 = 0x0020;
const WITH_KEYSPACE: u32 = 0x0080;
const NOW_IN_SECONDS: u32 = 0x0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchType {
    Logged,
    Unlogged,
    Counter,
}

impl BatchType {
    fn code(self) -> u8 {
        match self {
            BatchType::Logged => 0,
            BatchType::Unlogged => 1,
            BatchType::Counter => 2,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0 => BatchType::Logged,
            1 => BatchType::Unlogged,
            2 => BatchType::Counter,
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown batch type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchChildQuery {
    Query(String),
    Prepared(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchChild {
    pub query: BatchChildQuery,
    pub values: Vec<Value>,
}

impl BatchChild {
    fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        match &self.query {
            BatchChildQuery::Query(query) => {
                encode_byte(0, sink);
                encode_long_string(query, sink)?;
            }
            BatchChildQuery::Prepared(id) => {
                encode_byte(1, sink);
                encode_short_bytes(id, sink)?;
            }
        }
        if self.values.len() > u16::MAX as usize {
            return Err(Error::invalid_argument("batch child has too many values"));
        }
        encode_short(self.values.len() as u16, sink);
        for value in &self.values {
            value.encode(sink, version)?;
        }
        Ok(())
    }

    fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let kind = decode_byte(source)?;
        let query = match kind {
            0 => BatchChildQuery::Query(decode_long_string(source)?),
            1 => BatchChildQuery::Prepared(decode_short_bytes(source)?),
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown batch child kind {other}"
                )))
            }
        };
        let count = decode_short(source)? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(Value::decode(source, version)?);
        }
        Ok(BatchChild { query, values })
    }

    fn length(&self, _version: ProtocolVersion) -> usize {
        let query_len = match &self.query {
            BatchChildQuery::Query(query) => 1 + length_long_string(query),
            BatchChildQuery::Prepared(id) => 1 + length_short_bytes(id),
        };
        query_len + length_short() + self.values.iter().map(|v| v.length()).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub batch_type: BatchType,
    pub children: Vec<BatchChild>,
    pub consistency: ConsistencyLevel,
    pub serial_consistency: Option<ConsistencyLevel>,
    pub default_timestamp: Option<i64>,
    pub keyspace: Option<String>,
    pub now_in_seconds: Option<i32>,
}

impl Batch {
    fn flags(&self, version: ProtocolVersion) -> Result<u32> {
        let mut flags = 0u32;
        if self.serial_consistency.is_some() {
            flags |= SERIAL_CONSISTENCY;
        }
        if self.default_timestamp.is_some() {
            flags |= DEFAULT_TIMESTAMP;
        }
        if self.keyspace.is_some() {
            if !version.supports_with_keyspace() {
                return Err(Error::unsupported_version(
                    "WITH_KEYSPACE batch option",
                    ProtocolVersion::V5Beta,
                    version,
                ));
            }
            flags |= WITH_KEYSPACE;
        }
        if self.now_in_seconds.is_some() {
            if !version.supports_now_in_seconds() {
                return Err(Error::unsupported_version(
                    "NOW_IN_SECONDS batch option",
                    ProtocolVersion::V5Beta,
                    version,
                ));
            }
            flags |= NOW_IN_SECONDS;
        }
        Ok(flags)
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        if self.children.is_empty() {
            return Err(Error::invalid_argument("batch must have at least one child"));
        }
        encode_byte(self.batch_type.code(), sink);
        if self.children.len() > u16::MAX as usize {
            return Err(Error::invalid_argument("batch has too many children"));
        }
        encode_short(self.children.len() as u16, sink);
        for child in &self.children {
            child.encode(sink, version)?;
        }
        self.consistency.encode(sink);
        let flags = self.flags(version)?;
        if version.query_flags_width() == 1 {
            encode_byte(flags as u8, sink);
        } else {
            encode_int(flags as i32, sink);
        }
        if let Some(serial) = self.serial_consistency {
            serial.encode(sink);
        }
        if let Some(ts) = self.default_timestamp {
            encode_long(ts, sink);
        }
        if let Some(keyspace) = &self.keyspace {
            encode_string(keyspace, sink)?;
        }
        if let Some(now) = self.now_in_seconds {
            encode_int(now, sink);
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let batch_type = BatchType::from_code(decode_byte(source)?)?;
        let count = decode_short(source)? as usize;
        let mut children = Vec::with_capacity(count);
        for _ in 0..count {
            children.push(BatchChild::decode(source, version)?);
        }
        let consistency = ConsistencyLevel::decode(source)?;
        let flags = if version.query_flags_width() == 1 {
            decode_byte(source)? as u32
        } else {
            decode_int(source)? as u32
        };
        let serial_consistency = if flags & SERIAL_CONSISTENCY != 0 {
            Some(ConsistencyLevel::decode(source)?)
        } else {
            None
        };
        let default_timestamp = if flags & DEFAULT_TIMESTAMP != 0 {
            Some(decode_long(source)?)
        } else {
            None
        };
        let keyspace = if flags & WITH_KEYSPACE != 0 {
            if !version.supports_with_keyspace() {
                return Err(Error::unsupported_version(
                    "WITH_KEYSPACE batch option",
                    ProtocolVersion::V5Beta,
                    version,
                ));
            }
            Some(decode_string(source)?)
        } else {
            None
        };
        let now_in_seconds = if flags & NOW_IN_SECONDS != 0 {
            if !version.supports_now_in_seconds() {
                return Err(Error::unsupported_version(
                    "NOW_IN_SECONDS batch option",
                    ProtocolVersion::V5Beta,
                    version,
                ));
            }
            Some(decode_int(source)?)
        } else {
            None
        };

        Ok(Batch {
            batch_type,
            children,
            consistency,
            serial_consistency,
            default_timestamp,
            keyspace,
            now_in_seconds,
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> usize {
        let mut len = 1
            + length_short()
            + self
                .children
                .iter()
                .map(|c| c.length(version))
                .sum::<usize>()
            + ConsistencyLevel::length()
            + version.query_flags_width();
        if self.serial_consistency.is_some() {
            len += ConsistencyLevel::length();
        }
        if self.default_timestamp.is_some() {
            len += length_long();
        }
        if let Some(keyspace) = &self.keyspace {
            len += length_string(keyspace);
        }
        if self.now_in_seconds.is_some() {
            len += length_int();
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn sample_batch() -> Batch {
        Batch {
            batch_type: BatchType::Logged,
            children: vec![
                BatchChild {
                    query: BatchChildQuery::Query("INSERT".into()),
                    values: vec![Value::Regular(vec![0x01, 0x02, 0x03, 0x04])],
                },
                BatchChild {
                    query: BatchChildQuery::Prepared(vec![0xCA, 0xFE, 0xBA, 0xBE]),
                    values: vec![Value::Regular(vec![0x05, 0x06, 0x07, 0x08])],
                },
            ],
            consistency: ConsistencyLevel::One,
            serial_consistency: None,
            default_timestamp: None,
            keyspace: None,
            now_in_seconds: None,
        }
    }

    #[test]
    fn two_child_batch_vector() {
        // A two-child batch mixing a query string and a prepared-statement id.
        let batch = sample_batch();
        let mut buf = BytesMut::new();
        batch.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), batch.length(ProtocolVersion::V4));

        let mut expected = Vec::new();
        expected.push(0x00); // Logged
        expected.extend_from_slice(&[0x00, 0x02]); // 2 children
        expected.push(0x00); // Query kind
        expected.extend_from_slice(&6i32.to_be_bytes());
        expected.extend_from_slice(b"INSERT");
        expected.extend_from_slice(&[0x00, 0x01]); // 1 value
        expected.extend_from_slice(&4i32.to_be_bytes());
        expected.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        expected.push(0x01); // Prepared kind
        expected.extend_from_slice(&[0x00, 0x04]);
        expected.extend_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE]);
        expected.extend_from_slice(&[0x00, 0x01]); // 1 value
        expected.extend_from_slice(&4i32.to_be_bytes());
        expected.extend_from_slice(&[0x05, 0x06, 0x07, 0x08]);
        expected.extend_from_slice(&[0x00, 0x01]); // consistency ONE
        expected.push(0x00); // no flags (v4: byte width)

        assert_eq!(&buf[..], &expected[..]);

        let mut frozen = buf.freeze();
        assert_eq!(Batch::decode(&mut frozen, ProtocolVersion::V4).unwrap(), batch);
    }

    #[test]
    fn empty_batch_rejected() {
        let batch = Batch {
            children: Vec::new(),
            ..sample_batch()
        };
        let mut buf = BytesMut::new();
        assert!(batch.encode(&mut buf, ProtocolVersion::V4).is_err());
    }

    #[test]
    fn unknown_batch_type_rejected_on_decode() {
        let mut buf = BytesMut::new();
        encode_byte(9, &mut buf);
        let mut frozen = buf.freeze();
        assert!(BatchType::from_code(9).is_err() || Batch::decode(&mut frozen, ProtocolVersion::V4).is_err());
    }
}
