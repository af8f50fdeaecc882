//! `QueryOptions`, shared verbatim by QUERY, EXECUTE and BATCH.

use bytes::{Buf, BufMut};

use crate::consistency::ConsistencyLevel;
use crate::error::{Error, Result};
use crate::primitives::{
    decode_bytes, decode_int, decode_long, decode_short, decode_string, encode_bytes, encode_int,
    encode_long, encode_short, encode_string, length_int, length_long, length_short,
    length_string, Bytes,
};
use crate::value::Value;
use crate::version::ProtocolVersion;

const VALUES: u32 = 0x0001;
const SKIP_METADATA: u32 = 0x0002;
const PAGE_SIZE: u32 = 0x0004;
const PAGING_STATE: u32 = 0x0008;
const SERIAL_CONSISTENCY: u32 = 0x0010;
const DEFAULT_TIMESTAMP: u32 = 0x0020;
const VALUE_NAMES: u32 = 0x0040;
const WITH_KEYSPACE: u32 = 0x0080;
const NOW_IN_SECONDS: u32 = 0x0100;

/// Bound values for a query, named and positional being mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoundValues {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl BoundValues {
    fn is_empty(&self) -> bool {
        matches!(self, BoundValues::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub consistency: ConsistencyLevel,
    pub values: BoundValues,
    pub skip_metadata: bool,
    pub page_size: Option<i32>,
    pub paging_state: Option<Vec<u8>>,
    pub serial_consistency: Option<ConsistencyLevel>,
    pub default_timestamp: Option<i64>,
    pub keyspace: Option<String>,
    pub now_in_seconds: Option<i32>,
}

impl QueryOptions {
    pub fn new(consistency: ConsistencyLevel) -> Self {
        Self {
            consistency,
            values: BoundValues::None,
            skip_metadata: false,
            page_size: None,
            paging_state: None,
            serial_consistency: None,
            default_timestamp: None,
            keyspace: None,
            now_in_seconds: None,
        }
    }

    fn flags(&self, version: ProtocolVersion) -> Result<u32> {
        let mut flags = 0u32;
        match &self.values {
            BoundValues::None => {}
            BoundValues::Positional(values) => {
                if !values.is_empty() {
                    flags |= VALUES;
                }
            }
            BoundValues::Named(values) => {
                if !values.is_empty() {
                    flags |= VALUES | VALUE_NAMES;
                }
            }
        }
        if self.skip_metadata {
            flags |= SKIP_METADATA;
        }
        if self.page_size.is_some() {
            flags |= PAGE_SIZE;
        }
        if self.paging_state.is_some() {
            flags |= PAGING_STATE;
        }
        if self.serial_consistency.is_some() {
            flags |= SERIAL_CONSISTENCY;
        }
        if self.default_timestamp.is_some() {
            flags |= DEFAULT_TIMESTAMP;
        }
        if self.keyspace.is_some() {
            if !version.supports_with_keyspace() {
                return Err(Error::unsupported_version(
                    "WITH_KEYSPACE query option",
                    ProtocolVersion::V5Beta,
                    version,
                ));
            }
            flags |= WITH_KEYSPACE;
        }
        if self.now_in_seconds.is_some() {
            if !version.supports_now_in_seconds() {
                return Err(Error::unsupported_version(
                    "NOW_IN_SECONDS query option",
                    ProtocolVersion::V5Beta,
                    version,
                ));
            }
            flags |= NOW_IN_SECONDS;
        }
        Ok(flags)
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        self.consistency.encode(sink);
        let flags = self.flags(version)?;
        encode_flags(flags, sink, version);

        match &self.values {
            BoundValues::None => {}
            BoundValues::Positional(values) if !values.is_empty() => {
                encode_values_block(values.iter().map(|v| (None, v)), sink, version)?;
            }
            BoundValues::Named(values) if !values.is_empty() => {
                encode_values_block(
                    values.iter().map(|(name, v)| (Some(name.as_str()), v)),
                    sink,
                    version,
                )?;
            }
            _ => {}
        }
        if let Some(page_size) = self.page_size {
            encode_int(page_size, sink);
        }
        if let Some(paging_state) = &self.paging_state {
            encode_bytes(&Bytes::Value(paging_state.clone()), sink, false)?;
        }
        if let Some(serial_consistency) = self.serial_consistency {
            serial_consistency.encode(sink);
        }
        if let Some(timestamp) = self.default_timestamp {
            encode_long(timestamp, sink);
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
        let consistency = ConsistencyLevel::decode(source)?;
        let flags = decode_flags(source, version)?;

        let values = if flags & VALUES != 0 {
            let named = flags & VALUE_NAMES != 0;
            decode_values_block(source, named, version)?
        } else {
            BoundValues::None
        };
        let skip_metadata = flags & SKIP_METADATA != 0;
        let page_size = if flags & PAGE_SIZE != 0 {
            Some(decode_int(source)?)
        } else {
            None
        };
        let paging_state = if flags & PAGING_STATE != 0 {
            match decode_bytes(source, false)? {
                Bytes::Value(bytes) => Some(bytes),
                Bytes::Null => None,
                Bytes::Unset => unreachable!("allow_unset was false"),
            }
        } else {
            None
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
                    "WITH_KEYSPACE query option",
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
                    "NOW_IN_SECONDS query option",
                    ProtocolVersion::V5Beta,
                    version,
                ));
            }
            Some(decode_int(source)?)
        } else {
            None
        };

        Ok(QueryOptions {
            consistency,
            values,
            skip_metadata,
            page_size,
            paging_state,
            serial_consistency,
            default_timestamp,
            keyspace,
            now_in_seconds,
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> usize {
        let mut len = ConsistencyLevel::length() + flags_width(version);
        match &self.values {
            BoundValues::None => {}
            BoundValues::Positional(values) if !values.is_empty() => {
                len += length_values_block(values.iter().map(|v| (None, v)));
            }
            BoundValues::Named(values) if !values.is_empty() => {
                len += length_values_block(values.iter().map(|(name, v)| (Some(name.as_str()), v)));
            }
            _ => {}
        }
        if self.page_size.is_some() {
            len += length_int();
        }
        if let Some(paging_state) = &self.paging_state {
            len += length_int() + paging_state.len();
        }
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

fn flags_width(version: ProtocolVersion) -> usize {
    version.query_flags_width()
}

fn encode_flags(flags: u32, sink: &mut impl BufMut, version: ProtocolVersion) {
    if version.query_flags_width() == 1 {
        sink.put_u8(flags as u8);
    } else {
        encode_int(flags as i32, sink);
    }
}

fn decode_flags(source: &mut impl Buf, version: ProtocolVersion) -> Result<u32> {
    if version.query_flags_width() == 1 {
        if source.remaining() < 1 {
            return Err(Error::short_read(1, source.remaining()));
        }
        Ok(source.get_u8() as u32)
    } else {
        Ok(decode_int(source)? as u32)
    }
}

fn encode_values_block<'a>(
    values: impl Iterator<Item = (Option<&'a str>, &'a Value)> + Clone,
    sink: &mut impl BufMut,
    version: ProtocolVersion,
) -> Result<()> {
    let count = values.clone().count();
    if count > u16::MAX as usize {
        return Err(Error::invalid_argument("too many bound values"));
    }
    encode_short(count as u16, sink);
    for (name, value) in values {
        if let Some(name) = name {
            encode_string(name, sink)?;
        }
        value.encode(sink, version)?;
    }
    Ok(())
}

fn length_values_block<'a>(values: impl Iterator<Item = (Option<&'a str>, &'a Value)>) -> usize {
    let mut len = length_short();
    for (name, value) in values {
        if let Some(name) = name {
            len += length_string(name);
        }
        len += value.length();
    }
    len
}

fn decode_values_block(
    source: &mut impl Buf,
    named: bool,
    version: ProtocolVersion,
) -> Result<BoundValues> {
    let count = decode_short(source)? as usize;
    if named {
        if !version.supports_named_values() {
            return Err(Error::unsupported_version(
                "named bound values",
                ProtocolVersion::V4,
                version,
            ));
        }
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let name = decode_string(source)?;
            let value = Value::decode(source, version)?;
            values.push((name, value));
        }
        Ok(BoundValues::Named(values))
    } else {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(Value::decode(source, version)?);
        }
        Ok(BoundValues::Positional(values))
    }
}
