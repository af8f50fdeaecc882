//! The extensible data-type system: a recursive `DataType` tree, encoded as
//! a `short` type id followed by a type-dependent payload.
//!
//! Grounded on the recursive `Encode`/`Decode` pattern
//! `chainsync::codec::Message<C>` and `handshake::protocol::VersionTable<T>`
//! use for self-referential wire types — here expressed as plain recursive
//! functions rather than a trait, since `DataType` is the only recursive
//! shape in this crate and a trait would add indirection without buying
//! anything.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};
use crate::primitives::{decode_short, decode_string, encode_short, encode_string, length_short, length_string};
use crate::version::ProtocolVersion;

const ID_CUSTOM: u16 = 0x0000;
const ID_ASCII: u16 = 0x0001;
const ID_BIGINT: u16 = 0x0002;
const ID_BLOB: u16 = 0x0003;
const ID_BOOLEAN: u16 = 0x0004;
const ID_COUNTER: u16 = 0x0005;
const ID_DECIMAL: u16 = 0x0006;
const ID_DOUBLE: u16 = 0x0007;
const ID_FLOAT: u16 = 0x0008;
const ID_INT: u16 = 0x0009;
const ID_TIMESTAMP: u16 = 0x000B;
const ID_UUID: u16 = 0x000C;
const ID_VARCHAR: u16 = 0x000D;
const ID_VARINT: u16 = 0x000E;
const ID_TIMEUUID: u16 = 0x000F;
const ID_INET: u16 = 0x0010;
const ID_DATE: u16 = 0x0011;
const ID_TIME: u16 = 0x0012;
const ID_SMALLINT: u16 = 0x0013;
const ID_TINYINT: u16 = 0x0014;
const ID_DURATION: u16 = 0x0015;
const ID_LIST: u16 = 0x0020;
const ID_MAP: u16 = 0x0021;
const ID_SET: u16 = 0x0022;
const ID_UDT: u16 = 0x0030;
const ID_TUPLE: u16 = 0x0031;

/// A CQL column/value type descriptor. Primitive variants carry no payload;
/// the rest nest further `DataType`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Int,
    Timestamp,
    Uuid,
    Varchar,
    Varint,
    Timeuuid,
    Inet,
    Date,
    Time,
    Smallint,
    Tinyint,
    /// Protocol v5+ only.
    Duration,
    Custom(String),
    List(Box<DataType>),
    Set(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Udt {
        keyspace: String,
        name: String,
        fields: Vec<(String, DataType)>,
    },
    Tuple(Vec<DataType>),
}

impl DataType {
    fn id(&self) -> u16 {
        match self {
            DataType::Custom(_) => ID_CUSTOM,
            DataType::Ascii => ID_ASCII,
            DataType::Bigint => ID_BIGINT,
            DataType::Blob => ID_BLOB,
            DataType::Boolean => ID_BOOLEAN,
            DataType::Counter => ID_COUNTER,
            DataType::Decimal => ID_DECIMAL,
            DataType::Double => ID_DOUBLE,
            DataType::Float => ID_FLOAT,
            DataType::Int => ID_INT,
            DataType::Timestamp => ID_TIMESTAMP,
            DataType::Uuid => ID_UUID,
            DataType::Varchar => ID_VARCHAR,
            DataType::Varint => ID_VARINT,
            DataType::Timeuuid => ID_TIMEUUID,
            DataType::Inet => ID_INET,
            DataType::Date => ID_DATE,
            DataType::Time => ID_TIME,
            DataType::Smallint => ID_SMALLINT,
            DataType::Tinyint => ID_TINYINT,
            DataType::Duration => ID_DURATION,
            DataType::List(_) => ID_LIST,
            DataType::Set(_) => ID_SET,
            DataType::Map(_, _) => ID_MAP,
            DataType::Udt { .. } => ID_UDT,
            DataType::Tuple(_) => ID_TUPLE,
        }
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        if matches!(self, DataType::Duration) && !version.supports_duration_type() {
            return Err(Error::unsupported_version(
                "duration data type",
                ProtocolVersion::V5Beta,
                version,
            ));
        }

        encode_short(self.id(), sink);

        match self {
            DataType::Custom(class_name) => encode_string(class_name, sink)?,
            DataType::List(inner) | DataType::Set(inner) => inner.encode(sink, version)?,
            DataType::Map(key, value) => {
                key.encode(sink, version)?;
                value.encode(sink, version)?;
            }
            DataType::Udt {
                keyspace,
                name,
                fields,
            } => {
                encode_string(keyspace, sink)?;
                encode_string(name, sink)?;
                if fields.len() > u16::MAX as usize {
                    return Err(Error::invalid_argument("udt has too many fields"));
                }
                encode_short(fields.len() as u16, sink);
                for (field_name, field_type) in fields {
                    encode_string(field_name, sink)?;
                    field_type.encode(sink, version)?;
                }
            }
            DataType::Tuple(elements) => {
                if elements.len() > u16::MAX as usize {
                    return Err(Error::invalid_argument("tuple has too many elements"));
                }
                encode_short(elements.len() as u16, sink);
                for element in elements {
                    element.encode(sink, version)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let id = decode_short(source)?;
        tracing::trace!(type_id = id, ?version, "decoding data type");
        let value = match id {
            ID_CUSTOM => DataType::Custom(decode_string(source)?),
            ID_ASCII => DataType::Ascii,
            ID_BIGINT => DataType::Bigint,
            ID_BLOB => DataType::Blob,
            ID_BOOLEAN => DataType::Boolean,
            ID_COUNTER => DataType::Counter,
            ID_DECIMAL => DataType::Decimal,
            ID_DOUBLE => DataType::Double,
            ID_FLOAT => DataType::Float,
            ID_INT => DataType::Int,
            ID_TIMESTAMP => DataType::Timestamp,
            ID_UUID => DataType::Uuid,
            ID_VARCHAR => DataType::Varchar,
            ID_VARINT => DataType::Varint,
            ID_TIMEUUID => DataType::Timeuuid,
            ID_INET => DataType::Inet,
            ID_DATE => DataType::Date,
            ID_TIME => DataType::Time,
            ID_SMALLINT => DataType::Smallint,
            ID_TINYINT => DataType::Tinyint,
            ID_DURATION => {
                if !version.supports_duration_type() {
                    return Err(Error::unsupported_version(
                        "duration data type",
                        ProtocolVersion::V5Beta,
                        version,
                    ));
                }
                DataType::Duration
            }
            ID_LIST => DataType::List(Box::new(DataType::decode(source, version)?)),
            ID_SET => DataType::Set(Box::new(DataType::decode(source, version)?)),
            ID_MAP => {
                let key = DataType::decode(source, version)?;
                let value = DataType::decode(source, version)?;
                DataType::Map(Box::new(key), Box::new(value))
            }
            ID_UDT => {
                let keyspace = decode_string(source)?;
                let name = decode_string(source)?;
                let count = decode_short(source)? as usize;
                let mut fields = Vec::with_capacity(count);
                for _ in 0..count {
                    let field_name = decode_string(source)?;
                    let field_type = DataType::decode(source, version)?;
                    fields.push((field_name, field_type));
                }
                DataType::Udt {
                    keyspace,
                    name,
                    fields,
                }
            }
            ID_TUPLE => {
                let count = decode_short(source)? as usize;
                let mut elements = Vec::with_capacity(count);
                for _ in 0..count {
                    elements.push(DataType::decode(source, version)?);
                }
                DataType::Tuple(elements)
            }
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unsupported data type id {other:#06x}"
                )))
            }
        };
        Ok(value)
    }

    pub fn length(&self, version: ProtocolVersion) -> usize {
        length_short()
            + match self {
                DataType::Custom(class_name) => length_string(class_name),
                DataType::List(inner) | DataType::Set(inner) => inner.length(version),
                DataType::Map(key, value) => key.length(version) + value.length(version),
                DataType::Udt {
                    keyspace,
                    name,
                    fields,
                } => {
                    length_string(keyspace)
                        + length_string(name)
                        + length_short()
                        + fields
                            .iter()
                            .map(|(n, t)| length_string(n) + t.length(version))
                            .sum::<usize>()
                }
                DataType::Tuple(elements) => {
                    length_short() + elements.iter().map(|e| e.length(version)).sum::<usize>()
                }
                _ => 0,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn roundtrip(dt: &DataType, version: ProtocolVersion) {
        let mut buf = BytesMut::new();
        dt.encode(&mut buf, version).unwrap();
        assert_eq!(buf.len(), dt.length(version));
        let mut frozen = buf.freeze();
        assert_eq!(&DataType::decode(&mut frozen, version).unwrap(), dt);
    }

    #[test]
    fn primitive_roundtrip() {
        roundtrip(&DataType::Int, ProtocolVersion::V3);
        roundtrip(&DataType::Varchar, ProtocolVersion::V3);
        roundtrip(&DataType::Uuid, ProtocolVersion::V3);
    }

    #[test]
    fn nested_collections_roundtrip() {
        let dt = DataType::Map(
            Box::new(DataType::Varchar),
            Box::new(DataType::List(Box::new(DataType::Int))),
        );
        roundtrip(&dt, ProtocolVersion::V4);
    }

    #[test]
    fn udt_and_tuple_roundtrip() {
        let udt = DataType::Udt {
            keyspace: "ks1".into(),
            name: "address".into(),
            fields: vec![
                ("street".into(), DataType::Varchar),
                ("zip".into(), DataType::Int),
            ],
        };
        roundtrip(&udt, ProtocolVersion::V4);

        let tuple = DataType::Tuple(vec![DataType::Int, DataType::Varchar]);
        roundtrip(&tuple, ProtocolVersion::V4);
    }

    #[test]
    fn duration_gated_before_v5() {
        let mut buf = BytesMut::new();
        assert!(DataType::Duration.encode(&mut buf, ProtocolVersion::V4).is_err());
        assert!(DataType::Duration
            .encode(&mut buf, ProtocolVersion::V5Beta)
            .is_ok());
    }

    #[test]
    fn unknown_type_id_rejected() {
        let mut buf = BytesMut::new();
        encode_short(0x00FF, &mut buf);
        let mut frozen = buf.freeze();
        assert!(DataType::decode(&mut frozen, ProtocolVersion::V4).is_err());
    }

    #[test]
    fn arbitrary_nesting_depth_tolerated() {
        let mut dt = DataType::Int;
        for _ in 0..64 {
            dt = DataType::List(Box::new(dt));
        }
        roundtrip(&dt, ProtocolVersion::V4);
    }
}
