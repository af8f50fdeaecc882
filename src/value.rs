//! Bound query-parameter values: a tag over `{Regular, Null, Unset}`, backed
//! by the `bytes` primitive's own sentinel encoding.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};
use crate::primitives::{self, Bytes};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Regular(Vec<u8>),
    Null,
    /// Only legal from protocol v4 onward.
    Unset,
}

impl Value {
    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        if matches!(self, Value::Unset) && !version.supports_unset_values() {
            return Err(Error::unsupported_version(
                "unset bound value",
                ProtocolVersion::V4,
                version,
            ));
        }
        let wire = match self {
            Value::Regular(bytes) => Bytes::Value(bytes.clone()),
            Value::Null => Bytes::Null,
            Value::Unset => Bytes::Unset,
        };
        primitives::encode_bytes(&wire, sink, version.supports_unset_values())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let wire = primitives::decode_bytes(source, version.supports_unset_values())?;
        Ok(match wire {
            Bytes::Value(bytes) => Value::Regular(bytes),
            Bytes::Null => Value::Null,
            Bytes::Unset => Value::Unset,
        })
    }

    pub fn length(&self) -> usize {
        let wire = match self {
            Value::Regular(bytes) => Bytes::Value(bytes.clone()),
            Value::Null => Bytes::Null,
            Value::Unset => Bytes::Unset,
        };
        primitives::length_bytes(&wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn unset_rejected_before_v4() {
        let mut buf = BytesMut::new();
        assert!(Value::Unset.encode(&mut buf, ProtocolVersion::V3).is_err());
        assert!(Value::Unset.encode(&mut buf, ProtocolVersion::V4).is_ok());
    }

    #[test]
    fn roundtrips_all_tags() {
        for version in [ProtocolVersion::V4, ProtocolVersion::V5Beta] {
            for value in [
                Value::Regular(vec![0x01, 0x02, 0x03, 0x04]),
                Value::Null,
                Value::Unset,
            ] {
                let mut buf = BytesMut::new();
                value.encode(&mut buf, version).unwrap();
                assert_eq!(buf.len(), value.length());
                let mut frozen = buf.freeze();
                assert_eq!(Value::decode(&mut frozen, version).unwrap(), value);
            }
        }
    }
}
