//! `PREPARE` (opcode 0x09): a query string, plus a v5+ keyspace override.

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::primitives::{
    decode_int, decode_long_string, decode_string, encode_int, encode_long_string, encode_string,
    length_int, length_long_string, length_string,
};
use crate::version::ProtocolVersion;

const WITH_KEYSPACE: i32 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepare {
    pub query: String,
    pub keyspace: Option<String>,
}

impl Prepare {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            keyspace: None,
        }
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        encode_long_string(&self.query, sink)?;
        if version.supports_prepare_flags() {
            let flags = if self.keyspace.is_some() { WITH_KEYSPACE } else { 0 };
            encode_int(flags, sink);
            if let Some(keyspace) = &self.keyspace {
                encode_string(keyspace, sink)?;
            }
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let query = decode_long_string(source)?;
        let keyspace = if version.supports_prepare_flags() {
            let flags = decode_int(source)?;
            if flags & WITH_KEYSPACE != 0 {
                Some(decode_string(source)?)
            } else {
                None
            }
        } else {
            None
        };
        Ok(Prepare { query, keyspace })
    }

    pub fn length(&self, version: ProtocolVersion) -> usize {
        let mut len = length_long_string(&self.query);
        if version.supports_prepare_flags() {
            len += length_int();
            if let Some(keyspace) = &self.keyspace {
                len += length_string(keyspace);
            }
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn v3_has_no_flags() {
        let prepare = Prepare::new("SELECT * FROM t");
        let mut buf = BytesMut::new();
        prepare.encode(&mut buf, ProtocolVersion::V3).unwrap();
        assert_eq!(buf.len(), length_long_string("SELECT * FROM t"));
    }

    #[test]
    fn v5_keyspace_roundtrips() {
        let prepare = Prepare {
            query: "SELECT * FROM t".into(),
            keyspace: Some("ks1".into()),
        };
        let mut buf = BytesMut::new();
        prepare.encode(&mut buf, ProtocolVersion::V5Beta).unwrap();
        assert_eq!(buf.len(), prepare.length(ProtocolVersion::V5Beta));
        let mut frozen = buf.freeze();
        assert_eq!(
            Prepare::decode(&mut frozen, ProtocolVersion::V5Beta).unwrap(),
            prepare
        );
    }
}
