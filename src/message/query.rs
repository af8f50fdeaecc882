//! `QUERY` (opcode 0x07): a query string plus `QueryOptions`.

use bytes::{Buf, BufMut};

use super::query_options::QueryOptions;
use crate::error::Result;
use crate::primitives::{decode_long_string, encode_long_string, length_long_string};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query: String,
    pub options: QueryOptions,
}

impl Query {
    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        encode_long_string(&self.query, sink)?;
        self.options.encode(sink, version)
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let query = decode_long_string(source)?;
        let options = QueryOptions::decode(source, version)?;
        Ok(Query { query, options })
    }

    pub fn length(&self, version: ProtocolVersion) -> usize {
        length_long_string(&self.query) + self.options.length(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::ConsistencyLevel;
    use bytes::BytesMut;

    #[test]
    fn roundtrips() {
        let query = Query {
            query: "SELECT * FROM ks1.t1".into(),
            options: QueryOptions::new(ConsistencyLevel::Quorum),
        };
        let mut buf = BytesMut::new();
        query.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), query.length(ProtocolVersion::V4));
        let mut frozen = buf.freeze();
        assert_eq!(Query::decode(&mut frozen, ProtocolVersion::V4).unwrap(), query);
    }
}
