//! Property-based checks: every codec's `length()` matches what `encode()`
//! actually writes, and `decode(encode(x)) == x` for arbitrary values within
//! each primitive's domain.

use bytes::BytesMut;
use proptest::prelude::*;

use cassandra_protocol::consistency::ConsistencyLevel;
use cassandra_protocol::datatype::DataType;
use cassandra_protocol::message::{Query, QueryOptions};
use cassandra_protocol::primitives::{
    decode_bytes, decode_string, encode_bytes, encode_string, length_bytes, length_string, Bytes,
};
use cassandra_protocol::version::ProtocolVersion;

fn arb_short_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{0,64}"
}

fn arb_consistency() -> impl Strategy<Value = ConsistencyLevel> {
    prop_oneof![
        Just(ConsistencyLevel::Any),
        Just(ConsistencyLevel::One),
        Just(ConsistencyLevel::Two),
        Just(ConsistencyLevel::Three),
        Just(ConsistencyLevel::Quorum),
        Just(ConsistencyLevel::All),
        Just(ConsistencyLevel::LocalQuorum),
        Just(ConsistencyLevel::EachQuorum),
        Just(ConsistencyLevel::Serial),
        Just(ConsistencyLevel::LocalSerial),
        Just(ConsistencyLevel::LocalOne),
    ]
}

fn arb_version() -> impl Strategy<Value = ProtocolVersion> {
    prop_oneof![
        Just(ProtocolVersion::V3),
        Just(ProtocolVersion::V4),
        Just(ProtocolVersion::V5Beta),
        Just(ProtocolVersion::DseV1),
        Just(ProtocolVersion::DseV2),
    ]
}

proptest! {
    #[test]
    fn string_roundtrips(s in arb_short_string()) {
        let mut buf = BytesMut::new();
        encode_string(&s, &mut buf).unwrap();
        prop_assert_eq!(buf.len(), length_string(&s));
        let mut frozen = buf.freeze();
        prop_assert_eq!(decode_string(&mut frozen).unwrap(), s);
    }

    #[test]
    fn bytes_value_roundtrips(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let value = Bytes::Value(data);
        let mut buf = BytesMut::new();
        encode_bytes(&value, &mut buf, false).unwrap();
        prop_assert_eq!(buf.len(), length_bytes(&value));
        let mut frozen = buf.freeze();
        prop_assert_eq!(decode_bytes(&mut frozen, false).unwrap(), value);
    }

    #[test]
    fn query_with_consistency_only_roundtrips(
        query in arb_short_string(),
        consistency in arb_consistency(),
        version in arb_version(),
    ) {
        let message = Query {
            query,
            options: QueryOptions::new(consistency),
        };
        let mut buf = BytesMut::new();
        message.encode(&mut buf, version).unwrap();
        prop_assert_eq!(buf.len(), message.length(version));
        let mut frozen = buf.freeze();
        prop_assert_eq!(cassandra_protocol::message::Query::decode(&mut frozen, version).unwrap(), message);
    }

    #[test]
    fn list_of_int_datatype_roundtrips(version in arb_version()) {
        let data_type = DataType::List(Box::new(DataType::Int));
        let mut buf = BytesMut::new();
        data_type.encode(&mut buf, version).unwrap();
        prop_assert_eq!(buf.len(), data_type.length(version));
        let mut frozen = buf.freeze();
        prop_assert_eq!(DataType::decode(&mut frozen, version).unwrap(), data_type);
    }
}
