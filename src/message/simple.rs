//! The simple message bodies: empty, single-field, or flat-collection
//! payloads that don't need their own submodule.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};
use crate::primitives::{
    decode_bytes, decode_string, decode_string_list, decode_string_map, decode_string_multimap,
    encode_bytes, encode_string, encode_string_list, encode_string_map, encode_string_multimap,
    length_string, length_string_list, length_string_map, length_string_multimap, Bytes,
};

/// `STARTUP`: a string map of options. Only `CQL_VERSION` is required by the
/// protocol; this crate does not validate that invariant (spec Non-goals
/// exclude interpreting CQL semantics), it just carries the map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Startup {
    pub options: Vec<(String, String)>,
}

impl Startup {
    pub fn encode(&self, sink: &mut impl BufMut) -> Result<()> {
        encode_string_map(&self.options, sink)
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        Ok(Startup {
            options: decode_string_map(source)?,
        })
    }

    pub fn length(&self) -> usize {
        length_string_map(&self.options)
    }
}

/// `AUTHENTICATE`: the authenticator class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticate {
    pub authenticator_class: String,
}

impl Authenticate {
    pub fn encode(&self, sink: &mut impl BufMut) -> Result<()> {
        encode_string(&self.authenticator_class, sink)
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        Ok(Authenticate {
            authenticator_class: decode_string(source)?,
        })
    }

    pub fn length(&self) -> usize {
        length_string(&self.authenticator_class)
    }
}

/// Shared shape of `AUTH_CHALLENGE`, `AUTH_RESPONSE` and `AUTH_SUCCESS`: a
/// `bytes` token that must never be null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: Vec<u8>,
}

impl AuthToken {
    pub fn new(token: Vec<u8>) -> Self {
        Self { token }
    }

    pub fn encode(&self, sink: &mut impl BufMut) -> Result<()> {
        encode_bytes(&Bytes::Value(self.token.clone()), sink, false)
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        match decode_bytes(source, false)? {
            Bytes::Value(token) => Ok(AuthToken { token }),
            Bytes::Null => Err(Error::invalid_argument("auth token must not be null")),
            Bytes::Unset => unreachable!("allow_unset was false"),
        }
    }

    pub fn length(&self) -> usize {
        crate::primitives::length_bytes(&Bytes::Value(self.token.clone()))
    }
}

/// `SUPPORTED`: a string multimap of supported options and their values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Supported {
    pub options: Vec<(String, Vec<String>)>,
}

impl Supported {
    pub fn encode(&self, sink: &mut impl BufMut) -> Result<()> {
        encode_string_multimap(&self.options, sink)
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        Ok(Supported {
            options: decode_string_multimap(source)?,
        })
    }

    pub fn length(&self) -> usize {
        length_string_multimap(&self.options)
    }
}

/// `REGISTER`: the event types the client subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Register {
    pub event_types: Vec<String>,
}

impl Register {
    pub fn encode(&self, sink: &mut impl BufMut) -> Result<()> {
        encode_string_list(&self.event_types, sink)
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        Ok(Register {
            event_types: decode_string_list(source)?,
        })
    }

    pub fn length(&self) -> usize {
        length_string_list(&self.event_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn auth_challenge_token_vector() {
        // AUTH_CHALLENGE with token CA FE BA BE.
        let token = AuthToken::new(vec![0xCA, 0xFE, 0xBA, 0xBE]);
        let mut buf = BytesMut::new();
        token.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0x00, 0x00, 0x00, 0x04, 0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(buf.len(), token.length());
    }

    #[test]
    fn null_auth_token_rejected_on_encode_and_decode() {
        // A nil AUTH_CHALLENGE token is always rejected, not just on decode.
        let mut buf = BytesMut::new();
        encode_bytes(&Bytes::Null, &mut buf, false).unwrap();
        let mut frozen = buf.freeze();
        assert!(AuthToken::decode(&mut frozen).is_err());
    }

    #[test]
    fn empty_auth_token_accepted() {
        let token = AuthToken::new(Vec::new());
        let mut buf = BytesMut::new();
        token.encode(&mut buf).unwrap();
        let mut frozen = buf.freeze();
        assert_eq!(AuthToken::decode(&mut frozen).unwrap(), token);
    }

    #[test]
    fn startup_roundtrips() {
        let startup = Startup {
            options: vec![
                ("CQL_VERSION".into(), "3.0.0".into()),
                ("COMPRESSION".into(), "lz4".into()),
            ],
        };
        let mut buf = BytesMut::new();
        startup.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), startup.length());
        let mut frozen = buf.freeze();
        assert_eq!(Startup::decode(&mut frozen).unwrap(), startup);
    }

    #[test]
    fn supported_roundtrips() {
        let supported = Supported {
            options: vec![("COMPRESSION".into(), vec!["snappy".into(), "lz4".into()])],
        };
        let mut buf = BytesMut::new();
        supported.encode(&mut buf).unwrap();
        let mut frozen = buf.freeze();
        assert_eq!(Supported::decode(&mut frozen).unwrap(), supported);
    }
}
