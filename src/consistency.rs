//! Consistency level: a 16-bit code selecting replication acknowledgement
//! policy.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};
use crate::primitives::{decode_short, encode_short};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl ConsistencyLevel {
    fn code(self) -> u16 {
        match self {
            ConsistencyLevel::Any => 0x0000,
            ConsistencyLevel::One => 0x0001,
            ConsistencyLevel::Two => 0x0002,
            ConsistencyLevel::Three => 0x0003,
            ConsistencyLevel::Quorum => 0x0004,
            ConsistencyLevel::All => 0x0005,
            ConsistencyLevel::LocalQuorum => 0x0006,
            ConsistencyLevel::EachQuorum => 0x0007,
            ConsistencyLevel::Serial => 0x0008,
            ConsistencyLevel::LocalSerial => 0x0009,
            ConsistencyLevel::LocalOne => 0x000A,
        }
    }

    fn from_code(code: u16) -> Result<Self> {
        Ok(match code {
            0x0000 => ConsistencyLevel::Any,
            0x0001 => ConsistencyLevel::One,
            0x0002 => ConsistencyLevel::Two,
            0x0003 => ConsistencyLevel::Three,
            0x0004 => ConsistencyLevel::Quorum,
            0x0005 => ConsistencyLevel::All,
            0x0006 => ConsistencyLevel::LocalQuorum,
            0x0007 => ConsistencyLevel::EachQuorum,
            0x0008 => ConsistencyLevel::Serial,
            0x0009 => ConsistencyLevel::LocalSerial,
            0x000A => ConsistencyLevel::LocalOne,
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown consistency level code {other:#06x}"
                )))
            }
        })
    }

    pub fn encode(self, sink: &mut impl BufMut) {
        encode_short(self.code(), sink);
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        Self::from_code(decode_short(source)?)
    }

    pub const fn length() -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrips_every_level() {
        let levels = [
            ConsistencyLevel::Any,
            ConsistencyLevel::One,
            ConsistencyLevel::Two,
            ConsistencyLevel::Three,
            ConsistencyLevel::Quorum,
            ConsistencyLevel::All,
            ConsistencyLevel::LocalQuorum,
            ConsistencyLevel::EachQuorum,
            ConsistencyLevel::Serial,
            ConsistencyLevel::LocalSerial,
            ConsistencyLevel::LocalOne,
        ];
        for level in levels {
            let mut buf = BytesMut::new();
            level.encode(&mut buf);
            let mut frozen = buf.freeze();
            assert_eq!(ConsistencyLevel::decode(&mut frozen).unwrap(), level);
        }
    }

    #[test]
    fn local_quorum_vector() {
        // LOCAL_QUORUM's code, standalone; the full Unavailable ERROR body
        // built from it is covered in error_body.rs's own wire-vector test.
        let mut buf = BytesMut::new();
        ConsistencyLevel::LocalQuorum.encode(&mut buf);
        assert_eq!(&buf[..], &[0x00, 0x06]);
    }

    #[test]
    fn unknown_code_rejected() {
        let mut buf = BytesMut::new();
        encode_short(0xBEEF, &mut buf);
        let mut frozen = buf.freeze();
        assert!(ConsistencyLevel::decode(&mut frozen).is_err());
    }
}
