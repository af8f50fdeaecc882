//! DSE `REVISE_REQUEST` (opcode 0xFF): control messages for an in-flight
//! continuous-paging query. DSE-only: the opcode collides with no
//! open-protocol opcode, so DSE v1/v2 own it outright.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};
use crate::primitives::{decode_int, encode_int, length_int};
use crate::version::ProtocolVersion;

const REVISION_CANCEL_CONTINUOUS_PAGING: i32 = 1;
const REVISION_MORE_CONTINUOUS_PAGES: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionType {
    CancelContinuousPaging,
    MoreContinuousPages { next_pages: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revise {
    pub target_stream_id: i32,
    pub revision: RevisionType,
}

impl Revise {
    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        if !version.is_dse() {
            return Err(Error::unsupported_version(
                "DSE revise request",
                ProtocolVersion::DseV1,
                version,
            ));
        }
        match self.revision {
            RevisionType::CancelContinuousPaging => {
                encode_int(REVISION_CANCEL_CONTINUOUS_PAGING, sink);
                encode_int(self.target_stream_id, sink);
            }
            RevisionType::MoreContinuousPages { next_pages } => {
                encode_int(REVISION_MORE_CONTINUOUS_PAGES, sink);
                encode_int(self.target_stream_id, sink);
                encode_int(next_pages, sink);
            }
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        if !version.is_dse() {
            return Err(Error::unsupported_version(
                "DSE revise request",
                ProtocolVersion::DseV1,
                version,
            ));
        }
        let revision_type = decode_int(source)?;
        let target_stream_id = decode_int(source)?;
        let revision = match revision_type {
            REVISION_CANCEL_CONTINUOUS_PAGING => RevisionType::CancelContinuousPaging,
            REVISION_MORE_CONTINUOUS_PAGES => RevisionType::MoreContinuousPages {
                next_pages: decode_int(source)?,
            },
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown revise request type {other}"
                )))
            }
        };
        Ok(Revise {
            target_stream_id,
            revision,
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> Result<usize> {
        if !version.is_dse() {
            return Err(Error::unsupported_version(
                "DSE revise request",
                ProtocolVersion::DseV1,
                version,
            ));
        }
        Ok(match self.revision {
            RevisionType::CancelContinuousPaging => length_int() * 2,
            RevisionType::MoreContinuousPages { .. } => length_int() * 3,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn cancel_roundtrips_on_dse() {
        let revise = Revise {
            target_stream_id: 7,
            revision: RevisionType::CancelContinuousPaging,
        };
        let mut buf = BytesMut::new();
        revise.encode(&mut buf, ProtocolVersion::DseV1).unwrap();
        assert_eq!(buf.len(), revise.length(ProtocolVersion::DseV1).unwrap());
        let mut frozen = buf.freeze();
        assert_eq!(
            Revise::decode(&mut frozen, ProtocolVersion::DseV1).unwrap(),
            revise
        );
    }

    #[test]
    fn more_pages_roundtrips() {
        let revise = Revise {
            target_stream_id: 3,
            revision: RevisionType::MoreContinuousPages { next_pages: 10 },
        };
        let mut buf = BytesMut::new();
        revise.encode(&mut buf, ProtocolVersion::DseV2).unwrap();
        assert_eq!(buf.len(), revise.length(ProtocolVersion::DseV2).unwrap());
        let mut frozen = buf.freeze();
        assert_eq!(
            Revise::decode(&mut frozen, ProtocolVersion::DseV2).unwrap(),
            revise
        );
    }

    #[test]
    fn rejected_on_open_protocol_versions() {
        let revise = Revise {
            target_stream_id: 1,
            revision: RevisionType::CancelContinuousPaging,
        };
        let mut buf = BytesMut::new();
        assert!(revise.encode(&mut buf, ProtocolVersion::V5Beta).is_err());
    }
}
