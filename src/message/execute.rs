//! `EXECUTE` (opcode 0x0A): a prepared-statement id, a v5+ result-metadata
//! id, and `QueryOptions`.

use bytes::{Buf, BufMut};

use super::query_options::QueryOptions;
use crate::error::{Error, Result};
use crate::primitives::{decode_short_bytes, encode_short_bytes, length_short_bytes};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute {
    pub prepared_id: Vec<u8>,
    pub result_metadata_id: Option<Vec<u8>>,
    pub options: QueryOptions,
}

impl Execute {
    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        encode_short_bytes(&self.prepared_id, sink)?;
        if version.supports_result_metadata_id() {
            let id = self.result_metadata_id.as_deref().ok_or_else(|| {
                Error::invalid_argument("result_metadata_id is required from protocol v5 onward")
            })?;
            encode_short_bytes(id, sink)?;
        }
        self.options.encode(sink, version)
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let prepared_id = decode_short_bytes(source)?;
        let result_metadata_id = if version.supports_result_metadata_id() {
            Some(decode_short_bytes(source)?)
        } else {
            None
        };
        let options = QueryOptions::decode(source, version)?;
        Ok(Execute {
            prepared_id,
            result_metadata_id,
            options,
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> Result<usize> {
        let mut len = length_short_bytes(&self.prepared_id);
        if version.supports_result_metadata_id() {
            let id = self.result_metadata_id.as_deref().ok_or_else(|| {
                Error::invalid_argument("result_metadata_id is required from protocol v5 onward")
            })?;
            len += length_short_bytes(id);
        }
        Ok(len + self.options.length(version))
    }
}
