//! `ERROR` (opcode 0x00): an error code plus a code-specific payload.

use bytes::{Buf, BufMut};

use crate::consistency::ConsistencyLevel;
use crate::error::{Error as CodecError, Result};
use crate::inet::InetAddr;
use crate::primitives::{
    decode_byte, decode_int, decode_short, decode_string, encode_byte, encode_int, encode_short,
    encode_string, length_byte, length_int, length_short, length_string,
};
use crate::version::ProtocolVersion;

const CODE_SERVER_ERROR: i32 = 0x0000;
const CODE_PROTOCOL_ERROR: i32 = 0x000A;
const CODE_AUTHENTICATION_ERROR: i32 = 0x0100;
const CODE_UNAVAILABLE: i32 = 0x1000;
const CODE_OVERLOADED: i32 = 0x1001;
const CODE_IS_BOOTSTRAPPING: i32 = 0x1002;
const CODE_TRUNCATE_ERROR: i32 = 0x1003;
const CODE_WRITE_TIMEOUT: i32 = 0x1100;
const CODE_READ_TIMEOUT: i32 = 0x1200;
const CODE_READ_FAILURE: i32 = 0x1300;
const CODE_FUNCTION_FAILURE: i32 = 0x1400;
const CODE_WRITE_FAILURE: i32 = 0x1500;
const CODE_SYNTAX_ERROR: i32 = 0x2000;
const CODE_UNAUTHORIZED: i32 = 0x2100;
const CODE_INVALID: i32 = 0x2200;
const CODE_CONFIG_ERROR: i32 = 0x2300;
const CODE_ALREADY_EXISTS: i32 = 0x2400;
const CODE_UNPREPARED: i32 = 0x2500;

/// Per-node failure reasons attached to READ_FAILURE/WRITE_FAILURE: a plain
/// count pre-v5, a `map<inetaddr, short>` of per-node reason codes on v5+.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReasons {
    Count(i32),
    PerNode(Vec<(InetAddr, u16)>),
}

impl FailureReasons {
    fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        match self {
            FailureReasons::Count(count) => {
                if version.supports_failure_reason_map() {
                    return Err(CodecError::unsupported_version(
                        "plain failure count",
                        ProtocolVersion::V3,
                        version,
                    ));
                }
                encode_int(*count, sink);
            }
            FailureReasons::PerNode(reasons) => {
                if !version.supports_failure_reason_map() {
                    return Err(CodecError::unsupported_version(
                        "per-node failure reason map",
                        ProtocolVersion::V5Beta,
                        version,
                    ));
                }
                if reasons.len() > u16::MAX as usize {
                    return Err(CodecError::invalid_argument("too many failure reasons"));
                }
                encode_short(reasons.len() as u16, sink);
                for (addr, code) in reasons {
                    addr.encode(sink);
                    encode_short(*code, sink);
                }
            }
        }
        Ok(())
    }

    fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        if version.supports_failure_reason_map() {
            let count = decode_short(source)? as usize;
            let mut reasons = Vec::with_capacity(count);
            for _ in 0..count {
                let addr = InetAddr::decode(source)?;
                let code = decode_short(source)?;
                reasons.push((addr, code));
            }
            Ok(FailureReasons::PerNode(reasons))
        } else {
            Ok(FailureReasons::Count(decode_int(source)?))
        }
    }

    fn length(&self, version: ProtocolVersion) -> usize {
        let _ = version;
        match self {
            FailureReasons::Count(_) => length_int(),
            FailureReasons::PerNode(reasons) => {
                length_short()
                    + reasons
                        .iter()
                        .map(|(addr, _)| addr.length() + length_short())
                        .sum::<usize>()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteType {
    Simple,
    Batch,
    UnloggedBatch,
    Counter,
    BatchLog,
    Cas,
    View,
    Cdc,
}

impl WriteType {
    fn as_str(&self) -> &'static str {
        match self {
            WriteType::Simple => "SIMPLE",
            WriteType::Batch => "BATCH",
            WriteType::UnloggedBatch => "UNLOGGED_BATCH",
            WriteType::Counter => "COUNTER",
            WriteType::BatchLog => "BATCH_LOG",
            WriteType::Cas => "CAS",
            WriteType::View => "VIEW",
            WriteType::Cdc => "CDC",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "SIMPLE" => WriteType::Simple,
            "BATCH" => WriteType::Batch,
            "UNLOGGED_BATCH" => WriteType::UnloggedBatch,
            "COUNTER" => WriteType::Counter,
            "BATCH_LOG" => WriteType::BatchLog,
            "CAS" => WriteType::Cas,
            "VIEW" => WriteType::View,
            "CDC" => WriteType::Cdc,
            other => {
                return Err(CodecError::invalid_encoding(format!(
                    "unknown write type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableDetail {
    pub consistency: ConsistencyLevel,
    pub required: i32,
    pub alive: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTimeoutDetail {
    pub consistency: ConsistencyLevel,
    pub received: i32,
    pub block_for: i32,
    pub data_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTimeoutDetail {
    pub consistency: ConsistencyLevel,
    pub received: i32,
    pub block_for: i32,
    pub write_type: WriteType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailureDetail {
    pub consistency: ConsistencyLevel,
    pub received: i32,
    pub block_for: i32,
    pub reasons: FailureReasons,
    pub data_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailureDetail {
    pub consistency: ConsistencyLevel,
    pub received: i32,
    pub block_for: i32,
    pub reasons: FailureReasons,
    pub write_type: WriteType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyExistsDetail {
    pub keyspace: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    ServerError,
    ProtocolError,
    AuthenticationError,
    Unavailable(UnavailableDetail),
    Overloaded,
    IsBootstrapping,
    TruncateError,
    WriteTimeout(WriteTimeoutDetail),
    ReadTimeout(ReadTimeoutDetail),
    ReadFailure(ReadFailureDetail),
    FunctionFailure {
        keyspace: String,
        function: String,
        arg_types: Vec<String>,
    },
    WriteFailure(WriteFailureDetail),
    SyntaxError,
    Unauthorized,
    Invalid,
    ConfigError,
    AlreadyExists(AlreadyExistsDetail),
    Unprepared { unknown_id: Vec<u8> },
    /// Any code this crate doesn't recognize; preserved rather than dropped
    /// so a forward-compatible server extension still round-trips.
    Unknown { code: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub body: ErrorBody,
    pub message: String,
}

impl ErrorMessage {
    fn code(&self) -> i32 {
        match &self.body {
            ErrorBody::ServerError => CODE_SERVER_ERROR,
            ErrorBody::ProtocolError => CODE_PROTOCOL_ERROR,
            ErrorBody::AuthenticationError => CODE_AUTHENTICATION_ERROR,
            ErrorBody::Unavailable(_) => CODE_UNAVAILABLE,
            ErrorBody::Overloaded => CODE_OVERLOADED,
            ErrorBody::IsBootstrapping => CODE_IS_BOOTSTRAPPING,
            ErrorBody::TruncateError => CODE_TRUNCATE_ERROR,
            ErrorBody::WriteTimeout(_) => CODE_WRITE_TIMEOUT,
            ErrorBody::ReadTimeout(_) => CODE_READ_TIMEOUT,
            ErrorBody::ReadFailure(_) => CODE_READ_FAILURE,
            ErrorBody::FunctionFailure { .. } => CODE_FUNCTION_FAILURE,
            ErrorBody::WriteFailure(_) => CODE_WRITE_FAILURE,
            ErrorBody::SyntaxError => CODE_SYNTAX_ERROR,
            ErrorBody::Unauthorized => CODE_UNAUTHORIZED,
            ErrorBody::Invalid => CODE_INVALID,
            ErrorBody::ConfigError => CODE_CONFIG_ERROR,
            ErrorBody::AlreadyExists(_) => CODE_ALREADY_EXISTS,
            ErrorBody::Unprepared { .. } => CODE_UNPREPARED,
            ErrorBody::Unknown { code } => *code,
        }
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        encode_int(self.code(), sink);
        encode_string(&self.message, sink)?;
        match &self.body {
            ErrorBody::Unavailable(detail) => {
                detail.consistency.encode(sink);
                encode_int(detail.required, sink);
                encode_int(detail.alive, sink);
            }
            ErrorBody::WriteTimeout(detail) => {
                detail.consistency.encode(sink);
                encode_int(detail.received, sink);
                encode_int(detail.block_for, sink);
                encode_string(detail.write_type.as_str(), sink)?;
            }
            ErrorBody::ReadTimeout(detail) => {
                detail.consistency.encode(sink);
                encode_int(detail.received, sink);
                encode_int(detail.block_for, sink);
                encode_byte(if detail.data_present { 1 } else { 0 }, sink);
            }
            ErrorBody::ReadFailure(detail) => {
                detail.consistency.encode(sink);
                encode_int(detail.received, sink);
                encode_int(detail.block_for, sink);
                detail.reasons.encode(sink, version)?;
                encode_byte(if detail.data_present { 1 } else { 0 }, sink);
            }
            ErrorBody::WriteFailure(detail) => {
                detail.consistency.encode(sink);
                encode_int(detail.received, sink);
                encode_int(detail.block_for, sink);
                detail.reasons.encode(sink, version)?;
                encode_string(detail.write_type.as_str(), sink)?;
            }
            ErrorBody::FunctionFailure {
                keyspace,
                function,
                arg_types,
            } => {
                encode_string(keyspace, sink)?;
                encode_string(function, sink)?;
                crate::primitives::encode_string_list(arg_types, sink)?;
            }
            ErrorBody::AlreadyExists(detail) => {
                encode_string(&detail.keyspace, sink)?;
                encode_string(&detail.table, sink)?;
            }
            ErrorBody::Unprepared { unknown_id } => {
                crate::primitives::encode_short_bytes(unknown_id, sink)?;
            }
            ErrorBody::ServerError
            | ErrorBody::ProtocolError
            | ErrorBody::AuthenticationError
            | ErrorBody::Overloaded
            | ErrorBody::IsBootstrapping
            | ErrorBody::TruncateError
            | ErrorBody::SyntaxError
            | ErrorBody::Unauthorized
            | ErrorBody::Invalid
            | ErrorBody::ConfigError
            | ErrorBody::Unknown { .. } => {}
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let code = decode_int(source)?;
        let message = decode_string(source)?;
        let body = match code {
            CODE_SERVER_ERROR => ErrorBody::ServerError,
            CODE_PROTOCOL_ERROR => ErrorBody::ProtocolError,
            CODE_AUTHENTICATION_ERROR => ErrorBody::AuthenticationError,
            CODE_UNAVAILABLE => ErrorBody::Unavailable(UnavailableDetail {
                consistency: ConsistencyLevel::decode(source)?,
                required: decode_int(source)?,
                alive: decode_int(source)?,
            }),
            CODE_OVERLOADED => ErrorBody::Overloaded,
            CODE_IS_BOOTSTRAPPING => ErrorBody::IsBootstrapping,
            CODE_TRUNCATE_ERROR => ErrorBody::TruncateError,
            CODE_WRITE_TIMEOUT => ErrorBody::WriteTimeout(WriteTimeoutDetail {
                consistency: ConsistencyLevel::decode(source)?,
                received: decode_int(source)?,
                block_for: decode_int(source)?,
                write_type: WriteType::parse(&decode_string(source)?)?,
            }),
            CODE_READ_TIMEOUT => ErrorBody::ReadTimeout(ReadTimeoutDetail {
                consistency: ConsistencyLevel::decode(source)?,
                received: decode_int(source)?,
                block_for: decode_int(source)?,
                data_present: decode_byte(source)? != 0,
            }),
            CODE_READ_FAILURE => ErrorBody::ReadFailure(ReadFailureDetail {
                consistency: ConsistencyLevel::decode(source)?,
                received: decode_int(source)?,
                block_for: decode_int(source)?,
                reasons: FailureReasons::decode(source, version)?,
                data_present: decode_byte(source)? != 0,
            }),
            CODE_FUNCTION_FAILURE => ErrorBody::FunctionFailure {
                keyspace: decode_string(source)?,
                function: decode_string(source)?,
                arg_types: crate::primitives::decode_string_list(source)?,
            },
            CODE_WRITE_FAILURE => ErrorBody::WriteFailure(WriteFailureDetail {
                consistency: ConsistencyLevel::decode(source)?,
                received: decode_int(source)?,
                block_for: decode_int(source)?,
                reasons: FailureReasons::decode(source, version)?,
                write_type: WriteType::parse(&decode_string(source)?)?,
            }),
            CODE_SYNTAX_ERROR => ErrorBody::SyntaxError,
            CODE_UNAUTHORIZED => ErrorBody::Unauthorized,
            CODE_INVALID => ErrorBody::Invalid,
            CODE_CONFIG_ERROR => ErrorBody::ConfigError,
            CODE_ALREADY_EXISTS => ErrorBody::AlreadyExists(AlreadyExistsDetail {
                keyspace: decode_string(source)?,
                table: decode_string(source)?,
            }),
            CODE_UNPREPARED => ErrorBody::Unprepared {
                unknown_id: crate::primitives::decode_short_bytes(source)?,
            },
            other => ErrorBody::Unknown { code: other },
        };
        Ok(ErrorMessage { body, message })
    }

    pub fn length(&self, version: ProtocolVersion) -> usize {
        let mut len = length_int() + length_string(&self.message);
        len += match &self.body {
            ErrorBody::Unavailable(_) => length_int() * 2 + ConsistencyLevel::length(),
            ErrorBody::WriteTimeout(detail) => {
                ConsistencyLevel::length()
                    + length_int() * 2
                    + length_string(detail.write_type.as_str())
            }
            ErrorBody::ReadTimeout(_) => ConsistencyLevel::length() + length_int() * 2 + length_byte(),
            ErrorBody::ReadFailure(detail) => {
                ConsistencyLevel::length()
                    + length_int() * 2
                    + detail.reasons.length(version)
                    + length_byte()
            }
            ErrorBody::WriteFailure(detail) => {
                ConsistencyLevel::length()
                    + length_int() * 2
                    + detail.reasons.length(version)
                    + length_string(detail.write_type.as_str())
            }
            ErrorBody::FunctionFailure {
                keyspace,
                function,
                arg_types,
            } => {
                length_string(keyspace)
                    + length_string(function)
                    + crate::primitives::length_string_list(arg_types)
            }
            ErrorBody::AlreadyExists(detail) => {
                length_string(&detail.keyspace) + length_string(&detail.table)
            }
            ErrorBody::Unprepared { unknown_id } => {
                crate::primitives::length_short_bytes(unknown_id)
            }
            ErrorBody::ServerError
            | ErrorBody::ProtocolError
            | ErrorBody::AuthenticationError
            | ErrorBody::Overloaded
            | ErrorBody::IsBootstrapping
            | ErrorBody::TruncateError
            | ErrorBody::SyntaxError
            | ErrorBody::Unauthorized
            | ErrorBody::Invalid
            | ErrorBody::ConfigError
            | ErrorBody::Unknown { .. } => 0,
        };
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn write_timeout_v3_roundtrip() {
        // A Simple-write timeout with one of three nodes acknowledged.
        let msg = ErrorMessage {
            body: ErrorBody::WriteTimeout(WriteTimeoutDetail {
                consistency: ConsistencyLevel::One,
                received: 1,
                block_for: 2,
                write_type: WriteType::Simple,
            }),
            message: "timed out".into(),
        };
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, ProtocolVersion::V3).unwrap();
        assert_eq!(buf.len(), msg.length(ProtocolVersion::V3));
        let mut frozen = buf.freeze();
        assert_eq!(ErrorMessage::decode(&mut frozen, ProtocolVersion::V3).unwrap(), msg);
    }

    #[test]
    fn server_error_boom_vector() {
        let msg = ErrorMessage {
            body: ErrorBody::ServerError,
            message: "BOOM".into(),
        };
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, ProtocolVersion::V3).unwrap();
        assert_eq!(
            &buf[..],
            &[0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x42, 0x4F, 0x4F, 0x4D]
        );
        let mut frozen = buf.freeze();
        assert_eq!(ErrorMessage::decode(&mut frozen, ProtocolVersion::V3).unwrap(), msg);
    }

    #[test]
    fn unavailable_boom_vector() {
        let msg = ErrorMessage {
            body: ErrorBody::Unavailable(UnavailableDetail {
                consistency: ConsistencyLevel::LocalQuorum,
                required: 3,
                alive: 2,
            }),
            message: "BOOM".into(),
        };
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, ProtocolVersion::V3).unwrap();
        assert_eq!(
            &buf[..],
            &[
                0x00, 0x00, 0x10, 0x00, 0x00, 0x04, 0x42, 0x4F, 0x4F, 0x4D, 0x00, 0x06, 0x00,
                0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x02
            ]
        );
        let mut frozen = buf.freeze();
        assert_eq!(ErrorMessage::decode(&mut frozen, ProtocolVersion::V3).unwrap(), msg);
    }

    #[test]
    fn read_failure_count_form_pre_v5() {
        let msg = ErrorMessage {
            body: ErrorBody::ReadFailure(ReadFailureDetail {
                consistency: ConsistencyLevel::Quorum,
                received: 1,
                block_for: 3,
                reasons: FailureReasons::Count(2),
                data_present: true,
            }),
            message: "read failed".into(),
        };
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), msg.length(ProtocolVersion::V4));
        let mut frozen = buf.freeze();
        assert_eq!(ErrorMessage::decode(&mut frozen, ProtocolVersion::V4).unwrap(), msg);
    }

    #[test]
    fn write_failure_map_form_v5() {
        // On v5, per-node failure reasons use the inetaddr map, not a count.
        let msg = ErrorMessage {
            body: ErrorBody::WriteFailure(WriteFailureDetail {
                consistency: ConsistencyLevel::Quorum,
                received: 1,
                block_for: 3,
                reasons: FailureReasons::PerNode(vec![(
                    InetAddr("192.168.1.1".parse().unwrap()),
                    0x0001,
                )]),
                write_type: WriteType::Simple,
            }),
            message: "write failed".into(),
        };
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, ProtocolVersion::V5Beta).unwrap();
        assert_eq!(buf.len(), msg.length(ProtocolVersion::V5Beta));
        let mut frozen = buf.freeze();
        assert_eq!(
            ErrorMessage::decode(&mut frozen, ProtocolVersion::V5Beta).unwrap(),
            msg
        );
    }

    #[test]
    fn unknown_code_preserved() {
        let mut buf = BytesMut::new();
        encode_int(0x9999, &mut buf);
        encode_string("mystery", &mut buf).unwrap();
        let mut frozen = buf.freeze();
        let decoded = ErrorMessage::decode(&mut frozen, ProtocolVersion::V4).unwrap();
        assert_eq!(decoded.body, ErrorBody::Unknown { code: 0x9999 });
        assert_eq!(decoded.message, "mystery");
    }

    #[test]
    fn already_exists_roundtrips() {
        let msg = ErrorMessage {
            body: ErrorBody::AlreadyExists(AlreadyExistsDetail {
                keyspace: "ks1".into(),
                table: "t1".into(),
            }),
            message: "already exists".into(),
        };
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, ProtocolVersion::V4).unwrap();
        let mut frozen = buf.freeze();
        assert_eq!(ErrorMessage::decode(&mut frozen, ProtocolVersion::V4).unwrap(), msg);
    }
}
