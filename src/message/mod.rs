//! Per-opcode message bodies: the `Message` sum type and the `OpCode` each
//! variant is carried under on the wire.

pub mod batch;
pub mod error_body;
pub mod event;
pub mod execute;
pub mod prepare;
pub mod query;
pub mod query_options;
pub mod result;
pub mod revise;
pub mod simple;

use bytes::{Buf, BufMut};

pub use batch::Batch;
pub use error_body::ErrorMessage;
pub use event::Event;
pub use execute::Execute;
pub use prepare::Prepare;
pub use query::Query;
pub use query_options::QueryOptions;
pub use result::ResultMessage;
pub use revise::Revise;
pub use simple::{Authenticate, AuthToken, Register, Startup, Supported};

use crate::error::{Error, Result};
use crate::version::ProtocolVersion;

/// The byte identifying a message's body shape on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Error,
    Startup,
    Ready,
    Authenticate,
    Options,
    Supported,
    Query,
    Result,
    Prepare,
    Execute,
    Register,
    Event,
    Batch,
    AuthChallenge,
    AuthResponse,
    AuthSuccess,
    /// DSE-only; collides with no open-protocol opcode.
    Revise,
}

impl OpCode {
    pub fn code(self) -> u8 {
        match self {
            OpCode::Error => 0x00,
            OpCode::Startup => 0x01,
            OpCode::Ready => 0x02,
            OpCode::Authenticate => 0x03,
            OpCode::Options => 0x05,
            OpCode::Supported => 0x06,
            OpCode::Query => 0x07,
            OpCode::Result => 0x08,
            OpCode::Prepare => 0x09,
            OpCode::Execute => 0x0A,
            OpCode::Register => 0x0B,
            OpCode::Event => 0x0C,
            OpCode::Batch => 0x0D,
            OpCode::AuthChallenge => 0x0E,
            OpCode::AuthResponse => 0x0F,
            OpCode::AuthSuccess => 0x10,
            OpCode::Revise => 0xFF,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0x00 => OpCode::Error,
            0x01 => OpCode::Startup,
            0x02 => OpCode::Ready,
            0x03 => OpCode::Authenticate,
            0x05 => OpCode::Options,
            0x06 => OpCode::Supported,
            0x07 => OpCode::Query,
            0x08 => OpCode::Result,
            0x09 => OpCode::Prepare,
            0x0A => OpCode::Execute,
            0x0B => OpCode::Register,
            0x0C => OpCode::Event,
            0x0D => OpCode::Batch,
            0x0E => OpCode::AuthChallenge,
            0x0F => OpCode::AuthResponse,
            0x10 => OpCode::AuthSuccess,
            0xFF => OpCode::Revise,
            other => {
                return Err(Error::invalid_encoding(format!("unknown opcode {other:#04x}")))
            }
        })
    }
}

/// Every message body this crate knows how to encode or decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Error(ErrorMessage),
    Startup(Startup),
    Ready,
    Authenticate(Authenticate),
    Options,
    Supported(Supported),
    Query(Query),
    Result(ResultMessage),
    Prepare(Prepare),
    Execute(Execute),
    Register(Register),
    Event(Event),
    Batch(Batch),
    AuthChallenge(AuthToken),
    AuthResponse(AuthToken),
    AuthSuccess(AuthToken),
    Revise(Revise),
}

impl Message {
    pub fn opcode(&self) -> OpCode {
        match self {
            Message::Error(_) => OpCode::Error,
            Message::Startup(_) => OpCode::Startup,
            Message::Ready => OpCode::Ready,
            Message::Authenticate(_) => OpCode::Authenticate,
            Message::Options => OpCode::Options,
            Message::Supported(_) => OpCode::Supported,
            Message::Query(_) => OpCode::Query,
            Message::Result(_) => OpCode::Result,
            Message::Prepare(_) => OpCode::Prepare,
            Message::Execute(_) => OpCode::Execute,
            Message::Register(_) => OpCode::Register,
            Message::Event(_) => OpCode::Event,
            Message::Batch(_) => OpCode::Batch,
            Message::AuthChallenge(_) => OpCode::AuthChallenge,
            Message::AuthResponse(_) => OpCode::AuthResponse,
            Message::AuthSuccess(_) => OpCode::AuthSuccess,
            Message::Revise(_) => OpCode::Revise,
        }
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        match self {
            Message::Error(msg) => msg.encode(sink, version),
            Message::Startup(msg) => msg.encode(sink),
            Message::Ready => Ok(()),
            Message::Authenticate(msg) => msg.encode(sink),
            Message::Options => Ok(()),
            Message::Supported(msg) => msg.encode(sink),
            Message::Query(msg) => msg.encode(sink, version),
            Message::Result(msg) => msg.encode(sink, version),
            Message::Prepare(msg) => msg.encode(sink, version),
            Message::Execute(msg) => msg.encode(sink, version),
            Message::Register(msg) => msg.encode(sink),
            Message::Event(msg) => msg.encode(sink, version),
            Message::Batch(msg) => msg.encode(sink, version),
            Message::AuthChallenge(msg) => msg.encode(sink),
            Message::AuthResponse(msg) => msg.encode(sink),
            Message::AuthSuccess(msg) => msg.encode(sink),
            Message::Revise(msg) => msg.encode(sink, version),
        }
    }

    pub fn decode(opcode: OpCode, source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        tracing::trace!(?opcode, ?version, remaining = source.remaining(), "decoding message body");
        Ok(match opcode {
            OpCode::Error => Message::Error(ErrorMessage::decode(source, version)?),
            OpCode::Startup => Message::Startup(Startup::decode(source)?),
            OpCode::Ready => Message::Ready,
            OpCode::Authenticate => Message::Authenticate(Authenticate::decode(source)?),
            OpCode::Options => Message::Options,
            OpCode::Supported => Message::Supported(Supported::decode(source)?),
            OpCode::Query => Message::Query(Query::decode(source, version)?),
            OpCode::Result => Message::Result(ResultMessage::decode(source, version)?),
            OpCode::Prepare => Message::Prepare(Prepare::decode(source, version)?),
            OpCode::Execute => Message::Execute(Execute::decode(source, version)?),
            OpCode::Register => Message::Register(Register::decode(source)?),
            OpCode::Event => Message::Event(Event::decode(source, version)?),
            OpCode::Batch => Message::Batch(Batch::decode(source, version)?),
            OpCode::AuthChallenge => Message::AuthChallenge(AuthToken::decode(source)?),
            OpCode::AuthResponse => Message::AuthResponse(AuthToken::decode(source)?),
            OpCode::AuthSuccess => Message::AuthSuccess(AuthToken::decode(source)?),
            OpCode::Revise => Message::Revise(Revise::decode(source, version)?),
        })
    }

    pub fn encoded_length(&self, version: ProtocolVersion) -> Result<usize> {
        Ok(match self {
            Message::Error(msg) => msg.length(version),
            Message::Startup(msg) => msg.length(),
            Message::Ready => 0,
            Message::Authenticate(msg) => msg.length(),
            Message::Options => 0,
            Message::Supported(msg) => msg.length(),
            Message::Query(msg) => msg.length(version),
            Message::Result(msg) => msg.length(version)?,
            Message::Prepare(msg) => msg.length(version),
            Message::Execute(msg) => msg.length(version)?,
            Message::Register(msg) => msg.length(),
            Message::Event(msg) => msg.length(version)?,
            Message::Batch(msg) => msg.length(version),
            Message::AuthChallenge(msg) => msg.length(),
            Message::AuthResponse(msg) => msg.length(),
            Message::AuthSuccess(msg) => msg.length(),
            Message::Revise(msg) => msg.length(version)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::ConsistencyLevel;
    use bytes::BytesMut;

    #[test]
    fn opcode_roundtrips() {
        for opcode in [
            OpCode::Error,
            OpCode::Startup,
            OpCode::Ready,
            OpCode::Authenticate,
            OpCode::Options,
            OpCode::Supported,
            OpCode::Query,
            OpCode::Result,
            OpCode::Prepare,
            OpCode::Execute,
            OpCode::Register,
            OpCode::Event,
            OpCode::Batch,
            OpCode::AuthChallenge,
            OpCode::AuthResponse,
            OpCode::AuthSuccess,
            OpCode::Revise,
        ] {
            assert_eq!(OpCode::from_code(opcode.code()).unwrap(), opcode);
        }
    }

    #[test]
    fn unknown_opcode_rejected() {
        assert!(OpCode::from_code(0x04).is_err());
    }

    #[test]
    fn message_roundtrips_through_opcode_dispatch() {
        let message = Message::Query(Query {
            query: "SELECT * FROM t".into(),
            options: QueryOptions::new(ConsistencyLevel::One),
        });
        let mut buf = BytesMut::new();
        message.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), message.encoded_length(ProtocolVersion::V4).unwrap());
        let mut frozen = buf.freeze();
        let decoded = Message::decode(message.opcode(), &mut frozen, ProtocolVersion::V4).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn ready_and_options_are_empty_bodies() {
        let mut buf = BytesMut::new();
        Message::Ready.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), 0);

        let mut buf = BytesMut::new();
        Message::Options.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), 0);
    }
}
