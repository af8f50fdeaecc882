use crate::version::ProtocolVersion;

/// Everything that can go wrong while encoding or decoding a native-protocol
/// message body.
///
/// These are the five semantic kinds the protocol distinguishes; none of them
/// carry the remaining buffer or attempt to describe how to resynchronize —
/// that is the outer frame layer's job.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("short read: needed {needed} bytes, {available} available")]
    ShortRead { needed: usize, available: usize },

    #[error("write error")]
    WriteError(#[from] std::io::Error),

    #[error("{what} is not supported in protocol version {actual:?} (requires >= {minimum:?})")]
    UnsupportedVersion {
        what: &'static str,
        minimum: ProtocolVersion,
        actual: ProtocolVersion,
    },
}

impl Error {
    pub(crate) fn short_read(needed: usize, available: usize) -> Self {
        Error::ShortRead { needed, available }
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_encoding(msg: impl Into<String>) -> Self {
        Error::InvalidEncoding(msg.into())
    }

    pub(crate) fn unsupported_version(
        what: &'static str,
        minimum: ProtocolVersion,
        actual: ProtocolVersion,
    ) -> Self {
        tracing::debug!(
            what,
            ?minimum,
            ?actual,
            "rejecting version-gated field outside its supported range"
        );
        Error::UnsupportedVersion {
            what,
            minimum,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
