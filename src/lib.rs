//! Wire codec for the Cassandra/DSE native protocol: primitives, the
//! recursive data-type descriptor, and per-opcode message bodies across
//! protocol v3, v4, v5 (beta), and DSE v1/v2.
//!
//! This crate is the codec layer only. It has no opinion on frame headers,
//! compression, connections, TLS, or CQL itself — see the crate-level
//! design notes in `DESIGN.md` for where those boundaries sit.
//!
//! The typical entry point is [`registry::CodecGroup`], which pins a
//! [`version::ProtocolVersion`] and dispatches [`message::Message`] values
//! through the matching per-opcode codec.

pub mod consistency;
pub mod datatype;
pub mod error;
pub mod inet;
pub mod message;
pub mod primitives;
pub mod registry;
pub mod value;
pub mod version;

pub use error::{Error, Result};
pub use message::{Message, OpCode};
pub use registry::CodecGroup;
pub use version::ProtocolVersion;
