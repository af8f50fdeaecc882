//! `EVENT` (opcode 0x0C): a server-pushed notification, one of
//! SCHEMA_CHANGE/STATUS_CHANGE/TOPOLOGY_CHANGE.

use bytes::{Buf, BufMut};

use super::result::SchemaChange;
use crate::error::{Error, Result};
use crate::inet::Inet;
use crate::primitives::{decode_string, encode_string, length_string};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChangeType {
    NewNode,
    RemovedNode,
}

impl TopologyChangeType {
    fn as_str(self) -> &'static str {
        match self {
            TopologyChangeType::NewNode => "NEW_NODE",
            TopologyChangeType::RemovedNode => "REMOVED_NODE",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "NEW_NODE" => TopologyChangeType::NewNode,
            "REMOVED_NODE" => TopologyChangeType::RemovedNode,
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown topology change type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChangeType {
    Up,
    Down,
}

impl StatusChangeType {
    /// Canonical spelling; no client should ever see anything else,
    /// regardless of what older servers emitted.
    fn as_str(self) -> &'static str {
        match self {
            StatusChangeType::Up => "UP",
            StatusChangeType::Down => "DOWN",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "UP" => StatusChangeType::Up,
            "DOWN" => StatusChangeType::Down,
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown status change type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SchemaChange(SchemaChange),
    StatusChange {
        change_type: StatusChangeType,
        node: Inet,
    },
    TopologyChange {
        change_type: TopologyChangeType,
        node: Inet,
    },
}

impl Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::SchemaChange(_) => "SCHEMA_CHANGE",
            Event::StatusChange { .. } => "STATUS_CHANGE",
            Event::TopologyChange { .. } => "TOPOLOGY_CHANGE",
        }
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        encode_string(self.event_type(), sink)?;
        match self {
            Event::SchemaChange(change) => change.encode(sink, version)?,
            Event::StatusChange { change_type, node } => {
                encode_string(change_type.as_str(), sink)?;
                node.encode(sink);
            }
            Event::TopologyChange { change_type, node } => {
                encode_string(change_type.as_str(), sink)?;
                node.encode(sink);
            }
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let event_type = decode_string(source)?;
        Ok(match event_type.as_str() {
            "SCHEMA_CHANGE" => Event::SchemaChange(SchemaChange::decode(source, version)?),
            "STATUS_CHANGE" => Event::StatusChange {
                change_type: StatusChangeType::parse(&decode_string(source)?)?,
                node: Inet::decode(source)?,
            },
            "TOPOLOGY_CHANGE" => Event::TopologyChange {
                change_type: TopologyChangeType::parse(&decode_string(source)?)?,
                node: Inet::decode(source)?,
            },
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown event type {other}"
                )))
            }
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> Result<usize> {
        let mut len = length_string(self.event_type());
        len += match self {
            Event::SchemaChange(change) => change.length(),
            Event::StatusChange { change_type, node } => {
                length_string(change_type.as_str()) + node.length()
            }
            Event::TopologyChange { change_type, node } => {
                length_string(change_type.as_str()) + node.length()
            }
        };
        let _ = version;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::result::{SchemaChangeType, SchemaChangeTarget};
    use bytes::BytesMut;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn status_change_up_vector() {
        // UP 192.168.1.1 with no port field, the shape STATUS_CHANGE uses.
        let event = Event::StatusChange {
            change_type: StatusChangeType::Up,
            node: Inet::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 9042),
        };
        let mut buf = BytesMut::new();
        event.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), event.length(ProtocolVersion::V4).unwrap());

        let mut expected = Vec::new();
        expected.extend_from_slice(&13i16.to_be_bytes());
        expected.extend_from_slice(b"STATUS_CHANGE");
        expected.extend_from_slice(&2i16.to_be_bytes());
        expected.extend_from_slice(b"UP");
        expected.extend_from_slice(&[0x04, 0xC0, 0xA8, 0x01, 0x01, 0x00, 0x00, 0x23, 0x52]);
        assert_eq!(&buf[..], &expected[..]);

        let mut frozen = buf.freeze();
        assert_eq!(Event::decode(&mut frozen, ProtocolVersion::V4).unwrap(), event);
    }

    #[test]
    fn schema_change_created_function_requires_v4() {
        // CREATED FUNCTION events only exist from v4 onward.
        let event = Event::SchemaChange(SchemaChange {
            change_type: SchemaChangeType::Created,
            keyspace: "ks1".into(),
            target: SchemaChangeTarget::Function {
                name: "func1".into(),
                arg_types: vec!["int".into()],
            },
        });
        let mut buf = BytesMut::new();
        assert!(event.encode(&mut buf, ProtocolVersion::V3).is_err());

        let mut buf = BytesMut::new();
        event.encode(&mut buf, ProtocolVersion::V4).unwrap();
        let mut frozen = buf.freeze();
        assert_eq!(Event::decode(&mut frozen, ProtocolVersion::V4).unwrap(), event);
    }

    #[test]
    fn topology_change_roundtrips() {
        let event = Event::TopologyChange {
            change_type: TopologyChangeType::NewNode,
            node: Inet::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 7000),
        };
        let mut buf = BytesMut::new();
        event.encode(&mut buf, ProtocolVersion::V4).unwrap();
        assert_eq!(buf.len(), event.length(ProtocolVersion::V4).unwrap());
        let mut frozen = buf.freeze();
        assert_eq!(Event::decode(&mut frozen, ProtocolVersion::V4).unwrap(), event);
    }

    #[test]
    fn unknown_event_type_rejected() {
        let mut buf = BytesMut::new();
        encode_string("MYSTERY_CHANGE", &mut buf).unwrap();
        let mut frozen = buf.freeze();
        assert!(Event::decode(&mut frozen, ProtocolVersion::V4).is_err());
    }
}
