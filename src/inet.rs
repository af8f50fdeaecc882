//! The `inet` and `inetaddr` primitives: a length-tagged IP address,
//! optionally followed by a port.

use std::net::IpAddr;

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};
use crate::primitives::{decode_byte, decode_int, encode_byte, encode_int};

fn encode_addr(addr: &IpAddr, sink: &mut impl BufMut) {
    match addr {
        IpAddr::V4(v4) => {
            encode_byte(4, sink);
            sink.put_slice(&v4.octets());
        }
        IpAddr::V6(v6) => {
            encode_byte(16, sink);
            sink.put_slice(&v6.octets());
        }
    }
}

fn decode_addr(source: &mut impl Buf) -> Result<IpAddr> {
    let len = decode_byte(source)?;
    match len {
        4 => {
            if source.remaining() < 4 {
                return Err(Error::short_read(4, source.remaining()));
            }
            let mut octets = [0u8; 4];
            source.copy_to_slice(&mut octets);
            Ok(IpAddr::from(octets))
        }
        16 => {
            if source.remaining() < 16 {
                return Err(Error::short_read(16, source.remaining()));
            }
            let mut octets = [0u8; 16];
            source.copy_to_slice(&mut octets);
            Ok(IpAddr::from(octets))
        }
        other => Err(Error::invalid_encoding(format!(
            "invalid inet address length {other}"
        ))),
    }
}

fn addr_len(addr: &IpAddr) -> usize {
    match addr {
        IpAddr::V4(_) => 1 + 4,
        IpAddr::V6(_) => 1 + 16,
    }
}

/// `inet`: address plus port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Inet {
    pub addr: IpAddr,
    pub port: i32,
}

impl Inet {
    pub fn new(addr: IpAddr, port: i32) -> Self {
        Self { addr, port }
    }

    pub fn encode(&self, sink: &mut impl BufMut) {
        encode_addr(&self.addr, sink);
        encode_int(self.port, sink);
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        let addr = decode_addr(source)?;
        let port = decode_int(source)?;
        Ok(Inet { addr, port })
    }

    pub fn length(&self) -> usize {
        addr_len(&self.addr) + 4
    }
}

/// `inetaddr`: address only, no port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InetAddr(pub IpAddr);

impl InetAddr {
    pub fn encode(&self, sink: &mut impl BufMut) {
        encode_addr(&self.0, sink);
    }

    pub fn decode(source: &mut impl Buf) -> Result<Self> {
        Ok(InetAddr(decode_addr(source)?))
    }

    pub fn length(&self) -> usize {
        addr_len(&self.0)
    }
}
