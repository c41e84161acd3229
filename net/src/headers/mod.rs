// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Definition of [`Headers`] and related methods and types.
#![allow(missing_docs, clippy::pedantic)] // temporary

//! Parsed packet headers.
//!
//! Scoped to exactly what the forwarding graph needs to look at: an
//! Ethernet header and, if present, an IPv4 header. A packet whose
//! ethertype isn't IPv4 still parses fine; `net` is just `None`, and it is
//! up to `classify` to decide what (if anything) happens to it next.

use crate::eth::{Eth, EthError, EthNext};
use crate::ipv4::Ipv4;
use crate::parse::{
    DeParse, DeParseError, IntoNonZeroUSize, LengthError, Parse, ParseError, ParsePayload, Reader,
};
use std::num::NonZero;

#[derive(Debug, Default, Clone)]
pub struct Headers {
    pub eth: Option<Eth>,
    pub net: Option<Net>,
    /// An outer IPv4 header prepended ahead of `net` by a tunnel egress
    /// node (`ipip_output`). Never populated by [`Headers::parse`]:
    /// decapsulating inbound tunnel traffic is out of scope for this
    /// crate, which only knows how to originate an encapsulating header,
    /// not strip one.
    pub encap: Option<Ipv4>,
}

impl Headers {
    #[must_use]
    pub fn new(eth: Eth) -> Self {
        Self {
            eth: Some(eth),
            net: None,
            encap: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Net {
    Ipv4(Ipv4),
}

impl Net {
    #[must_use]
    pub fn source(&self) -> std::net::Ipv4Addr {
        match self {
            Net::Ipv4(ip) => ip.source().inner(),
        }
    }
    #[must_use]
    pub fn destination(&self) -> std::net::Ipv4Addr {
        match self {
            Net::Ipv4(ip) => ip.destination(),
        }
    }
}

/// Access to the parsed headers carried by a packet.
pub trait TryHeaders {
    fn headers(&self) -> &Headers;
}

pub trait TryHeadersMut {
    fn headers_mut(&mut self) -> &mut Headers;
}

pub trait TryEth: TryHeaders {
    fn try_eth(&self) -> Option<&Eth> {
        self.headers().eth.as_ref()
    }
}
impl<T: TryHeaders> TryEth for T {}

pub trait TryIp: TryHeaders {
    fn try_ip(&self) -> Option<&Net> {
        self.headers().net.as_ref()
    }
}
impl<T: TryHeaders> TryIp for T {}

impl TryHeaders for Headers {
    fn headers(&self) -> &Headers {
        self
    }
}
impl TryHeadersMut for Headers {
    fn headers_mut(&mut self) -> &mut Headers {
        self
    }
}

impl Parse for Headers {
    type Error = EthError;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<u16>), ParseError<Self::Error>> {
        if buf.len() > u16::MAX as usize {
            return Err(ParseError::BufferTooLong(buf.len()));
        }
        let mut cursor = Reader::new(buf);
        let (eth, _eth_consumed) = cursor.parse::<Eth>()?;
        // A malformed IPv4 header below an otherwise-valid Ethernet frame isn't
        // a parse failure for the frame itself; it is `classify`'s job to
        // notice there's no usable `net` and drop the packet with the right
        // reason, so `parse_payload` swallows the error and we just get `None`.
        let net = eth
            .parse_payload(&mut cursor)
            .map(|EthNext::Ipv4(ip)| Net::Ipv4(ip));
        #[allow(clippy::cast_possible_truncation)] // buf.len() bounded above
        let consumed = NonZero::new(buf.len() as u16).unwrap_or(NonZero::<u16>::MIN);
        let headers = Headers {
            eth: Some(eth),
            net,
            encap: None,
        };
        Ok((headers, consumed))
    }
}

impl DeParse for Headers {
    type Error = ();

    fn size(&self) -> NonZero<u16> {
        let eth = self.eth.as_ref().map_or(0, |e| e.size().get());
        let encap = self.encap.as_ref().map_or(0, |ip| ip.size().get());
        let net = match &self.net {
            Some(Net::Ipv4(ip)) => ip.size().get(),
            None => 0,
        };
        NonZero::new(eth + encap + net).unwrap_or(NonZero::<u16>::MIN)
    }

    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<u16>, DeParseError<Self::Error>> {
        if buf.len() > u16::MAX as usize {
            return Err(DeParseError::BufferTooLong(buf.len()));
        }
        let mut written = 0usize;
        if let Some(eth) = &self.eth {
            let n = eth
                .deparse(&mut buf[written..])
                .map_err(discard_inner)?
                .get();
            written += n as usize;
        }
        if let Some(encap) = &self.encap {
            if written >= buf.len() {
                return Err(DeParseError::Length(LengthError {
                    expected: encap.size().into_non_zero_usize(),
                    actual: 0,
                }));
            }
            let n = encap
                .deparse(&mut buf[written..])
                .map_err(discard_inner)?
                .get();
            written += n as usize;
        }
        if let Some(Net::Ipv4(ip)) = &self.net {
            if written >= buf.len() {
                return Err(DeParseError::Length(LengthError {
                    expected: ip.size().into_non_zero_usize(),
                    actual: 0,
                }));
            }
            let n = ip
                .deparse(&mut buf[written..])
                .map_err(discard_inner)?
                .get();
            written += n as usize;
        }
        #[allow(clippy::cast_possible_truncation)] // bounded by buf.len() check above
        NonZero::new(written as u16).map_or_else(
            || {
                Err(DeParseError::Length(LengthError {
                    expected: NonZero::<usize>::MIN,
                    actual: 0,
                }))
            },
            Ok,
        )
    }
}

fn discard_inner<E>(e: DeParseError<E>) -> DeParseError<()> {
    match e {
        DeParseError::Length(l) => DeParseError::Length(l),
        DeParseError::Invalid(_) => DeParseError::Invalid(()),
        DeParseError::BufferTooLong(n) => DeParseError::BufferTooLong(n),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::eth::EthType;
    use crate::eth::mac::{DestinationMac, Mac, SourceMac};

    #[test]
    fn headers_without_ipv4_still_parse() {
        let eth = Eth::new(
            SourceMac::new(Mac([0x02, 0, 0, 0, 0, 1])).unwrap(),
            DestinationMac::new(Mac([0x02, 0, 0, 0, 0, 2])).unwrap(),
            EthType::ARP,
        );
        let headers = Headers::new(eth);
        let mut buf = [0u8; 64];
        let written = headers.deparse(&mut buf).unwrap();
        let (parsed, _) = Headers::parse(&buf[..written.get()]).unwrap();
        assert!(parsed.net.is_none());
    }
}
