// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Display of Packets

use crate::eth::Eth;
use crate::headers::Net;
use crate::ipv4::Ipv4;
use crate::packet::PacketMeta;

use crate::buffer::PacketBufferMut;
use crate::headers::Headers;
use crate::packet::Packet;
use std::fmt::{Display, Formatter};

impl Display for Eth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "  Eth : {} -> {} ({:?})",
            self.source(),
            self.destination(),
            self.ether_type(),
        )
    }
}
impl Display for Ipv4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "  IPv4: {} -> {} proto: {:?}",
            self.source(),
            self.destination(),
            self.protocol()
        )?;
        writeln!(
            f,
            "        header-length: {} total-length: {} identification: {} frag-offset: {}",
            self.header_len(),
            self.total_len(),
            self.identification(),
            self.fragment_offset()
        )?;
        writeln!(
            f,
            "        DF: {} MF: {} DSCP: {:?} ECN: {:?} TTL: {:?}",
            self.dont_fragment(),
            self.more_fragments(),
            self.dscp(),
            self.ecn(),
            self.ttl()
        )
    }
}
impl Display for Net {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Net::Ipv4(v4) => v4.fmt(f),
        }
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        if let Some(eth) = &self.eth {
            write!(f, "{eth}")?;
        }
        if let Some(net) = &self.net {
            write!(f, "{net}")?;
        }
        Ok(())
    }
}

impl Display for PacketMeta {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  metadata:")?;
        writeln!(f, "    iif: {:?} oif: {:?}", self.iif, self.oif)?;
        writeln!(f, "    done: {:?}", self.done)
    }
}

/// Render `raw` as a classic 16-bytes-per-row hex dump.
fn write_hex(f: &mut Formatter<'_>, raw: &[u8]) -> std::fmt::Result {
    for chunk in raw.chunks(16) {
        for byte in chunk {
            write!(f, "{byte:02x} ")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn fmt_packet_buf<Buf: PacketBufferMut>(
    f: &mut Formatter<'_>,
    packet: &Packet<Buf>,
) -> std::fmt::Result {
    if let Some(buf) = packet.get_buf() {
        let raw = buf.as_ref();
        writeln!(f, "{:─<width$}", "─", width = 100)?;
        write_hex(f, raw)?;
        writeln!(f, "{:─<width$}", "─", width = 100)?;
        writeln!(
            f,
            "buffer: {} data octets (headroom: {} tailroom: {}))",
            raw.len(),
            buf.headroom(),
            buf.tailroom()
        )?;
    } else {
        writeln!(f, "buffer: None")?;
    }
    Ok(())
}

impl<Buf: PacketBufferMut> Display for Packet<Buf> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fmt_packet_buf(f, self)?;
        writeln!(f, "consumed: {} octets", self.get_consumed())?;
        write!(f, "headers: {}", self.get_headers())?;
        write!(f, "{}", self.get_meta())?;
        Ok(())
    }
}
