// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The control socket's binary wire format.
//!
//! Every exchange is a fixed-size header followed by a typed payload,
//! decoded the same way the forwarding graph decodes packet headers: a
//! [`bytes::Buf`]/[`bytes::BufMut`] cursor over a flat byte slice, no
//! intermediate allocation beyond the buffer itself.

use bytes::{Buf, BufMut};
use ipnet::Ipv4Net;
use net::eth::mac::Mac;
use net::interface::AdminState;
use net::packet::InterfaceId;
use ports::{PortId, TxQueueIndex};
use routing::{FwAction, Interface, InterfaceKind, NextHop, NextHopId, Tunnel, WorkerId};
use std::net::Ipv4Addr;
use thiserror::Error;

/// No exchange, request or response, may exceed this many bytes including
/// its header.
pub const MAX_MESSAGE_LEN: usize = 128 * 1024;

/// Size in bytes of a [`RequestHeader`] or [`ResponseHeader`] on the wire.
pub const HEADER_LEN: usize = 12;

/// Module ids occupying the upper 16 bits of a request's `type` field.
pub mod module {
    /// FIB route operations.
    pub const FIB: u16 = 1;
    /// Next-hop table operations.
    pub const NEXT_HOP: u16 = 2;
    /// Interface table operations.
    pub const INTERFACE: u16 = 3;
    /// Per-worker TX queue assignment operations.
    pub const TXQ: u16 = 4;
}

/// Request ids occupying the lower 16 bits of a request's `type` field,
/// scoped per [`module`].
pub mod request {
    /// [`module::FIB`]: install or replace a route.
    pub const FIB_ADD: u16 = 1;
    /// [`module::FIB`]: withdraw a route.
    pub const FIB_DELETE: u16 = 2;
    /// [`module::NEXT_HOP`]: install or replace a next hop.
    pub const NEXT_HOP_SET: u16 = 1;
    /// [`module::NEXT_HOP`]: remove a next hop.
    pub const NEXT_HOP_REMOVE: u16 = 2;
    /// [`module::INTERFACE`]: install or replace an interface.
    pub const INTERFACE_SET: u16 = 1;
    /// [`module::INTERFACE`]: remove an interface.
    pub const INTERFACE_REMOVE: u16 = 2;
    /// [`module::INTERFACE`]: flip an interface's administrative state.
    pub const INTERFACE_ADMIN_STATE: u16 = 3;
    /// [`module::TXQ`]: assign a `(port, queue)` pair to a worker.
    pub const TXQ_ASSIGN: u16 = 1;
    /// [`module::TXQ`]: remove a worker's assignment for a port.
    pub const TXQ_UNASSIGN: u16 = 2;
}

/// A request's `type` field: a 16-bit module id over a 16-bit request id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MessageType {
    /// Which table or subsystem the request addresses.
    pub module: u16,
    /// Which operation within that module.
    pub request: u16,
}

impl MessageType {
    /// Build a message type from its module and request ids.
    #[must_use]
    pub const fn new(module: u16, request: u16) -> Self {
        Self { module, request }
    }

    /// Pack into the 32-bit wire representation.
    #[must_use]
    pub fn encode(self) -> u32 {
        u32::from(self.module) << 16 | u32::from(self.request)
    }

    /// Unpack from the 32-bit wire representation.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // shifted/masked into range before the cast
    pub fn decode(raw: u32) -> Self {
        Self {
            module: (raw >> 16) as u16,
            request: (raw & 0xFFFF) as u16,
        }
    }
}

/// A malformed exchange on the control wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A request or response declared a payload larger than
    /// [`MAX_MESSAGE_LEN`].
    #[error("payload of {0} bytes exceeds the {MAX_MESSAGE_LEN} byte limit")]
    TooLarge(usize),
    /// Fewer than [`HEADER_LEN`] bytes were available to decode a header.
    #[error("header truncated: need {HEADER_LEN} bytes, have {0}")]
    TruncatedHeader(usize),
    /// Fewer bytes were available than the header's `payload_len` promised.
    #[error("payload truncated: need {need} bytes, have {have}")]
    TruncatedPayload {
        /// Bytes the header's `payload_len` promised.
        need: usize,
        /// Bytes actually available.
        have: usize,
    },
    /// The request's module id has no known handler.
    #[error("unknown module id {0}")]
    UnknownModule(u16),
    /// The request's module id is known but its request id is not.
    #[error("unknown request id {module}/{request}")]
    UnknownRequest {
        /// The (known) module id.
        module: u16,
        /// The (unrecognized) request id within that module.
        request: u16,
    },
    /// The payload's byte layout did not match what the request id expects.
    #[error("malformed payload")]
    MalformedPayload,
}

/// A decoded request header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    /// Caller-chosen id echoed back in the matching [`ResponseHeader`].
    pub id: u32,
    /// Which operation this request invokes.
    pub message_type: MessageType,
    /// Length in bytes of the payload immediately following this header.
    pub payload_len: u32,
}

impl RequestHeader {
    /// Decode a header from the front of `buf`, without consuming the
    /// payload that follows it.
    ///
    /// # Errors
    /// Returns [`WireError::TruncatedHeader`] if fewer than [`HEADER_LEN`]
    /// bytes are available, or [`WireError::TooLarge`] if the declared
    /// payload length exceeds [`MAX_MESSAGE_LEN`].
    pub fn decode(buf: &mut impl Buf) -> Result<Self, WireError> {
        if buf.remaining() < HEADER_LEN {
            return Err(WireError::TruncatedHeader(buf.remaining()));
        }
        let id = buf.get_u32();
        let message_type = MessageType::decode(buf.get_u32());
        let payload_len = buf.get_u32();
        if payload_len as usize > MAX_MESSAGE_LEN {
            return Err(WireError::TooLarge(payload_len as usize));
        }
        Ok(Self {
            id,
            message_type,
            payload_len,
        })
    }

    /// Encode this header onto `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.id);
        buf.put_u32(self.message_type.encode());
        buf.put_u32(self.payload_len);
    }
}

/// A decoded response header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Echoes the request's [`RequestHeader::id`].
    pub for_id: u32,
    /// `0` on success, a POSIX errno value otherwise.
    pub status: u32,
    /// Length in bytes of the payload immediately following this header.
    pub payload_len: u32,
}

impl ResponseHeader {
    /// Decode a header from the front of `buf`.
    ///
    /// # Errors
    /// Returns [`WireError::TruncatedHeader`] if fewer than [`HEADER_LEN`]
    /// bytes are available, or [`WireError::TooLarge`] if the declared
    /// payload length exceeds [`MAX_MESSAGE_LEN`].
    pub fn decode(buf: &mut impl Buf) -> Result<Self, WireError> {
        if buf.remaining() < HEADER_LEN {
            return Err(WireError::TruncatedHeader(buf.remaining()));
        }
        let for_id = buf.get_u32();
        let status = buf.get_u32();
        let payload_len = buf.get_u32();
        if payload_len as usize > MAX_MESSAGE_LEN {
            return Err(WireError::TooLarge(payload_len as usize));
        }
        Ok(Self {
            for_id,
            status,
            payload_len,
        })
    }

    /// Encode this header onto `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.for_id);
        buf.put_u32(self.status);
        buf.put_u32(self.payload_len);
    }
}

fn put_option_addr(buf: &mut impl BufMut, addr: Option<Ipv4Addr>) {
    match addr {
        Some(addr) => {
            buf.put_u8(1);
            buf.put_u32(u32::from(addr));
        }
        None => buf.put_u8(0),
    }
}

fn get_option_addr(buf: &mut impl Buf) -> Result<Option<Ipv4Addr>, WireError> {
    if buf.remaining() < 1 {
        return Err(WireError::MalformedPayload);
    }
    if buf.get_u8() == 0 {
        return Ok(None);
    }
    if buf.remaining() < 4 {
        return Err(WireError::MalformedPayload);
    }
    Ok(Some(Ipv4Addr::from(buf.get_u32())))
}

fn put_mac(buf: &mut impl BufMut, mac: Mac) {
    buf.put_slice(&mac.0);
}

fn get_mac(buf: &mut impl Buf) -> Result<Mac, WireError> {
    if buf.remaining() < 6 {
        return Err(WireError::MalformedPayload);
    }
    let mut octets = [0_u8; 6];
    buf.copy_to_slice(&mut octets);
    Ok(Mac(octets))
}

fn put_str(buf: &mut impl BufMut, s: &str) {
    #[allow(clippy::cast_possible_truncation)] // names are capped well under u16::MAX bytes
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
}

fn get_str(buf: &mut impl Buf, max_len: usize) -> Result<String, WireError> {
    if buf.remaining() < 2 {
        return Err(WireError::MalformedPayload);
    }
    let len = usize::from(buf.get_u16());
    if len > max_len || buf.remaining() < len {
        return Err(WireError::MalformedPayload);
    }
    let mut bytes = vec![0_u8; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| WireError::MalformedPayload)
}

const INTERFACE_KIND_PHYSICAL: u8 = 0;
const INTERFACE_KIND_IPIP: u8 = 1;

fn put_interface(buf: &mut impl BufMut, interface: &Interface) {
    put_str(buf, &interface.name);
    buf.put_u8(match interface.admin_state {
        AdminState::Down => 0,
        AdminState::Up => 1,
    });
    put_option_addr(buf, interface.address);
    put_mac(buf, interface.mac);
    match interface.kind {
        InterfaceKind::Physical { port, queue } => {
            buf.put_u8(INTERFACE_KIND_PHYSICAL);
            buf.put_u16(port);
            buf.put_u16(queue);
        }
        InterfaceKind::IpIp { local } => {
            buf.put_u8(INTERFACE_KIND_IPIP);
            buf.put_u32(u32::from(local));
        }
    }
}

fn get_interface(buf: &mut impl Buf) -> Result<Interface, WireError> {
    let name = get_str(buf, 64)?;
    if buf.remaining() < 1 {
        return Err(WireError::MalformedPayload);
    }
    let admin_state = match buf.get_u8() {
        0 => AdminState::Down,
        1 => AdminState::Up,
        _ => return Err(WireError::MalformedPayload),
    };
    let address = get_option_addr(buf)?;
    let mac = get_mac(buf)?;
    if buf.remaining() < 1 {
        return Err(WireError::MalformedPayload);
    }
    let kind_tag = buf.get_u8();
    let kind = match kind_tag {
        INTERFACE_KIND_PHYSICAL => {
            if buf.remaining() < 4 {
                return Err(WireError::MalformedPayload);
            }
            let port = buf.get_u16();
            let queue = buf.get_u16();
            InterfaceKind::Physical { port, queue }
        }
        INTERFACE_KIND_IPIP => {
            if buf.remaining() < 4 {
                return Err(WireError::MalformedPayload);
            }
            let local = Ipv4Addr::from(buf.get_u32());
            InterfaceKind::IpIp { local }
        }
        _ => return Err(WireError::MalformedPayload),
    };
    Ok(Interface {
        name,
        admin_state,
        address,
        mac,
        kind,
    })
}

fn put_next_hop(buf: &mut impl BufMut, next_hop: &NextHop) {
    buf.put_u8(match next_hop.action {
        FwAction::Forward => 0,
        FwAction::Drop => 1,
    });
    put_option_addr(buf, next_hop.gateway);
    match next_hop.egress_interface {
        Some(iface) => {
            buf.put_u8(1);
            buf.put_u32(iface.get_id());
        }
        None => buf.put_u8(0),
    }
    match next_hop.tunnel {
        Some(tunnel) => {
            buf.put_u8(1);
            buf.put_u32(u32::from(tunnel.local));
            buf.put_u32(u32::from(tunnel.remote));
        }
        None => buf.put_u8(0),
    }
    put_mac(buf, next_hop.mac);
}

fn get_next_hop(buf: &mut impl Buf) -> Result<NextHop, WireError> {
    if buf.remaining() < 1 {
        return Err(WireError::MalformedPayload);
    }
    let action = match buf.get_u8() {
        0 => FwAction::Forward,
        1 => FwAction::Drop,
        _ => return Err(WireError::MalformedPayload),
    };
    let gateway = get_option_addr(buf)?;
    if buf.remaining() < 1 {
        return Err(WireError::MalformedPayload);
    }
    let egress_interface = if buf.get_u8() == 0 {
        None
    } else {
        if buf.remaining() < 4 {
            return Err(WireError::MalformedPayload);
        }
        Some(InterfaceId::new(buf.get_u32()))
    };
    if buf.remaining() < 1 {
        return Err(WireError::MalformedPayload);
    }
    let tunnel = if buf.get_u8() == 0 {
        None
    } else {
        if buf.remaining() < 8 {
            return Err(WireError::MalformedPayload);
        }
        let local = Ipv4Addr::from(buf.get_u32());
        let remote = Ipv4Addr::from(buf.get_u32());
        Some(Tunnel { local, remote })
    };
    let mac = get_mac(buf)?;
    Ok(NextHop {
        action,
        gateway,
        egress_interface,
        tunnel,
        mac,
    })
}

fn put_prefix(buf: &mut impl BufMut, prefix: Ipv4Net) {
    buf.put_u32(u32::from(prefix.addr()));
    buf.put_u8(prefix.prefix_len());
}

fn get_prefix(buf: &mut impl Buf) -> Result<Ipv4Net, WireError> {
    if buf.remaining() < 5 {
        return Err(WireError::MalformedPayload);
    }
    let addr = Ipv4Addr::from(buf.get_u32());
    let len = buf.get_u8();
    Ipv4Net::new(addr, len).map_err(|_| WireError::MalformedPayload)
}

/// A decoded request payload, one variant per control-plane operation this
/// core understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// [`request::FIB_ADD`]
    FibAdd {
        /// The route's prefix.
        prefix: Ipv4Net,
        /// The next hop the prefix should resolve to.
        next_hop: NextHopId,
    },
    /// [`request::FIB_DELETE`]
    FibDelete {
        /// The route's prefix.
        prefix: Ipv4Net,
    },
    /// [`request::NEXT_HOP_SET`]
    NextHopSet {
        /// The next hop's id.
        id: NextHopId,
        /// The next hop's new contents.
        next_hop: NextHop,
    },
    /// [`request::NEXT_HOP_REMOVE`]
    NextHopRemove {
        /// The next hop's id.
        id: NextHopId,
    },
    /// [`request::INTERFACE_SET`]
    InterfaceSet {
        /// The interface's id.
        id: InterfaceId,
        /// The interface's new contents.
        interface: Interface,
    },
    /// [`request::INTERFACE_REMOVE`]
    InterfaceRemove {
        /// The interface's id.
        id: InterfaceId,
    },
    /// [`request::INTERFACE_ADMIN_STATE`]
    InterfaceAdminState {
        /// The interface's id.
        id: InterfaceId,
        /// The new administrative state.
        state: AdminState,
    },
    /// [`request::TXQ_ASSIGN`]
    TxqAssign {
        /// The worker the assignment is for.
        worker: WorkerId,
        /// The port being assigned.
        port: PortId,
        /// The queue of `port` assigned to `worker`.
        queue: TxQueueIndex,
    },
    /// [`request::TXQ_UNASSIGN`]
    TxqUnassign {
        /// The worker the assignment is for.
        worker: WorkerId,
        /// The port whose assignment should be removed.
        port: PortId,
    },
}

impl Request {
    /// The `(module, request)` id pair this request encodes as.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Request::FibAdd { .. } => MessageType::new(module::FIB, request::FIB_ADD),
            Request::FibDelete { .. } => MessageType::new(module::FIB, request::FIB_DELETE),
            Request::NextHopSet { .. } => {
                MessageType::new(module::NEXT_HOP, request::NEXT_HOP_SET)
            }
            Request::NextHopRemove { .. } => {
                MessageType::new(module::NEXT_HOP, request::NEXT_HOP_REMOVE)
            }
            Request::InterfaceSet { .. } => {
                MessageType::new(module::INTERFACE, request::INTERFACE_SET)
            }
            Request::InterfaceRemove { .. } => {
                MessageType::new(module::INTERFACE, request::INTERFACE_REMOVE)
            }
            Request::InterfaceAdminState { .. } => {
                MessageType::new(module::INTERFACE, request::INTERFACE_ADMIN_STATE)
            }
            Request::TxqAssign { .. } => MessageType::new(module::TXQ, request::TXQ_ASSIGN),
            Request::TxqUnassign { .. } => MessageType::new(module::TXQ, request::TXQ_UNASSIGN),
        }
    }

    /// Encode this request's payload (not its header) onto `buf`.
    pub fn encode_payload(&self, buf: &mut impl BufMut) {
        match self {
            Request::FibAdd { prefix, next_hop } => {
                put_prefix(buf, *prefix);
                buf.put_u32(next_hop.0);
            }
            Request::FibDelete { prefix } => put_prefix(buf, *prefix),
            Request::NextHopSet { id, next_hop } => {
                buf.put_u32(id.0);
                put_next_hop(buf, next_hop);
            }
            Request::NextHopRemove { id } => buf.put_u32(id.0),
            Request::InterfaceSet { id, interface } => {
                buf.put_u32(id.get_id());
                put_interface(buf, interface);
            }
            Request::InterfaceRemove { id } => buf.put_u32(id.get_id()),
            Request::InterfaceAdminState { id, state } => {
                buf.put_u32(id.get_id());
                buf.put_u8(match state {
                    AdminState::Down => 0,
                    AdminState::Up => 1,
                });
            }
            Request::TxqAssign {
                worker,
                port,
                queue,
            } => {
                buf.put_u32(worker.0);
                buf.put_u16(port.as_u16());
                buf.put_u16(queue.as_u16());
            }
            Request::TxqUnassign { worker, port } => {
                buf.put_u32(worker.0);
                buf.put_u16(port.as_u16());
            }
        }
    }

    /// Decode a request payload given the module and request id that
    /// already came off its header.
    ///
    /// # Errors
    /// Returns [`WireError::UnknownModule`] or [`WireError::UnknownRequest`]
    /// for an unrecognized `message_type`, and [`WireError::MalformedPayload`]
    /// if the payload's bytes don't match what that request id expects.
    pub fn decode(message_type: MessageType, buf: &mut impl Buf) -> Result<Self, WireError> {
        match (message_type.module, message_type.request) {
            (module::FIB, request::FIB_ADD) => {
                let prefix = get_prefix(buf)?;
                if buf.remaining() < 4 {
                    return Err(WireError::MalformedPayload);
                }
                let next_hop = NextHopId(buf.get_u32());
                Ok(Request::FibAdd { prefix, next_hop })
            }
            (module::FIB, request::FIB_DELETE) => Ok(Request::FibDelete {
                prefix: get_prefix(buf)?,
            }),
            (module::NEXT_HOP, request::NEXT_HOP_SET) => {
                if buf.remaining() < 4 {
                    return Err(WireError::MalformedPayload);
                }
                let id = NextHopId(buf.get_u32());
                let next_hop = get_next_hop(buf)?;
                Ok(Request::NextHopSet { id, next_hop })
            }
            (module::NEXT_HOP, request::NEXT_HOP_REMOVE) => {
                if buf.remaining() < 4 {
                    return Err(WireError::MalformedPayload);
                }
                Ok(Request::NextHopRemove {
                    id: NextHopId(buf.get_u32()),
                })
            }
            (module::INTERFACE, request::INTERFACE_SET) => {
                if buf.remaining() < 4 {
                    return Err(WireError::MalformedPayload);
                }
                let id = InterfaceId::new(buf.get_u32());
                let interface = get_interface(buf)?;
                Ok(Request::InterfaceSet { id, interface })
            }
            (module::INTERFACE, request::INTERFACE_REMOVE) => {
                if buf.remaining() < 4 {
                    return Err(WireError::MalformedPayload);
                }
                Ok(Request::InterfaceRemove {
                    id: InterfaceId::new(buf.get_u32()),
                })
            }
            (module::INTERFACE, request::INTERFACE_ADMIN_STATE) => {
                if buf.remaining() < 5 {
                    return Err(WireError::MalformedPayload);
                }
                let id = InterfaceId::new(buf.get_u32());
                let state = match buf.get_u8() {
                    0 => AdminState::Down,
                    1 => AdminState::Up,
                    _ => return Err(WireError::MalformedPayload),
                };
                Ok(Request::InterfaceAdminState { id, state })
            }
            (module::TXQ, request::TXQ_ASSIGN) => {
                if buf.remaining() < 8 {
                    return Err(WireError::MalformedPayload);
                }
                let worker = WorkerId(buf.get_u32());
                let port = PortId(buf.get_u16());
                let queue = TxQueueIndex(buf.get_u16());
                Ok(Request::TxqAssign {
                    worker,
                    port,
                    queue,
                })
            }
            (module::TXQ, request::TXQ_UNASSIGN) => {
                if buf.remaining() < 6 {
                    return Err(WireError::MalformedPayload);
                }
                let worker = WorkerId(buf.get_u32());
                let port = PortId(buf.get_u16());
                Ok(Request::TxqUnassign { worker, port })
            }
            (module::FIB | module::NEXT_HOP | module::INTERFACE | module::TXQ, request) => {
                Err(WireError::UnknownRequest {
                    module: message_type.module,
                    request,
                })
            }
            (module, _) => Err(WireError::UnknownModule(module)),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn message_type_round_trips_through_its_u32_encoding() {
        let mt = MessageType::new(module::FIB, request::FIB_ADD);
        assert_eq!(MessageType::decode(mt.encode()), mt);
    }

    #[test]
    fn fib_add_round_trips() {
        let req = Request::FibAdd {
            prefix: "10.0.0.0/8".parse().unwrap(),
            next_hop: NextHopId(7),
        };
        let mut buf = BytesMut::new();
        req.encode_payload(&mut buf);
        let decoded = Request::decode(req.message_type(), &mut buf).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn interface_set_round_trips_physical() {
        let req = Request::InterfaceSet {
            id: InterfaceId::new(3),
            interface: Interface {
                name: "eth0".to_string(),
                admin_state: AdminState::Up,
                address: Some(Ipv4Addr::new(192, 0, 2, 1)),
                mac: Mac([0x02, 0, 0, 0, 0, 1]),
                kind: InterfaceKind::Physical { port: 1, queue: 0 },
            },
        };
        let mut buf = BytesMut::new();
        req.encode_payload(&mut buf);
        let decoded = Request::decode(req.message_type(), &mut buf).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn interface_set_round_trips_ipip_tunnel() {
        let req = Request::InterfaceSet {
            id: InterfaceId::new(4),
            interface: Interface {
                name: "ipip0".to_string(),
                admin_state: AdminState::Up,
                address: None,
                mac: Mac([0x02, 0, 0, 0, 0, 2]),
                kind: InterfaceKind::IpIp {
                    local: Ipv4Addr::new(10, 0, 0, 1),
                },
            },
        };
        let mut buf = BytesMut::new();
        req.encode_payload(&mut buf);
        let decoded = Request::decode(req.message_type(), &mut buf).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn next_hop_set_round_trips_with_tunnel() {
        let req = Request::NextHopSet {
            id: NextHopId(1),
            next_hop: NextHop {
                action: FwAction::Forward,
                gateway: Some(Ipv4Addr::new(192, 0, 2, 254)),
                egress_interface: Some(InterfaceId::new(2)),
                tunnel: Some(Tunnel {
                    local: Ipv4Addr::new(10, 0, 0, 1),
                    remote: Ipv4Addr::new(10, 0, 0, 2),
                }),
                mac: Mac([0x02, 0, 0, 0, 0, 3]),
            },
        };
        let mut buf = BytesMut::new();
        req.encode_payload(&mut buf);
        let decoded = Request::decode(req.message_type(), &mut buf).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn header_round_trips() {
        let header = RequestHeader {
            id: 42,
            message_type: MessageType::new(module::INTERFACE, request::INTERFACE_REMOVE),
            payload_len: 4,
        };
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(RequestHeader::decode(&mut buf).unwrap(), header);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        assert_eq!(
            RequestHeader::decode(&mut buf),
            Err(WireError::TruncatedHeader(4))
        );
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_u32(MessageType::new(module::FIB, request::FIB_ADD).encode());
        buf.put_u32(u32::try_from(MAX_MESSAGE_LEN).unwrap() + 1);
        assert_eq!(
            RequestHeader::decode(&mut buf),
            Err(WireError::TooLarge(MAX_MESSAGE_LEN + 1))
        );
    }

    #[test]
    fn unknown_module_is_rejected() {
        let mut buf = BytesMut::new();
        let result = Request::decode(MessageType::new(99, 1), &mut buf);
        assert_eq!(result, Err(WireError::UnknownModule(99)));
    }
}
