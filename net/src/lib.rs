#![forbid(unsafe_code)] // Validation logic should always be strictly safe
#![deny(missing_docs, clippy::all, clippy::pedantic)] // yeah, I'm that guy.  I'm not sorry.
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Do you know where your towel is?

//! Parsing, serialization, and per-packet scratch storage for the IPv4
//! forwarding path.
//!
//! This crate knows about exactly two headers, Ethernet and IPv4. Anything
//! that needs to inspect transport-layer payloads (NAT, firewalling, ICMP
//! generation) is out of scope and lives above this crate.

pub mod addr_parse_error;
pub mod buffer;
pub mod checksum;
pub mod eth;
pub mod headers;
pub mod interface;
pub mod ipv4;
pub mod packet;
pub mod parse;
pub mod scratch;
