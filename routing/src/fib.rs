// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The IPv4 forwarding information base: a longest-prefix-match trie from
//! [`Ipv4Net`] to [`FibEntry`], RCU-protected with `left-right` so lookup
//! workers never block on a route update.
//!
//! A single default table is carried; there is no VRF id here (see the
//! crate's Non-goal on multiple forwarding tables).

use ipnet::Ipv4Net;
use left_right::{Absorb, ReadGuard, ReadHandle, ReadHandleFactory, WriteHandle};
use prefix_trie::PrefixMap;
use std::net::Ipv4Addr;

use crate::nexthop::NextHopId;

/// What a route resolves to: the next hop to use.
///
/// Kept deliberately thin; everything about forwarding action, gateway
/// resolution, and tunnel encapsulation lives one hop further out, in the
/// [`crate::nexthop::NextHopTable`], so that many routes sharing a next hop
/// share one place to update it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibEntry {
    /// The next hop this route resolves to.
    pub next_hop: NextHopId,
}

/// The FIB proper.
#[derive(Clone)]
pub struct Fib(PrefixMap<Ipv4Net, FibEntry>);

impl Default for Fib {
    fn default() -> Self {
        Self(PrefixMap::new())
    }
}

impl Fib {
    /// Look up the longest-prefix match covering `addr`.
    ///
    /// Returns `None` if no route, not even a default route, covers the
    /// address; callers map that to
    /// [`DoneReason::NoRoute`][net::packet::DoneReason::NoRoute].
    #[must_use]
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<FibEntry> {
        let host = Ipv4Net::new(addr, 32).ok()?;
        self.0.get_lpm(&host).map(|(_, entry)| *entry)
    }

    /// The number of routes currently installed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no routes at all (not even a default).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }
}

enum FibChange {
    Insert(Ipv4Net, FibEntry),
    Remove(Ipv4Net),
}

impl Absorb<FibChange> for Fib {
    fn absorb_first(&mut self, change: &mut FibChange, _other: &Self) {
        match change {
            FibChange::Insert(prefix, entry) => {
                self.0.insert(*prefix, *entry);
            }
            FibChange::Remove(prefix) => {
                self.0.remove(prefix);
            }
        }
    }

    fn drop_first(self: Box<Self>) {}

    fn sync_with(&mut self, first: &Self) {
        self.clone_from(first);
    }
}

/// The single writer half of the FIB.
pub struct FibWriter(WriteHandle<Fib, FibChange>);

impl FibWriter {
    /// Create an empty FIB and its writer/reader pair.
    #[must_use]
    pub fn new() -> (Self, FibReader) {
        let (w, r) = left_right::new_from_empty::<Fib, FibChange>(Fib::default());
        (Self(w), FibReader(r))
    }

    /// Mint another reader over this FIB.
    #[must_use]
    pub fn as_reader(&self) -> FibReader {
        FibReader(self.0.clone())
    }

    /// A factory for minting readers without a direct reference to this
    /// writer; [`crate::control::ControlBridge`] hands this out to back a
    /// `left-right-tlcache` provider so each forwarding worker keeps its
    /// own cached reader instead of cloning a fresh one per packet.
    #[must_use]
    pub fn factory(&self) -> ReadHandleFactory<Fib> {
        self.0.factory()
    }

    /// Install or replace a route.
    pub fn insert(&mut self, prefix: Ipv4Net, entry: FibEntry) {
        self.0.append(FibChange::Insert(prefix, entry));
        self.0.publish();
    }

    /// Withdraw a route.
    pub fn remove(&mut self, prefix: Ipv4Net) {
        self.0.append(FibChange::Remove(prefix));
        self.0.publish();
    }
}

/// A cheap-to-clone handle for lock-free FIB reads.
#[derive(Clone)]
pub struct FibReader(ReadHandle<Fib>);

impl FibReader {
    /// Enter a read section; drop the guard to let a pending writer's
    /// epoch advance. Nodes that cache this across a burst of packets call
    /// `drop` at the burst boundary rather than per packet.
    #[must_use]
    pub fn enter(&self) -> Option<ReadGuard<'_, Fib>> {
        self.0.enter()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let (mut writer, reader) = FibWriter::new();
        writer.insert(
            "0.0.0.0/0".parse().unwrap(),
            FibEntry {
                next_hop: NextHopId(1),
            },
        );
        writer.insert(
            "10.0.0.0/8".parse().unwrap(),
            FibEntry {
                next_hop: NextHopId(2),
            },
        );
        let guard = reader.enter().unwrap();
        assert_eq!(
            guard.lookup(Ipv4Addr::new(10, 1, 2, 3)).unwrap().next_hop,
            NextHopId(2)
        );
        assert_eq!(
            guard.lookup(Ipv4Addr::new(8, 8, 8, 8)).unwrap().next_hop,
            NextHopId(1)
        );
    }

    #[test]
    fn no_route_without_default() {
        let (_writer, reader) = FibWriter::new();
        let guard = reader.enter().unwrap();
        assert!(guard.lookup(Ipv4Addr::new(1, 2, 3, 4)).is_none());
    }

    #[test]
    fn withdrawn_route_stops_matching() {
        let (mut writer, reader) = FibWriter::new();
        let prefix: Ipv4Net = "10.0.0.0/8".parse().unwrap();
        writer.insert(
            prefix,
            FibEntry {
                next_hop: NextHopId(2),
            },
        );
        writer.remove(prefix);
        let guard = reader.enter().unwrap();
        assert!(guard.lookup(Ipv4Addr::new(10, 1, 2, 3)).is_none());
    }
}

/// Hammers a single FIB with concurrent readers while a writer keeps
/// flipping one route's next hop, to catch a reader ever observing
/// anything but one of the next hops that was actually published.
///
/// Built with `concurrency_mode` so the same test body can later run
/// under `loom` or `shuttle`'s instrumented schedulers instead of real
/// threads, once this crate turns one of those features on; today it
/// only ever runs in `std` mode, as a real-timing stress test.
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod concurrency_test {
    use concurrency::concurrency_mode;

    #[concurrency_mode(std)]
    mod stress {
        use crate::fib::{FibEntry, FibWriter};
        use crate::nexthop::NextHopId;
        use ipnet::Ipv4Net;
        use rand::Rng;
        use std::net::Ipv4Addr;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        #[test]
        fn reader_never_observes_a_next_hop_that_was_never_published() {
            const WRITES: usize = 20_000;
            let prefix: Ipv4Net = "10.0.0.0/8".parse().unwrap();
            let (mut writer, reader) = FibWriter::new();
            writer.insert(
                prefix,
                FibEntry {
                    next_hop: NextHopId(1),
                },
            );

            let stop = Arc::new(AtomicBool::new(false));
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let reader = reader.clone();
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || {
                        let mut rng = rand::rng();
                        while !stop.load(Ordering::Relaxed) {
                            let addr = Ipv4Addr::new(10, rng.random(), rng.random(), rng.random());
                            let Some(guard) = reader.enter() else {
                                continue;
                            };
                            if let Some(entry) = guard.lookup(addr) {
                                assert!(entry.next_hop == NextHopId(1) || entry.next_hop == NextHopId(2));
                            }
                        }
                    })
                })
                .collect();

            for i in 0..WRITES {
                let next_hop = if i % 2 == 0 { NextHopId(1) } else { NextHopId(2) };
                writer.insert(
                    prefix,
                    FibEntry { next_hop },
                );
            }
            stop.store(true, Ordering::Relaxed);
            for handle in readers {
                handle.join().expect("reader thread panicked");
            }
        }
    }
}
