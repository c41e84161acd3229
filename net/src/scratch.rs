// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Typed per-packet scratch storage.
//!
//! Nodes in the forwarding graph need to stash small pieces of working data
//! on a packet as it moves edge to edge (a resolved next hop, the egress
//! port, a tunnel remote address) without giving every node a hand in a
//! shared, ever-growing metadata struct. Each node instead registers a
//! typed [`Field<T>`] once, at construction time, and addresses its slot in
//! a fixed-size, inline array by index.
//!
//! A node that never runs never touches the registry, so the cost of an
//! unused field is exactly zero bytes at runtime; the cost of a field that
//! *is* used is one array access, no heap allocation, no locking, and no
//! unsafe code.

use std::any::type_name;
use std::marker::PhantomData;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

/// Number of scratch slots carried inline by every [`crate::packet::Packet`].
///
/// Each slot holds one `u64`-sized value, which comfortably covers the
/// handful of small fields (a next hop id, a port id, an IPv4 address) that
/// the shipped nodes register; grow it if a future node needs more slots.
pub const SCRATCH_SLOTS: usize = 8;

/// Errors that can occur while registering a scratch field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// All [`SCRATCH_SLOTS`] slots have already been claimed by previously
    /// registered fields.
    #[error("scratch area exhausted: {SCRATCH_SLOTS} slots already claimed")]
    OutOfSpace,
}

static NEXT_SLOT: AtomicUsize = AtomicUsize::new(0);

/// A value small enough, and simple enough, to live in a scratch slot.
///
/// Implemented for the handful of concrete types the shipped nodes need;
/// deliberately not a blanket impl so that a field can never silently
/// truncate a value wider than a slot.
pub trait ScratchValue: Copy + 'static {
    /// Encode `self` into a slot.
    fn to_slot(self) -> u64;
    /// Decode a slot back into `Self`. Must be the left inverse of
    /// [`ScratchValue::to_slot`].
    fn from_slot(slot: u64) -> Self;
}

macro_rules! impl_scratch_value_uint {
    ($($t:ty),+) => {
        $(
            impl ScratchValue for $t {
                fn to_slot(self) -> u64 {
                    u64::from(self)
                }
                fn from_slot(slot: u64) -> Self {
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        slot as $t
                    }
                }
            }
        )+
    };
}
impl_scratch_value_uint!(u8, u16, u32, u64);

impl ScratchValue for bool {
    fn to_slot(self) -> u64 {
        u64::from(self)
    }
    fn from_slot(slot: u64) -> Self {
        slot != 0
    }
}

impl ScratchValue for Ipv4Addr {
    fn to_slot(self) -> u64 {
        u64::from(u32::from(self))
    }
    fn from_slot(slot: u64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Ipv4Addr::from(slot as u32)
    }
}

/// A handle to a typed slot within a packet's scratch area.
///
/// Obtained once, at node-construction time, via [`Field::register`]. Cheap
/// to copy and to hold for the lifetime of the owning node; never look one
/// up per-packet.
#[derive(Debug)]
pub struct Field<T: ScratchValue> {
    slot: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ScratchValue> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: ScratchValue> Copy for Field<T> {}

impl<T: ScratchValue> Field<T> {
    /// Claim the next free scratch slot for a field of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::OutOfSpace`] once [`SCRATCH_SLOTS`] slots
    /// have all been claimed.
    pub fn register() -> Result<Self, RegisterError> {
        loop {
            let current = NEXT_SLOT.load(Ordering::Relaxed);
            if current >= SCRATCH_SLOTS {
                return Err(RegisterError::OutOfSpace);
            }
            if NEXT_SLOT
                .compare_exchange_weak(current, current + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(Field {
                    slot: current,
                    _marker: PhantomData,
                });
            }
        }
    }

    /// The field's type name, for diagnostics only.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// The scratch area carried by every packet; opaque outside of [`Field`]
/// accessors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scratch([u64; SCRATCH_SLOTS]);

impl Scratch {
    /// Read the value stored at `field`.
    ///
    /// A field that was never [`Scratch::set`] reads back as `T::from_slot(0)`;
    /// nodes that need to distinguish "never set" from "set to the zero
    /// value" should register a field of an `Option`-shaped type instead
    /// (e.g. a `NonZeroU64`-backed id, or a dedicated "present" flag field).
    #[must_use]
    pub fn get<T: ScratchValue>(&self, field: Field<T>) -> T {
        T::from_slot(self.0[field.slot])
    }

    /// Write `value` into `field`'s slot.
    pub fn set<T: ScratchValue>(&mut self, field: Field<T>, value: T) {
        self.0[field.slot] = value.to_slot();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_a_value() {
        let field: Field<u64> = Field::register().unwrap();
        let mut scratch = Scratch::default();
        scratch.set(field, 0xdead_beef_u64);
        assert_eq!(scratch.get(field), 0xdead_beef_u64);
    }

    #[test]
    fn distinct_fields_do_not_alias() {
        let a: Field<u16> = Field::register().unwrap();
        let b: Field<Ipv4Addr> = Field::register().unwrap();
        let mut scratch = Scratch::default();
        scratch.set(a, 7u16);
        scratch.set(b, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(scratch.get(a), 7u16);
        assert_eq!(scratch.get(b), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn slots_eventually_exhaust() {
        // This test shares the process-wide slot counter with every other
        // test in this binary; just assert the error variant is reachable
        // rather than pinning down exactly when exhaustion occurs.
        let mut last = Ok(Field::<u8>::register().unwrap());
        for _ in 0..SCRATCH_SLOTS + 1 {
            last = Field::<u8>::register();
        }
        if let Err(e) = last {
            assert_eq!(e, RegisterError::OutOfSpace);
        }
    }
}
