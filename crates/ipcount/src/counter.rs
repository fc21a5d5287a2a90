// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

//! two bit saturating counters for every ipv4 address
//!
//! each byte of storage holds four counters, the counter for key `k` lives in
//! byte `k >> 2` at bit offset `(k & 3) * 2`. the whole address space costs
//! exactly one gibibyte no matter how much input is fed in.

use crate::parse::AddressKey;
use rayon::prelude::*;
use std::fmt;

/// number of distinct ipv4 addresses
pub const ADDRESS_SPACE: u64 = 1 << 32;
/// counters packed into each byte of storage
pub const COUNTERS_PER_UNIT: u64 = 4;
/// bytes of storage backing the counters
pub const UNITS: usize = 1 << 30;

const _: () = assert!(UNITS as u64 * COUNTERS_PER_UNIT == ADDRESS_SPACE);

const SLOT_MASK: u8 = 0b11;
const SCAN_CHUNK: usize = 1 << 16;

/// how many slots of each state a storage byte holds, indexed by the byte
const TALLY: [[u8; 4]; 256] = {
    let mut table = [[0; 4]; 256];
    let mut unit = 0;
    while unit < 256 {
        let mut shift = 0;
        while shift < 8 {
            table[unit][(unit >> shift) & 0b11] += 1;
            shift += 2;
        }
        unit += 1;
    }
    table
};

/// state of a single counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Slot {
    Unseen = 0,
    SeenOnce = 1,
    SeenMany = 2,
    /// never written by [`SaturatingPresenceCounter::observe`], two bits just
    /// happen to have room for it
    Reserved = 3,
}

impl Slot {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & SLOT_MASK {
            0 => Self::Unseen,
            1 => Self::SeenOnce,
            2 => Self::SeenMany,
            _ => Self::Reserved,
        }
    }

    /// the state after one more sighting
    #[must_use]
    pub const fn bump(self) -> Self {
        match self {
            Self::Unseen => Self::SeenOnce,
            Self::SeenOnce | Self::SeenMany => Self::SeenMany,
            Self::Reserved => Self::Reserved,
        }
    }
}

impl std::str::FromStr for Slot {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "unseen" | "0" => Self::Unseen,
            "once" | "1" => Self::SeenOnce,
            "many" | "2" => Self::SeenMany,
            "reserved" | "3" => Self::Reserved,
            _ => {
                return Err("state should be unseen, once, many, or reserved");
            }
        })
    }
}

/// how many counters are in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Census([u64; 4]);

impl Census {
    #[must_use]
    pub const fn get(&self, slot: Slot) -> u64 {
        self.0[slot as usize]
    }

    /// addresses seen at least once, which is not what the tool reports by default
    #[must_use]
    pub const fn distinct(&self) -> u64 {
        self.0[1] + self.0[2] + self.0[3]
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.0[0] + self.distinct()
    }

    fn add_unit(mut self, unit: u8) -> Self {
        for (sum, n) in self.0.iter_mut().zip(TALLY[usize::from(unit)]) {
            *sum += u64::from(n);
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        for (sum, n) in self.0.iter_mut().zip(other.0) {
            *sum += n;
        }
        self
    }
}

/// a fixed array of two bit counters covering every [`AddressKey`]
pub struct SaturatingPresenceCounter {
    units: Box<[u8]>,
}

impl SaturatingPresenceCounter {
    /// allocate the zeroed counters, all one gibibyte of them
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: vec![0; UNITS].into_boxed_slice(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn locate(key: AddressKey) -> (usize, u32) {
        let key = key.get();
        ((key >> 2) as usize, (key & 3) * 2)
    }

    #[must_use]
    pub fn get(&self, key: AddressKey) -> Slot {
        let (index, shift) = Self::locate(key);
        Slot::from_bits(self.units[index] >> shift)
    }

    /// record one sighting of `key`, leaving the other counters in its byte alone
    pub fn observe(&mut self, key: AddressKey) {
        let (index, shift) = Self::locate(key);
        let unit = &mut self.units[index];
        let current = Slot::from_bits(*unit >> shift);
        let next = current.bump();
        if next != current {
            *unit = (*unit & !(SLOT_MASK << shift)) | ((next as u8) << shift);
        }
    }

    /// count the counters currently in `target` state
    #[must_use]
    pub fn count_value(&self, target: Slot) -> u64 {
        let column = target as usize;
        self.units
            .par_chunks(SCAN_CHUNK)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|&unit| u64::from(TALLY[usize::from(unit)][column]))
                    .sum::<u64>()
            })
            .sum()
    }

    /// count every state in a single pass
    #[must_use]
    pub fn census(&self) -> Census {
        self.units
            .par_chunks(SCAN_CHUNK)
            .map(|chunk| chunk.iter().copied().fold(Census::default(), Census::add_unit))
            .reduce(Census::default, Census::merge)
    }

    /// bytes of storage, the same from construction to drop
    #[must_use]
    pub fn footprint(&self) -> usize {
        self.units.len()
    }
}

impl Default for SaturatingPresenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SaturatingPresenceCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaturatingPresenceCounter")
            .field("footprint", &self.footprint())
            .finish_non_exhaustive()
    }
}

#[test]
fn test_transitions() {
    assert_eq!(Slot::Unseen.bump(), Slot::SeenOnce);
    assert_eq!(Slot::SeenOnce.bump(), Slot::SeenMany);
    assert_eq!(Slot::SeenMany.bump(), Slot::SeenMany);
    assert_eq!(Slot::Reserved.bump(), Slot::Reserved);
    assert_eq!(Slot::from_bits(0b1110_0110), Slot::SeenMany);
    assert_eq!("once".parse(), Ok(Slot::SeenOnce));
    assert!("twice".parse::<Slot>().is_err());
}

#[test]
fn test_tally_table() {
    assert_eq!(TALLY[0], [4, 0, 0, 0]);
    assert_eq!(TALLY[0b01_01_01_01], [0, 4, 0, 0]);
    assert_eq!(TALLY[0b00_10_10_01], [1, 1, 2, 0]);
    assert_eq!(TALLY[0xff], [0, 0, 0, 4]);
}

#[test]
fn test_fresh_counter() {
    let counter = SaturatingPresenceCounter::new();
    assert_eq!(counter.footprint(), UNITS);
    assert_eq!(counter.count_value(Slot::SeenOnce), 0);
    assert_eq!(counter.count_value(Slot::Unseen), ADDRESS_SPACE);
    let census = counter.census();
    assert_eq!(census.total(), ADDRESS_SPACE);
    assert_eq!(census.distinct(), 0);
}

#[test]
fn test_observe_shares_units() {
    let mut counter = SaturatingPresenceCounter::new();
    // keys 4 through 7 all live in byte 1
    for k in [4, 5, 5, 6, 6, 6] {
        counter.observe(AddressKey::new(k));
    }
    assert_eq!(counter.units[1], 0b00_10_10_01);
    assert_eq!(counter.units[0], 0);
    assert_eq!(counter.units[2], 0);
    assert_eq!(counter.get(AddressKey::new(4)), Slot::SeenOnce);
    assert_eq!(counter.get(AddressKey::new(5)), Slot::SeenMany);
    assert_eq!(counter.get(AddressKey::new(6)), Slot::SeenMany);
    assert_eq!(counter.get(AddressKey::new(7)), Slot::Unseen);

    counter.observe(AddressKey::new(0));
    counter.observe(AddressKey::new(u32::MAX));
    assert_eq!(counter.get(AddressKey::new(u32::MAX)), Slot::SeenOnce);
    assert_eq!(counter.units[UNITS - 1], 0b01_00_00_00);

    assert_eq!(counter.count_value(Slot::SeenOnce), 3);
    assert_eq!(counter.count_value(Slot::SeenMany), 2);
    assert_eq!(counter.count_value(Slot::Reserved), 0);
    let census = counter.census();
    assert_eq!(census.get(Slot::SeenOnce), 3);
    assert_eq!(census.distinct(), 5);
    assert_eq!(census.total(), ADDRESS_SPACE);
    assert_eq!(counter.footprint(), UNITS);
}

#[test]
fn test_saturation() {
    let mut counter = SaturatingPresenceCounter::new();
    let key = AddressKey::new(0xc0a8_0101);
    counter.observe(key);
    assert_eq!(counter.get(key), Slot::SeenOnce);
    for _ in 0..10 {
        counter.observe(key);
        assert_eq!(counter.get(key), Slot::SeenMany);
    }
    assert_eq!(counter.count_value(Slot::SeenOnce), 0);
    assert_eq!(counter.count_value(Slot::SeenMany), 1);
}
