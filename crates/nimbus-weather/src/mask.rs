//! Composite keys that tie forecast rows to their condition rows.
//!
//! A [`MaskedKey`] packs a city id into the high 32 bits and a slot number
//! into the low 32 bits. Slots are assigned per response by [`SlotLayout`]:
//! the current observation takes slot 0, daily entries follow, then hourly
//! entries, so every row of one city gets a distinct key.

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaskedKey(i64);

impl MaskedKey {
    pub fn new(city_id: i32, slot: i32) -> Self {
        Self(((city_id as i64) << 32) | (slot as u32 as i64))
    }

    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn city_id(self) -> i32 {
        (self.0 >> 32) as i32
    }

    pub fn slot(self) -> i32 {
        self.0 as i32
    }
}

impl std::fmt::Display for MaskedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.city_id(), self.slot())
    }
}

/// Slot of the current observation.
pub const CURRENT_SLOT: i32 = 0;

/// Slot assignment for one API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    daily_count: i32,
    hourly_count: i32,
}

impl SlotLayout {
    pub fn new(daily_count: usize, hourly_count: usize) -> Self {
        Self {
            daily_count: i32::try_from(daily_count).unwrap_or(i32::MAX / 2),
            hourly_count: i32::try_from(hourly_count).unwrap_or(i32::MAX / 2),
        }
    }

    pub fn current(&self) -> i32 {
        CURRENT_SLOT
    }

    pub fn daily(&self, index: usize) -> i32 {
        self.daily_range().start + index as i32
    }

    pub fn hourly(&self, index: usize) -> i32 {
        self.hourly_range().start + index as i32
    }

    pub fn daily_range(&self) -> Range<i32> {
        1..1 + self.daily_count
    }

    pub fn hourly_range(&self) -> Range<i32> {
        let start = 1 + self.daily_count;
        start..start + self.hourly_count
    }
}
