//! Enrichment feature flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask selecting which optional enrichments run.
///
/// The default enables everything.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Features(u8);

impl Features {
    /// Generate a request ID and set it on the record.
    pub const REQUEST_ID: Self = Self(1 << 1);
    /// Set the elapsed time on the record.
    pub const DURATION: Self = Self(1 << 2);
    /// Set the route name on the record.
    pub const NAME: Self = Self(1 << 3);
    /// Set the route params on the record.
    pub const PARAMS: Self = Self(1 << 4);

    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(Self::REQUEST_ID.0 | Self::DURATION.0 | Self::NAME.0 | Self::PARAMS.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, dropping unknown ones.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for Features {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Features {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::REQUEST_ID, "REQUEST_ID"),
            (Self::DURATION, "DURATION"),
            (Self::NAME, "NAME"),
            (Self::PARAMS, "PARAMS"),
        ];
        let mut set = f.debug_set();
        for (flag, name) in names {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}
