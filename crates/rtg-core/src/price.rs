//! Integer-cent price type.
//!
//! The exchange quotes every price as a whole number of cents, so prices are
//! kept as `u64` and never touch floating point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Price in cents.
///
/// A zero price is the exchange's way of saying "no level here", see
/// [`Price::is_zero`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub u64);

impl Price {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(cents: u64) -> Self {
        Self(cents)
    }

    #[inline]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Round down onto the tick grid.
    #[inline]
    pub fn floor_to_tick(&self, tick_size: u64) -> Self {
        if tick_size == 0 {
            return *self;
        }
        Self(self.0 / tick_size * tick_size)
    }

    /// Round up onto the tick grid.
    #[inline]
    pub fn ceil_to_tick(&self, tick_size: u64) -> Self {
        if tick_size == 0 {
            return *self;
        }
        Self(self.0.div_ceil(tick_size) * tick_size)
    }

    /// Subtract, returning `None` instead of wrapping below zero.
    #[inline]
    pub fn checked_sub(&self, cents: u64) -> Option<Self> {
        self.0.checked_sub(cents).map(Self)
    }

    #[inline]
    pub fn saturating_add(&self, cents: u64) -> Self {
        Self(self.0.saturating_add(cents))
    }

    #[inline]
    pub fn saturating_sub(&self, cents: u64) -> Self {
        Self(self.0.saturating_sub(cents))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
