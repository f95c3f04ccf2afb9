//! Order-related types and identifiers.
//!
//! Provides order side, lifespan, and the caller-assigned order id
//! together with its generator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell (for position calculations).
    pub fn sign(&self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }

    /// Signed position delta for a fill of `volume` on this side.
    /// Volumes beyond `i64::MAX` saturate.
    pub fn signed(&self, volume: u64) -> i64 {
        let volume = i64::try_from(volume).unwrap_or(i64::MAX);
        self.sign() * volume
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifespan (time-in-force).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifespan {
    /// Rests on the book until filled or cancelled.
    #[default]
    GoodForDay,
    /// Executes against available liquidity, remainder cancelled.
    FillAndKill,
}

impl fmt::Display for Lifespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodForDay => write!(f, "GFD"),
            Self::FillAndKill => write!(f, "FAK"),
        }
    }
}

/// Caller-assigned order identifier.
///
/// Zero is reserved by the exchange to mean "not order-specific"; ids handed
/// out by [`OrderIdGenerator`] are always positive and never reused.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    /// The "no particular order" id carried by global error messages.
    pub const NONE: Self = Self(0);

    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic order id source shared by quotes and hedges.
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    last: u64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id.
    pub fn next_id(&mut self) -> OrderId {
        self.last += 1;
        OrderId(self.last)
    }
}
