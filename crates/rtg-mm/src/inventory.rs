//! Position tracking for the quoted ETF and the hedging future.

use rtg_core::{Instrument, Side};

/// Position state for one instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstrumentPosition {
    /// Net position (positive = long, negative = short).
    pub net: i64,
    /// Total lots bought.
    pub bought: u64,
    /// Total lots sold.
    pub sold: u64,
    /// Number of fills processed.
    pub fill_count: u64,
}

impl InstrumentPosition {
    fn record(&mut self, side: Side, volume: u64) {
        self.net = self.net.saturating_add(side.signed(volume));
        match side {
            Side::Buy => self.bought = self.bought.saturating_add(volume),
            Side::Sell => self.sold = self.sold.saturating_add(volume),
        }
        self.fill_count += 1;
    }
}

/// ETF and future positions plus fees paid on ETF orders.
#[derive(Debug, Default)]
pub struct Inventory {
    etf: InstrumentPosition,
    future: InstrumentPosition,
    /// Net fees in cents (negative = rebates received).
    fees: i64,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fill on `instrument`.
    pub fn record_fill(&mut self, instrument: Instrument, side: Side, volume: u64) {
        match instrument {
            Instrument::Etf => self.etf.record(side, volume),
            Instrument::Future => self.future.record(side, volume),
        }
    }

    pub fn add_fees(&mut self, fees: i64) {
        self.fees += fees;
    }

    pub fn etf_position(&self) -> i64 {
        self.etf.net
    }

    pub fn future_position(&self) -> i64 {
        self.future.net
    }

    pub fn get(&self, instrument: Instrument) -> &InstrumentPosition {
        match instrument {
            Instrument::Etf => &self.etf,
            Instrument::Future => &self.future,
        }
    }

    pub fn fees(&self) -> i64 {
        self.fees
    }

    /// Future lots needed to be fully hedged: `(-etf) - future`.
    /// Positive means the future position must go up (buy).
    pub fn hedge_imbalance(&self) -> i64 {
        -self.etf.net - self.future.net
    }
}
