//! Future hedging of ETF exposure.
//!
//! Two policies:
//! - Immediate: every ETF fill is offset in the future within the same
//!   callback, at a price guaranteed to be marketable.
//! - Threshold: the imbalance between the ETF position and the future
//!   position is tolerated inside a band; once it has been outside the band
//!   for more than `timeout_ticks` ETF book updates it is closed in one order.
//!
//! Hedge orders are fill-and-kill on the exchange side: the hedge-filled
//! callback is the only one we get, and whatever did not fill is gone.

use std::collections::HashMap;

use rtg_core::{OrderId, OrderIdGenerator, Price, Side, MAX_ASK_NEAREST_TICK, MIN_BID_NEAREST_TICK};
use tracing::{debug, info};

use crate::config::{HedgeConfig, HedgePolicy};

/// A hedge order to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgeOrder {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub volume: u64,
}

/// Price at which a hedge on `side` always trades.
pub fn marketable_price(side: Side) -> Price {
    match side {
        Side::Buy => MAX_ASK_NEAREST_TICK,
        Side::Sell => MIN_BID_NEAREST_TICK,
    }
}

/// Hedge state.
#[derive(Debug)]
pub struct HedgeController {
    config: HedgeConfig,
    /// Consecutive ETF ticks with the imbalance outside the band.
    elapsed_ticks: u64,
    /// Hedges sent and not yet reported filled.
    in_flight: HashMap<OrderId, (Side, u64)>,
}

impl HedgeController {
    pub fn new(config: HedgeConfig) -> Self {
        Self {
            config,
            elapsed_ticks: 0,
            in_flight: HashMap::new(),
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// Signed future volume sent but not yet reported.
    pub fn in_flight_volume(&self) -> i64 {
        self.in_flight
            .values()
            .map(|(side, volume)| side.signed(*volume))
            .sum()
    }

    /// An ETF quote on `fill_side` traded `volume` lots.
    ///
    /// Under the immediate policy this returns the offsetting hedge.
    pub fn on_etf_fill(
        &mut self,
        fill_side: Side,
        volume: u64,
        ids: &mut OrderIdGenerator,
    ) -> Option<HedgeOrder> {
        if self.config.policy != HedgePolicy::Immediate || volume == 0 {
            return None;
        }
        Some(self.send(fill_side.opposite(), volume, ids))
    }

    /// An ETF book update arrived.
    ///
    /// `imbalance` is the future volume needed to be flat overall,
    /// `(-etf) - future`, before counting hedges in flight.
    pub fn on_etf_tick(&mut self, imbalance: i64, ids: &mut OrderIdGenerator) -> Option<HedgeOrder> {
        if self.config.policy != HedgePolicy::Threshold {
            return None;
        }

        let gap = imbalance - self.in_flight_volume();
        if gap.unsigned_abs() <= self.config.tolerance {
            self.elapsed_ticks = 0;
            return None;
        }

        self.elapsed_ticks += 1;
        if self.elapsed_ticks <= self.config.timeout_ticks {
            debug!(
                gap,
                elapsed_ticks = self.elapsed_ticks,
                timeout_ticks = self.config.timeout_ticks,
                "Hedge imbalance outside band"
            );
            return None;
        }

        self.elapsed_ticks = 0;
        let side = if gap > 0 { Side::Buy } else { Side::Sell };
        let order = self.send(side, gap.unsigned_abs(), ids);
        info!(
            gap,
            side = %order.side,
            volume = order.volume,
            "Hedge timeout reached, closing imbalance"
        );
        Some(order)
    }

    /// A hedge traded. Returns its side, or `None` for an unknown id.
    pub fn on_hedge_filled(&mut self, id: OrderId) -> Option<Side> {
        self.in_flight.remove(&id).map(|(side, _)| side)
    }

    /// A hedge was rejected. Returns whether the id was ours.
    pub fn on_rejected(&mut self, id: OrderId) -> bool {
        self.in_flight.remove(&id).is_some()
    }

    fn send(&mut self, side: Side, volume: u64, ids: &mut OrderIdGenerator) -> HedgeOrder {
        let order = HedgeOrder {
            id: ids.next_id(),
            side,
            price: marketable_price(side),
            volume,
        };
        self.in_flight.insert(order.id, (side, volume));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold(tolerance: u64, timeout_ticks: u64) -> HedgeController {
        HedgeController::new(HedgeConfig {
            policy: HedgePolicy::Threshold,
            tolerance,
            timeout_ticks,
        })
    }

    #[test]
    fn test_immediate_hedge_opposite_side() {
        let mut ids = OrderIdGenerator::new();
        let mut hedger = HedgeController::new(HedgeConfig::default());

        let order = hedger.on_etf_fill(Side::Sell, 15, &mut ids).unwrap();
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.volume, 15);
        assert_eq!(order.price, MAX_ASK_NEAREST_TICK);
        assert_eq!(hedger.in_flight_volume(), 15);

        let order = hedger.on_etf_fill(Side::Buy, 4, &mut ids).unwrap();
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.price, MIN_BID_NEAREST_TICK);
    }

    #[test]
    fn test_immediate_ignores_ticks() {
        let mut ids = OrderIdGenerator::new();
        let mut hedger = HedgeController::new(HedgeConfig::default());
        for _ in 0..100 {
            assert!(hedger.on_etf_tick(-50, &mut ids).is_none());
        }
    }

    #[test]
    fn test_threshold_waits_for_timeout() {
        let mut ids = OrderIdGenerator::new();
        let mut hedger = threshold(10, 20);
        assert!(hedger.on_etf_fill(Side::Buy, 50, &mut ids).is_none());

        for tick in 1..=20 {
            assert!(hedger.on_etf_tick(-50, &mut ids).is_none(), "tick {tick}");
            assert_eq!(hedger.elapsed_ticks(), tick);
        }

        let order = hedger.on_etf_tick(-50, &mut ids).unwrap();
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.volume, 50);
        assert_eq!(hedger.elapsed_ticks(), 0);

        // The hedge in flight covers the gap: no second order.
        for _ in 0..30 {
            assert!(hedger.on_etf_tick(-50, &mut ids).is_none());
        }
        assert_eq!(hedger.elapsed_ticks(), 0);
    }

    #[test]
    fn test_threshold_band_resets_counter() {
        let mut ids = OrderIdGenerator::new();
        let mut hedger = threshold(10, 3);
        hedger.on_etf_tick(20, &mut ids);
        hedger.on_etf_tick(20, &mut ids);
        assert_eq!(hedger.elapsed_ticks(), 2);
        hedger.on_etf_tick(10, &mut ids);
        assert_eq!(hedger.elapsed_ticks(), 0);
    }

    #[test]
    fn test_fill_and_reject_clear_in_flight() {
        let mut ids = OrderIdGenerator::new();
        let mut hedger = HedgeController::new(HedgeConfig::default());
        let a = hedger.on_etf_fill(Side::Buy, 5, &mut ids).unwrap();
        let b = hedger.on_etf_fill(Side::Buy, 7, &mut ids).unwrap();

        assert_eq!(hedger.on_hedge_filled(a.id), Some(Side::Sell));
        assert_eq!(hedger.on_hedge_filled(a.id), None);
        assert!(hedger.on_rejected(b.id));
        assert_eq!(hedger.in_flight_volume(), 0);
    }
}
