//! Quote and hedge controller.
//!
//! Owns all strategy state and turns exchange callbacks into commands:
//! - Future book update: reprice, insert, cancel or shrink the ETF quotes
//! - ETF book update: remember the book, run the threshold hedge
//! - Fills and status updates: positions, side state, hedges
//!
//! Handlers run to completion and return the commands to send, in order.
//! Nothing here is fatal: rejected orders become terminal with zero fill and
//! the next future update re-derives the quotes.

use rtg_core::{
    BookSnapshot, Command, Event, Instrument, OrderId, OrderIdGenerator, Price, Side,
};
use tracing::{debug, info, warn};

use crate::config::{MakerConfig, RequoteMode, ResizePolicy};
use crate::hedge::{HedgeController, HedgeOrder};
use crate::inventory::Inventory;
use crate::ledger::OrderLedger;
use crate::order_state::{Completion, RestingQuote, SideState};
use crate::quote_engine::{compute_target, quote_volume, QuoteInputs, QuoteTarget};

/// The ETF quote and future hedge controller.
#[derive(Debug)]
pub struct QuoteController {
    config: MakerConfig,
    ids: OrderIdGenerator,
    future_book: Option<BookSnapshot>,
    etf_book: Option<BookSnapshot>,
    bid: SideState,
    ask: SideState,
    ledger: OrderLedger,
    inventory: Inventory,
    hedger: HedgeController,
    disconnected: bool,
}

impl QuoteController {
    /// Create a controller. The config is expected to be validated.
    pub fn new(config: MakerConfig) -> Self {
        let hedger = HedgeController::new(config.hedge.clone());
        Self {
            config,
            ids: OrderIdGenerator::new(),
            future_book: None,
            etf_book: None,
            bid: SideState::Idle,
            ask: SideState::Idle,
            ledger: OrderLedger::new(),
            inventory: Inventory::new(),
            hedger,
            disconnected: false,
        }
    }

    /// Dispatch one callback.
    pub fn on_event(&mut self, event: &Event) -> Vec<Command> {
        if self.disconnected {
            debug!(kind = event.kind(), "Ignoring event after disconnect");
            return Vec::new();
        }

        match event {
            Event::OrderBook { .. } => match event.snapshot() {
                Some(snapshot) => self.on_order_book(snapshot),
                None => Vec::new(),
            },
            Event::TradeTicks { .. } => {
                if let Some(snapshot) = event.snapshot() {
                    self.on_trade_ticks(&snapshot);
                }
                Vec::new()
            }
            Event::OrderFilled {
                order_id,
                price,
                volume,
            } => self.on_order_filled(*order_id, *price, *volume),
            Event::OrderStatus {
                order_id,
                fill_volume,
                remaining_volume,
                fees,
            } => self.on_order_status(*order_id, *fill_volume, *remaining_volume, *fees),
            Event::HedgeFilled {
                order_id,
                average_price,
                volume,
            } => self.on_hedge_filled(*order_id, *average_price, *volume),
            Event::Error { order_id, message } => self.on_error(*order_id, message),
            Event::Disconnect => {
                self.on_disconnect();
                Vec::new()
            }
        }
    }

    /// Book update for either instrument.
    pub fn on_order_book(&mut self, snapshot: BookSnapshot) -> Vec<Command> {
        let mut out = Vec::new();

        let slot = match snapshot.instrument {
            Instrument::Future => &mut self.future_book,
            Instrument::Etf => &mut self.etf_book,
        };
        if let Some(last) = slot {
            if snapshot.sequence <= last.sequence {
                debug!(
                    instrument = %snapshot.instrument,
                    sequence = snapshot.sequence,
                    last_sequence = last.sequence,
                    "Dropping stale book update"
                );
                return out;
            }
        }
        let instrument = snapshot.instrument;
        *slot = Some(snapshot);

        match instrument {
            Instrument::Future => {
                self.requote_side(Side::Buy, &mut out);
                self.requote_side(Side::Sell, &mut out);
            }
            Instrument::Etf => {
                let imbalance = self.inventory.hedge_imbalance();
                if let Some(hedge) = self.hedger.on_etf_tick(imbalance, &mut self.ids) {
                    Self::push_hedge(hedge, &mut out);
                }
            }
        }
        out
    }

    /// Trade ticks carry no decision input; they are only logged.
    pub fn on_trade_ticks(&mut self, snapshot: &BookSnapshot) {
        let top = snapshot.top();
        debug!(
            instrument = %snapshot.instrument,
            sequence = snapshot.sequence,
            ask_price = %top.ask_price,
            ask_volume = top.ask_volume,
            bid_price = %top.bid_price,
            bid_volume = top.bid_volume,
            "Trade ticks"
        );
    }

    /// One of our ETF orders traded.
    pub fn on_order_filled(&mut self, id: OrderId, price: Price, volume: u64) -> Vec<Command> {
        let mut out = Vec::new();

        let Some(order) = self.ledger.record_fill(id, volume) else {
            warn!(order_id = %id, volume, "Fill for unknown order");
            return out;
        };

        self.inventory
            .record_fill(Instrument::Etf, order.side, volume);
        self.state_mut(order.side).set_remaining(id, order.remaining);
        info!(
            order_id = %id,
            side = %order.side,
            price = %price,
            quote_price = %order.price,
            volume,
            remaining = order.remaining,
            etf_position = self.inventory.etf_position(),
            "Quote filled"
        );

        if let Some(hedge) = self.hedger.on_etf_fill(order.side, volume, &mut self.ids) {
            Self::push_hedge(hedge, &mut out);
        }

        if order.remaining == 0 {
            self.finish_order(id, &mut out);
        }
        out
    }

    /// Status update for one of our ETF orders.
    pub fn on_order_status(
        &mut self,
        id: OrderId,
        fill_volume: u64,
        remaining_volume: u64,
        fees: i64,
    ) -> Vec<Command> {
        let mut out = Vec::new();

        let fee_delta = self.ledger.record_fees(id, fees);
        self.inventory.add_fees(fee_delta);

        let Some(order) = self.ledger.get(id).copied() else {
            debug!(order_id = %id, remaining_volume, "Status for unknown or finished order");
            return out;
        };

        if remaining_volume == 0 {
            debug!(order_id = %id, fill_volume, fees, "Order done");
            self.finish_order(id, &mut out);
        } else if remaining_volume < order.remaining {
            self.ledger.set_remaining(id, remaining_volume);
            self.state_mut(order.side).set_remaining(id, remaining_volume);
        }
        out
    }

    /// One of our hedge orders traded.
    pub fn on_hedge_filled(&mut self, id: OrderId, average_price: Price, volume: u64) -> Vec<Command> {
        match self.hedger.on_hedge_filled(id) {
            Some(side) => {
                self.inventory
                    .record_fill(Instrument::Future, side, volume);
                info!(
                    order_id = %id,
                    side = %side,
                    average_price = %average_price,
                    volume,
                    future_position = self.inventory.future_position(),
                    "Hedge filled"
                );
            }
            None => warn!(order_id = %id, volume, "Hedge fill for unknown order"),
        }
        Vec::new()
    }

    /// Exchange error. An error for one of our quotes finishes it with no
    /// further fill, exactly like a terminal status update.
    pub fn on_error(&mut self, id: OrderId, message: &str) -> Vec<Command> {
        warn!(order_id = %id, message, "Exchange error");
        if id.is_none() {
            return Vec::new();
        }
        if self.hedger.on_rejected(id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.finish_order(id, &mut out);
        out
    }

    /// Connection lost. Every later callback is ignored.
    pub fn on_disconnect(&mut self) {
        let etf = self.inventory.get(Instrument::Etf);
        warn!(
            etf_position = etf.net,
            etf_bought = etf.bought,
            etf_sold = etf.sold,
            etf_fills = etf.fill_count,
            future_position = self.inventory.future_position(),
            live_orders = self.ledger.len(),
            "Execution connection lost"
        );
        self.disconnected = true;
    }

    pub fn config(&self) -> &MakerConfig {
        &self.config
    }

    pub fn side_state(&self, side: Side) -> &SideState {
        match side {
            Side::Buy => &self.bid,
            Side::Sell => &self.ask,
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    pub fn hedger(&self) -> &HedgeController {
        &self.hedger
    }

    pub fn etf_position(&self) -> i64 {
        self.inventory.etf_position()
    }

    pub fn future_position(&self) -> i64 {
        self.inventory.future_position()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    fn state_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Buy => &mut self.bid,
            Side::Sell => &mut self.ask,
        }
    }

    /// Target for `side` against the latest books.
    ///
    /// `own` is our resting quote, removed from the ETF book before looking
    /// for competitors. `exclude` is left out of the outstanding volume.
    fn target_for(
        &self,
        side: Side,
        own: Option<&RestingQuote>,
        exclude: Option<OrderId>,
    ) -> Option<QuoteTarget> {
        let future = self.future_book.as_ref()?.top();
        let reference = match side {
            Side::Buy => future.bid(),
            Side::Sell => future.ask(),
        };
        let etf_levels = self.etf_book.as_ref().map(|book| match side {
            Side::Buy => &book.bids,
            Side::Sell => &book.asks,
        });
        let inputs = QuoteInputs {
            side,
            reference,
            etf_levels,
            own: own.map(|q| (q.price, q.remaining)),
            position: self.inventory.etf_position(),
            outstanding: self.ledger.outstanding(side, exclude),
        };
        compute_target(&inputs, &self.config)
    }

    /// Re-derive one side's quote from the latest future book.
    fn requote_side(&mut self, side: Side, out: &mut Vec<Command>) {
        let state = *self.side_state(side);
        match state {
            SideState::Idle => {
                if let Some(target) = self.target_for(side, None, None) {
                    self.insert_quote(side, target, out);
                }
            }
            SideState::PendingCancel { id, .. } => {
                // Volume is re-clamped at insert time, once the cancel is done.
                let target = self.target_for(side, None, Some(id));
                self.state_mut(side).retarget(target);
            }
            SideState::Resting(quote) => match self.target_for(side, Some(&quote), Some(quote.id)) {
                None => {
                    debug!(side = %side, order_id = %quote.id, "No reference market, pulling quote");
                    self.cancel_quote(side, None, out);
                }
                Some(target) if target.price != quote.price => {
                    debug!(
                        side = %side,
                        order_id = %quote.id,
                        from = %quote.price,
                        to = %target.price,
                        "Repricing quote"
                    );
                    self.replace_quote(side, target, out);
                }
                Some(target) if quote.remaining > target.volume => {
                    self.shrink_quote(side, quote, target, out);
                }
                Some(target) if target.volume > quote.remaining.saturating_mul(2) => {
                    debug!(
                        side = %side,
                        order_id = %quote.id,
                        remaining = quote.remaining,
                        target = target.volume,
                        "Quote under half its target volume, replacing"
                    );
                    self.replace_quote(side, target, out);
                }
                Some(_) => {}
            },
        }
    }

    /// Cancel the resting quote and put `target` in its place.
    fn replace_quote(&mut self, side: Side, target: QuoteTarget, out: &mut Vec<Command>) {
        match self.config.requote_mode {
            RequoteMode::Immediate => {
                self.cancel_quote(side, None, out);
                self.insert_quote(side, target, out);
            }
            RequoteMode::AwaitCancel => self.cancel_quote(side, Some(target), out),
        }
    }

    fn shrink_quote(
        &mut self,
        side: Side,
        quote: RestingQuote,
        target: QuoteTarget,
        out: &mut Vec<Command>,
    ) {
        if target.volume == 0 {
            debug!(side = %side, order_id = %quote.id, "No headroom left, pulling quote");
            self.cancel_quote(side, None, out);
            return;
        }
        match self.config.resize_policy {
            ResizePolicy::Amend => {
                debug!(
                    side = %side,
                    order_id = %quote.id,
                    from = quote.remaining,
                    to = target.volume,
                    "Amending quote volume"
                );
                self.ledger.set_remaining(quote.id, target.volume);
                self.state_mut(side).set_remaining(quote.id, target.volume);
                out.push(Command::Amend {
                    order_id: quote.id,
                    volume: target.volume,
                });
            }
            ResizePolicy::CancelReplace => self.replace_quote(side, target, out),
        }
    }

    /// Send a cancel for the resting quote on `side`.
    ///
    /// In immediate mode the side goes straight back to idle (the ledger keeps
    /// the order until it is confirmed done); otherwise it waits in
    /// `PendingCancel` with `target` as the replacement.
    fn cancel_quote(&mut self, side: Side, target: Option<QuoteTarget>, out: &mut Vec<Command>) {
        let id = match self.config.requote_mode {
            RequoteMode::Immediate => self.state_mut(side).detach().map(|q| q.id),
            RequoteMode::AwaitCancel => self.state_mut(side).begin_cancel(target),
        };
        if let Some(order_id) = id {
            out.push(Command::Cancel { order_id });
        }
    }

    /// Insert a new quote on an idle side.
    ///
    /// Volume is re-clamped against every live order on the side, which
    /// covers quotes whose cancel has not been confirmed yet.
    fn insert_quote(&mut self, side: Side, target: QuoteTarget, out: &mut Vec<Command>) {
        let free = quote_volume(
            side,
            self.inventory.etf_position(),
            self.ledger.outstanding(side, None),
            &self.config,
        );
        let volume = target.volume.min(free);
        if volume == 0 {
            return;
        }

        let id = self.ids.next_id();
        self.ledger.insert(id, side, target.price, volume);
        self.state_mut(side)
            .place(RestingQuote::new(id, side, target.price, volume));
        debug!(
            order_id = %id,
            side = %side,
            price = %target.price,
            volume,
            "Inserting quote"
        );
        out.push(Command::Insert {
            order_id: id,
            side,
            price: target.price,
            volume,
            lifespan: self.config.quote_lifespan,
        });
    }

    /// Order `id` reached a terminal state.
    fn finish_order(&mut self, id: OrderId, out: &mut Vec<Command>) {
        let Some(order) = self.ledger.remove(id) else {
            return;
        };
        match self.state_mut(order.side).complete(id) {
            Completion::Replace(target) => {
                debug!(order_id = %id, side = %order.side, "Cancel confirmed, inserting replacement");
                self.insert_quote(order.side, target, out);
            }
            Completion::Cleared | Completion::NotOurs => {}
        }
    }

    fn push_hedge(hedge: HedgeOrder, out: &mut Vec<Command>) {
        debug!(
            order_id = %hedge.id,
            side = %hedge.side,
            price = %hedge.price,
            volume = hedge.volume,
            "Sending hedge"
        );
        out.push(Command::Hedge {
            order_id: hedge.id,
            side: hedge.side,
            price: hedge.price,
            volume: hedge.volume,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeadroomSplit, HedgeConfig, HedgePolicy};
    use rtg_core::{BookLevels, Lifespan, MAX_ASK_NEAREST_TICK, MIN_BID_NEAREST_TICK};

    fn book(instrument: Instrument, sequence: u64, ask: (u64, u64), bid: (u64, u64)) -> BookSnapshot {
        let mut asks = BookLevels::default();
        asks.prices[0] = Price::new(ask.0);
        asks.volumes[0] = ask.1;
        let mut bids = BookLevels::default();
        bids.prices[0] = Price::new(bid.0);
        bids.volumes[0] = bid.1;
        BookSnapshot::new(instrument, sequence, asks, bids)
    }

    fn future(sequence: u64, ask: (u64, u64), bid: (u64, u64)) -> BookSnapshot {
        book(Instrument::Future, sequence, ask, bid)
    }

    fn etf(sequence: u64, ask: (u64, u64), bid: (u64, u64)) -> BookSnapshot {
        book(Instrument::Etf, sequence, ask, bid)
    }

    fn insert(id: u64, side: Side, price: u64, volume: u64) -> Command {
        Command::Insert {
            order_id: OrderId(id),
            side,
            price: Price::new(price),
            volume,
            lifespan: Lifespan::GoodForDay,
        }
    }

    fn cancel(id: u64) -> Command {
        Command::Cancel {
            order_id: OrderId(id),
        }
    }

    /// Controller quoting bid id 1 at 9800 and ask id 2 at 10100, 50 lots each.
    fn quoting(config: MakerConfig) -> QuoteController {
        let mut mm = QuoteController::new(config);
        let out = mm.on_order_book(future(1, (10_000, 80), (9_900, 80)));
        assert_eq!(
            out,
            vec![
                insert(1, Side::Buy, 9_800, 50),
                insert(2, Side::Sell, 10_100, 50),
            ]
        );
        mm
    }

    #[test]
    fn test_quotes_inserted_from_future_book() {
        let mm = quoting(MakerConfig::default());
        assert_eq!(mm.side_state(Side::Buy).order_id(), Some(OrderId(1)));
        assert_eq!(mm.side_state(Side::Sell).order_id(), Some(OrderId(2)));
        assert_eq!(mm.ledger().len(), 2);
    }

    #[test]
    fn test_ask_volume_limited_by_visible_volume() {
        let mut mm = QuoteController::new(MakerConfig::default());
        let out = mm.on_order_book(future(1, (10_000, 20), (0, 0)));
        assert_eq!(out, vec![insert(1, Side::Sell, 10_100, 20)]);
    }

    #[test]
    fn test_unchanged_book_no_churn() {
        let mut mm = quoting(MakerConfig::default());
        for seq in 2..50 {
            let out = mm.on_order_book(future(seq, (10_000, 80), (9_900, 80)));
            assert!(out.is_empty(), "tick {seq} produced {out:?}");
        }
        // ETF ticks never touch quotes.
        let out = mm.on_order_book(etf(1, (10_200, 5), (9_700, 5)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_reprice_immediate() {
        let mut mm = quoting(MakerConfig::default());
        let out = mm.on_order_book(future(2, (10_200, 80), (9_900, 80)));
        assert_eq!(out, vec![cancel(2), insert(3, Side::Sell, 10_300, 50)]);

        // The cancelled ask is still live until confirmed.
        assert!(mm.ledger().contains(OrderId(2)));
        assert_eq!(mm.side_state(Side::Sell).order_id(), Some(OrderId(3)));

        mm.on_order_status(OrderId(2), 0, 0, 0);
        assert!(!mm.ledger().contains(OrderId(2)));
        assert_eq!(mm.side_state(Side::Sell).order_id(), Some(OrderId(3)));
    }

    #[test]
    fn test_replacement_volume_respects_cancel_in_flight() {
        let config = MakerConfig {
            headroom_split: HeadroomSplit::Full,
            cap_to_book_volume: false,
            ..Default::default()
        };
        let mut mm = QuoteController::new(config);
        let out = mm.on_order_book(future(1, (10_000, 80), (0, 0)));
        assert_eq!(out, vec![insert(1, Side::Sell, 10_100, 100)]);

        // Old ask still holds the whole headroom: cancel only.
        let out = mm.on_order_book(future(2, (10_100, 80), (0, 0)));
        assert_eq!(out, vec![cancel(1)]);
        assert!(mm.side_state(Side::Sell).is_idle());

        // Cancel confirmed, next tick quotes again.
        mm.on_order_status(OrderId(1), 0, 0, 0);
        let out = mm.on_order_book(future(3, (10_100, 80), (0, 0)));
        assert_eq!(out, vec![insert(2, Side::Sell, 10_200, 100)]);
    }

    #[test]
    fn test_empty_reference_pulls_quote() {
        let mut mm = quoting(MakerConfig::default());

        let out = mm.on_order_book(future(2, (10_000, 80), (0, 0)));
        assert_eq!(out, vec![cancel(1)]);
        assert!(mm.side_state(Side::Buy).is_idle());

        let out = mm.on_order_book(future(3, (10_000, 80), (0, 0)));
        assert!(out.is_empty());

        mm.on_order_status(OrderId(1), 0, 0, 0);
        let out = mm.on_order_book(future(4, (10_000, 80), (9_900, 80)));
        assert_eq!(out, vec![insert(3, Side::Buy, 9_800, 50)]);
    }

    #[test]
    fn test_full_fill_status_clears_side() {
        let mut mm = quoting(MakerConfig::default());
        let out = mm.on_order_status(OrderId(1), 50, 0, 7);
        assert!(out.is_empty());
        assert!(mm.side_state(Side::Buy).is_idle());
        assert!(!mm.ledger().contains(OrderId(1)));
        assert_eq!(mm.inventory().fees(), 7);
    }

    #[test]
    fn test_immediate_hedge_per_fill() {
        let mut mm = quoting(MakerConfig::default());

        let out = mm.on_order_filled(OrderId(2), Price::new(10_100), 10);
        assert_eq!(
            out,
            vec![Command::Hedge {
                order_id: OrderId(3),
                side: Side::Buy,
                price: MAX_ASK_NEAREST_TICK,
                volume: 10,
            }]
        );
        assert_eq!(mm.etf_position(), -10);
        assert_eq!(
            mm.side_state(Side::Sell).resting().map(|q| q.remaining),
            Some(40)
        );

        let out = mm.on_order_filled(OrderId(1), Price::new(9_800), 50);
        assert_eq!(
            out,
            vec![Command::Hedge {
                order_id: OrderId(4),
                side: Side::Sell,
                price: MIN_BID_NEAREST_TICK,
                volume: 50,
            }]
        );
        assert_eq!(mm.etf_position(), 40);
        // Fully filled: side idle without waiting for the status.
        assert!(mm.side_state(Side::Buy).is_idle());
        assert!(!mm.ledger().contains(OrderId(1)));

        // The late status is harmless.
        assert!(mm.on_order_status(OrderId(1), 50, 0, 0).is_empty());

        mm.on_hedge_filled(OrderId(3), Price::new(10_050), 10);
        mm.on_hedge_filled(OrderId(4), Price::new(9_850), 50);
        assert_eq!(mm.future_position(), -40);
        assert_eq!(mm.inventory().hedge_imbalance(), 0);
    }

    #[test]
    fn test_headroom_after_fill() {
        let mut mm = quoting(MakerConfig::default());
        mm.on_order_filled(OrderId(1), Price::new(9_800), 50);

        // Long 50: bid gets (100 - 50) / 2, ask untouched.
        let out = mm.on_order_book(future(2, (10_000, 80), (9_900, 80)));
        assert_eq!(out, vec![insert(4, Side::Buy, 9_800, 25)]);
    }

    #[test]
    fn test_threshold_hedge_after_timeout() {
        let config = MakerConfig {
            hedge: HedgeConfig {
                policy: HedgePolicy::Threshold,
                tolerance: 10,
                timeout_ticks: 20,
            },
            ..Default::default()
        };
        let mut mm = quoting(config);
        let out = mm.on_order_filled(OrderId(1), Price::new(9_800), 50);
        assert!(out.is_empty());
        assert_eq!(mm.etf_position(), 50);

        for seq in 1..=20 {
            let out = mm.on_order_book(etf(seq, (10_200, 5), (9_700, 5)));
            assert!(out.is_empty(), "tick {seq}");
        }
        assert_eq!(mm.hedger().elapsed_ticks(), 20);

        let out = mm.on_order_book(etf(21, (10_200, 5), (9_700, 5)));
        assert_eq!(
            out,
            vec![Command::Hedge {
                order_id: OrderId(3),
                side: Side::Sell,
                price: MIN_BID_NEAREST_TICK,
                volume: 50,
            }]
        );
        assert_eq!(mm.hedger().elapsed_ticks(), 0);
    }

    #[test]
    fn test_await_cancel_reinserts_on_confirm() {
        let config = MakerConfig {
            requote_mode: RequoteMode::AwaitCancel,
            ..Default::default()
        };
        let mut mm = quoting(config);

        let out = mm.on_order_book(future(2, (10_200, 80), (9_900, 80)));
        assert_eq!(out, vec![cancel(2)]);
        assert_eq!(mm.side_state(Side::Sell).label(), "pending_cancel");

        // Further ticks only move the recorded target.
        let out = mm.on_order_book(future(3, (10_300, 80), (9_900, 80)));
        assert!(out.is_empty());

        // 20 lots trade while the cancel is in flight.
        let out = mm.on_order_filled(OrderId(2), Price::new(10_100), 20);
        assert_eq!(out.len(), 1);
        assert_eq!(mm.etf_position(), -20);

        let out = mm.on_order_status(OrderId(2), 20, 0, 0);
        // Short 20: ask gets (100 - 20) / 2 = 40 at the latest target.
        assert_eq!(out, vec![insert(4, Side::Sell, 10_400, 40)]);
        assert_eq!(mm.side_state(Side::Sell).order_id(), Some(OrderId(4)));
    }

    #[test]
    fn test_await_cancel_full_split_keeps_replacement_volume() {
        let config = MakerConfig {
            headroom_split: HeadroomSplit::Full,
            cap_to_book_volume: false,
            requote_mode: RequoteMode::AwaitCancel,
            ..Default::default()
        };
        let mut mm = QuoteController::new(config);
        let out = mm.on_order_book(future(1, (10_000, 80), (0, 0)));
        assert_eq!(out, vec![insert(1, Side::Sell, 10_100, 100)]);

        let out = mm.on_order_book(future(2, (10_200, 80), (0, 0)));
        assert_eq!(out, vec![cancel(1)]);

        // The order being cancelled does not eat the recorded target's volume.
        let out = mm.on_order_book(future(3, (10_300, 80), (0, 0)));
        assert!(out.is_empty());
        assert_eq!(
            *mm.side_state(Side::Sell),
            SideState::PendingCancel {
                id: OrderId(1),
                target: Some(QuoteTarget {
                    price: Price::new(10_400),
                    volume: 100,
                }),
            }
        );

        let out = mm.on_order_status(OrderId(1), 0, 0, 0);
        assert_eq!(out, vec![insert(2, Side::Sell, 10_400, 100)]);
    }

    #[test]
    fn test_await_cancel_without_market_goes_idle() {
        let config = MakerConfig {
            requote_mode: RequoteMode::AwaitCancel,
            ..Default::default()
        };
        let mut mm = quoting(config);
        let out = mm.on_order_book(future(2, (10_000, 80), (0, 0)));
        assert_eq!(out, vec![cancel(1)]);

        let out = mm.on_order_status(OrderId(1), 0, 0, 0);
        assert!(out.is_empty());
        assert!(mm.side_state(Side::Buy).is_idle());
    }

    #[test]
    fn test_shrink_by_amend() {
        let mut mm = quoting(MakerConfig::default());
        let out = mm.on_order_book(future(2, (10_000, 30), (9_900, 80)));
        assert_eq!(
            out,
            vec![Command::Amend {
                order_id: OrderId(2),
                volume: 30,
            }]
        );
        assert_eq!(
            mm.side_state(Side::Sell).resting().map(|q| q.remaining),
            Some(30)
        );

        // Volume coming back does not grow the quote.
        let out = mm.on_order_book(future(3, (10_000, 80), (9_900, 80)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_thin_quote_replaced_when_volume_returns() {
        let mut mm = quoting(MakerConfig::default());
        let out = mm.on_order_book(future(2, (10_000, 20), (9_900, 80)));
        assert_eq!(
            out,
            vec![Command::Amend {
                order_id: OrderId(2),
                volume: 20,
            }]
        );

        // Target 50 is more than twice the 20 left: replace.
        let out = mm.on_order_book(future(3, (10_000, 80), (9_900, 80)));
        assert_eq!(out, vec![cancel(2), insert(3, Side::Sell, 10_100, 50)]);

        let out = mm.on_order_book(future(4, (10_000, 80), (9_900, 80)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_shrink_by_cancel_replace() {
        let config = MakerConfig {
            resize_policy: ResizePolicy::CancelReplace,
            ..Default::default()
        };
        let mut mm = quoting(config);
        let out = mm.on_order_book(future(2, (10_000, 30), (9_900, 80)));
        assert_eq!(out, vec![cancel(2), insert(3, Side::Sell, 10_100, 30)]);
    }

    #[test]
    fn test_error_finishes_order() {
        let mut mm = quoting(MakerConfig::default());
        let out = mm.on_error(OrderId(1), "order rejected");
        assert!(out.is_empty());
        assert!(mm.side_state(Side::Buy).is_idle());
        assert!(!mm.ledger().contains(OrderId(1)));

        let out = mm.on_order_book(future(2, (10_000, 80), (9_900, 80)));
        assert_eq!(out, vec![insert(3, Side::Buy, 9_800, 50)]);
    }

    #[test]
    fn test_global_error_changes_nothing() {
        let mut mm = quoting(MakerConfig::default());
        assert!(mm.on_error(OrderId::NONE, "rate limited").is_empty());
        assert_eq!(mm.ledger().len(), 2);
        assert_eq!(mm.side_state(Side::Buy).order_id(), Some(OrderId(1)));
    }

    #[test]
    fn test_rejected_hedge_leaves_quotes() {
        let mut mm = quoting(MakerConfig::default());
        mm.on_order_filled(OrderId(2), Price::new(10_100), 5);
        assert_eq!(mm.hedger().in_flight_volume(), 5);
        assert!(mm.on_error(OrderId(3), "hedge rejected").is_empty());
        assert_eq!(mm.hedger().in_flight_volume(), 0);
        assert_eq!(mm.ledger().len(), 2);
    }

    #[test]
    fn test_stale_book_dropped() {
        let mut mm = quoting(MakerConfig::default());
        let out = mm.on_order_book(future(1, (12_000, 80), (11_900, 80)));
        assert!(out.is_empty());
        assert_eq!(
            mm.side_state(Side::Sell).resting().map(|q| q.price),
            Some(Price::new(10_100))
        );
    }

    #[test]
    fn test_disconnect_stops_processing() {
        let mut mm = quoting(MakerConfig::default());
        assert!(mm.on_event(&Event::Disconnect).is_empty());
        assert!(mm.is_disconnected());

        let moved = future(2, (12_000, 80), (11_900, 80));
        assert!(mm.on_event(&Event::order_book(&moved)).is_empty());
    }

    #[test]
    fn test_improve_on_book_is_stable() {
        let config = MakerConfig {
            improve_on_book: true,
            ..Default::default()
        };
        let mut mm = QuoteController::new(config);
        mm.on_order_book(etf(1, (10_500, 20), (0, 0)));
        let out = mm.on_order_book(future(1, (10_000, 80), (0, 0)));
        assert_eq!(out, vec![insert(1, Side::Sell, 10_400, 50)]);

        // Our ask now leads the ETF book; the competitor is behind it.
        let mut asks = BookLevels::default();
        asks.prices[0] = Price::new(10_400);
        asks.volumes[0] = 50;
        asks.prices[1] = Price::new(10_500);
        asks.volumes[1] = 20;
        mm.on_order_book(BookSnapshot::new(Instrument::Etf, 2, asks, BookLevels::default()));

        let out = mm.on_order_book(future(2, (10_000, 80), (0, 0)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_event_dispatch() {
        let mut mm = QuoteController::new(MakerConfig::default());
        let out = mm.on_event(&Event::order_book(&future(1, (10_000, 80), (9_900, 80))));
        assert_eq!(out.len(), 2);

        let out = mm.on_event(&Event::OrderFilled {
            order_id: OrderId(2),
            price: Price::new(10_100),
            volume: 50,
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind(), "hedge");

        let ticks = Event::TradeTicks {
            instrument: Instrument::Etf,
            sequence: 1,
            ask_prices: [Price::new(10_100); 5],
            ask_volumes: [1; 5],
            bid_prices: [Price::ZERO; 5],
            bid_volumes: [0; 5],
        };
        assert!(mm.on_event(&ticks).is_empty());
    }

    /// xorshift64, enough to shake out ordering bugs.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    fn assert_within_limit(mm: &QuoteController) {
        let limit = mm.config().limit();
        let position = mm.etf_position();
        assert!(position.abs() <= limit, "position {position}");
        for side in [Side::Buy, Side::Sell] {
            let exposure = side.sign() * position;
            let outstanding = mm.ledger().outstanding(side, None) as i64;
            assert!(
                exposure + outstanding <= limit,
                "{side}: exposure {exposure} + outstanding {outstanding} > {limit}"
            );
        }
    }

    fn run_random_session(config: MakerConfig, seed: u64) {
        let mut rng = Rng(seed);
        let mut mm = QuoteController::new(config);
        let mut future_seq = 0;
        let mut etf_seq = 0;

        for _ in 0..5_000 {
            match rng.below(4) {
                0 => {
                    future_seq += 1;
                    let bid = 9_000 + rng.below(20) * 100;
                    let ask = bid + 100 * (1 + rng.below(3));
                    let bid = if rng.below(10) == 0 { 0 } else { bid };
                    let snapshot = future(
                        future_seq,
                        (ask, 1 + rng.below(120)),
                        (bid, 1 + rng.below(120)),
                    );
                    mm.on_order_book(snapshot);
                }
                1 => {
                    let live: Vec<(OrderId, u64)> = mm
                        .ledger()
                        .iter()
                        .map(|(id, order)| (*id, order.remaining))
                        .collect();
                    if !live.is_empty() {
                        let (id, remaining) = live[rng.below(live.len() as u64) as usize];
                        let volume = 1 + rng.below(remaining.max(1));
                        mm.on_order_filled(id, Price::new(10_000), volume.min(remaining));
                    }
                }
                2 => {
                    let live: Vec<OrderId> = mm.ledger().iter().map(|(id, _)| *id).collect();
                    if !live.is_empty() {
                        let id = live[rng.below(live.len() as u64) as usize];
                        mm.on_order_status(id, 0, 0, 0);
                    }
                }
                _ => {
                    etf_seq += 1;
                    mm.on_order_book(etf(etf_seq, (10_500, 10), (9_500, 10)));
                }
            }
            assert_within_limit(&mm);
        }
    }

    #[test]
    fn test_position_never_exceeds_limit() {
        run_random_session(MakerConfig::default(), 0x9E37_79B9_7F4A_7C15);
        run_random_session(
            MakerConfig {
                headroom_split: HeadroomSplit::Full,
                cap_to_book_volume: false,
                ..Default::default()
            },
            0xD1B5_4A32_D192_ED03,
        );
        run_random_session(
            MakerConfig {
                requote_mode: RequoteMode::AwaitCancel,
                resize_policy: ResizePolicy::CancelReplace,
                ..Default::default()
            },
            0x2545_F491_4F6C_DD1D,
        );
        run_random_session(
            MakerConfig {
                headroom_split: HeadroomSplit::Full,
                cap_to_book_volume: false,
                requote_mode: RequoteMode::AwaitCancel,
                ..Default::default()
            },
            0x94D0_49BB_1331_11EB,
        );
    }
}
