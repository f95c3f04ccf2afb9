//! Per-side quote state machine.
//!
//! ```text
//! Idle ──insert──▶ Resting ──fill/cancel done──▶ Idle
//!                     │
//!                     └─cancel──▶ PendingCancel ──done──▶ Resting(new) | Idle
//! ```

use rtg_core::{OrderId, Price, Side};

use crate::quote_engine::QuoteTarget;

/// Our resting quote on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestingQuote {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Volume still on the book.
    pub remaining: u64,
}

impl RestingQuote {
    pub fn new(id: OrderId, side: Side, price: Price, volume: u64) -> Self {
        Self {
            id,
            side,
            price,
            remaining: volume,
        }
    }
}

/// Quote state for one side of the ETF book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SideState {
    /// Nothing resting.
    #[default]
    Idle,
    /// One live quote.
    Resting(RestingQuote),
    /// Cancel sent; `target` is what replaces it once confirmed, if anything.
    PendingCancel {
        id: OrderId,
        target: Option<QuoteTarget>,
    },
}

/// Outcome of a terminal order update for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The order does not belong to this side's current state.
    NotOurs,
    /// Side is now idle.
    Cleared,
    /// Side is now idle and the recorded target should be inserted.
    Replace(QuoteTarget),
}

impl SideState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Id of the order this side is tracking, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Idle => None,
            Self::Resting(quote) => Some(quote.id),
            Self::PendingCancel { id, .. } => Some(*id),
        }
    }

    pub fn resting(&self) -> Option<&RestingQuote> {
        match self {
            Self::Resting(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resting(_) => "resting",
            Self::PendingCancel { .. } => "pending_cancel",
        }
    }

    /// Idle → Resting.
    pub fn place(&mut self, quote: RestingQuote) {
        debug_assert!(self.is_idle(), "placing over a live quote");
        *self = Self::Resting(quote);
    }

    /// Resting → Idle without waiting for the cancel to be confirmed.
    /// The caller keeps tracking the old order elsewhere until it is done.
    pub fn detach(&mut self) -> Option<RestingQuote> {
        match *self {
            Self::Resting(quote) => {
                *self = Self::Idle;
                Some(quote)
            }
            _ => None,
        }
    }

    /// Resting → PendingCancel. Returns the id to cancel.
    pub fn begin_cancel(&mut self, target: Option<QuoteTarget>) -> Option<OrderId> {
        match *self {
            Self::Resting(quote) => {
                *self = Self::PendingCancel {
                    id: quote.id,
                    target,
                };
                Some(quote.id)
            }
            _ => None,
        }
    }

    /// Update the replacement recorded for a pending cancel.
    pub fn retarget(&mut self, new_target: Option<QuoteTarget>) {
        if let Self::PendingCancel { target, .. } = self {
            *target = new_target;
        }
    }

    /// Mirror a partial fill or an amend on the resting quote.
    pub fn set_remaining(&mut self, id: OrderId, remaining: u64) {
        if let Self::Resting(quote) = self {
            if quote.id == id {
                quote.remaining = remaining;
            }
        }
    }

    /// Order `id` reached a terminal state (filled, cancelled, rejected).
    pub fn complete(&mut self, id: OrderId) -> Completion {
        match *self {
            Self::Resting(quote) if quote.id == id => {
                *self = Self::Idle;
                Completion::Cleared
            }
            Self::PendingCancel { id: pending, target } if pending == id => {
                *self = Self::Idle;
                match target {
                    Some(target) => Completion::Replace(target),
                    None => Completion::Cleared,
                }
            }
            _ => Completion::NotOurs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(id: u64) -> RestingQuote {
        RestingQuote::new(OrderId(id), Side::Buy, Price::new(9_900), 20)
    }

    #[test]
    fn test_place_and_fill() {
        let mut state = SideState::default();
        assert!(state.is_idle());
        state.place(quote(1));
        assert_eq!(state.order_id(), Some(OrderId(1)));
        assert_eq!(state.complete(OrderId(1)), Completion::Cleared);
        assert!(state.is_idle());
    }

    #[test]
    fn test_complete_other_id_is_ignored() {
        let mut state = SideState::Resting(quote(1));
        assert_eq!(state.complete(OrderId(2)), Completion::NotOurs);
        assert_eq!(state.label(), "resting");
    }

    #[test]
    fn test_pending_cancel_replacement() {
        let mut state = SideState::Resting(quote(1));
        let target = QuoteTarget {
            price: Price::new(9_800),
            volume: 15,
        };
        assert_eq!(state.begin_cancel(Some(target)), Some(OrderId(1)));
        assert_eq!(state.label(), "pending_cancel");

        let newer = QuoteTarget {
            price: Price::new(9_700),
            volume: 10,
        };
        state.retarget(Some(newer));
        assert_eq!(state.complete(OrderId(1)), Completion::Replace(newer));
        assert!(state.is_idle());
    }

    #[test]
    fn test_pending_cancel_without_target() {
        let mut state = SideState::Resting(quote(1));
        state.begin_cancel(None);
        assert_eq!(state.complete(OrderId(1)), Completion::Cleared);
    }

    #[test]
    fn test_detach_and_remaining() {
        let mut state = SideState::Resting(quote(4));
        state.set_remaining(OrderId(4), 5);
        assert_eq!(state.resting().map(|q| q.remaining), Some(5));
        let detached = state.detach().unwrap();
        assert_eq!(detached.remaining, 5);
        assert!(state.is_idle());
        assert_eq!(state.detach(), None);
    }
}
