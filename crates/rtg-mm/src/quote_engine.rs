//! Quote price and volume calculation.
//!
//! Computes where the ETF bid/ask should rest based on:
//! - The future's best price on the same side (the reference)
//! - A fixed clearance so quotes never cross the reference
//! - Optionally, the best competing ETF quote (step in by one tick)
//! - Position headroom, so a full fill cannot breach the limit

use rtg_core::{BookLevels, Price, Side, MAX_ASK_NEAREST_TICK, MIN_BID_NEAREST_TICK};

use crate::config::{HeadroomSplit, MakerConfig};

/// Desired price and volume for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteTarget {
    pub price: Price,
    pub volume: u64,
}

/// Inputs for one side's quote.
#[derive(Debug, Clone, Copy)]
pub struct QuoteInputs<'a> {
    pub side: Side,
    /// Future best price and volume on the same side, `None` if empty.
    pub reference: Option<(Price, u64)>,
    /// ETF levels on the same side, if an ETF book has been seen.
    pub etf_levels: Option<&'a BookLevels>,
    /// Our resting quote on this side as `(price, remaining volume)`.
    pub own: Option<(Price, u64)>,
    /// Signed ETF position.
    pub position: i64,
    /// Volume of our other live orders on this side (cancels in flight).
    pub outstanding: u64,
}

/// Compute the target for one side.
///
/// Returns `None` when there is no market to quote against. A returned
/// target may carry zero volume when the position leaves no headroom.
pub fn compute_target(inputs: &QuoteInputs<'_>, config: &MakerConfig) -> Option<QuoteTarget> {
    let (reference_price, reference_volume) = inputs.reference?;
    let price = ideal_price(
        inputs.side,
        reference_price,
        inputs.etf_levels,
        inputs.own,
        config,
    )?;

    let mut volume = quote_volume(
        inputs.side,
        inputs.position,
        inputs.outstanding,
        config,
    );
    if config.cap_to_book_volume {
        volume = volume.min(reference_volume);
    }

    Some(QuoteTarget { price, volume })
}

/// Ideal resting price for one side.
///
/// The clearance floor (`reference ∓ clearance`) is the most aggressive
/// price allowed. With `improve_on_book`, a competing ETF quote that is
/// more passive than the floor is beaten by exactly one tick instead.
/// Returns `None` if the floor falls off the exchange's price range.
pub fn ideal_price(
    side: Side,
    reference: Price,
    etf_levels: Option<&BookLevels>,
    own: Option<(Price, u64)>,
    config: &MakerConfig,
) -> Option<Price> {
    let tick = config.tick_size;
    let clearance = config.clearance();
    let competitor = if config.improve_on_book {
        etf_levels.and_then(|levels| levels.best_excluding(own))
    } else {
        None
    };

    match side {
        Side::Buy => {
            let floor = reference.checked_sub(clearance)?.floor_to_tick(tick);
            if floor < MIN_BID_NEAREST_TICK {
                return None;
            }
            let price = match competitor {
                Some(best) => floor.min(best.saturating_add(tick)),
                None => floor,
            };
            Some(price.max(MIN_BID_NEAREST_TICK))
        }
        Side::Sell => {
            let floor = reference.saturating_add(clearance).ceil_to_tick(tick);
            if floor > MAX_ASK_NEAREST_TICK {
                return None;
            }
            let price = match competitor {
                Some(best) => floor.max(best.saturating_sub(tick)),
                None => floor,
            };
            Some(price.min(MAX_ASK_NEAREST_TICK))
        }
    }
}

/// Lots that can still be bought (`Buy`) or sold (`Sell`) before the
/// position hits the limit.
pub fn headroom(side: Side, position: i64, limit: u64) -> u64 {
    let exposure = side.sign() * position;
    let room = limit as i64 - exposure;
    room.max(0) as u64
}

/// Volume for a new quote on `side`.
///
/// The headroom share depends on [`HeadroomSplit`]; the result is further
/// clamped so that the quote plus every other live order on the same side
/// cannot push the position past the limit.
pub fn quote_volume(side: Side, position: i64, outstanding: u64, config: &MakerConfig) -> u64 {
    let room = headroom(side, position, config.position_limit);
    let share = match config.headroom_split {
        HeadroomSplit::Half => room / 2,
        HeadroomSplit::Full => room,
    };
    share.min(room.saturating_sub(outstanding))
}
