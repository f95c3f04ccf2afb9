//! Market making configuration.

use rtg_core::{CoreError, Lifespan, MAXIMUM_ASK, TICK_SIZE_IN_CENTS};
use serde::{Deserialize, Serialize};

/// How much of the remaining headroom a single quote may use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeadroomSplit {
    /// Half of the headroom, so both sides can be quoted at once.
    #[default]
    Half,
    /// All of the headroom.
    Full,
}

/// What happens to the replacement when a quote is repriced.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequoteMode {
    /// Send the cancel and the new insert in the same callback.
    #[default]
    Immediate,
    /// Send the cancel, insert the replacement once the cancel is confirmed.
    AwaitCancel,
}

/// How a resting quote is shrunk when its volume exceeds the target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Amend the volume in place, keeping queue position.
    #[default]
    Amend,
    /// Cancel and insert a fresh order at the same price.
    CancelReplace,
}

/// Hedge policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HedgePolicy {
    /// Offset every ETF fill in the future straight away.
    #[default]
    Immediate,
    /// Tolerate a small imbalance; close it once it persists too long.
    Threshold,
}

/// Hedge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HedgeConfig {
    #[serde(default)]
    pub policy: HedgePolicy,

    /// Largest absolute imbalance (lots) left unhedged indefinitely.
    #[serde(default = "default_hedge_tolerance")]
    pub tolerance: u64,

    /// ETF book ticks an out-of-band imbalance may last before it is hedged.
    #[serde(default = "default_hedge_timeout_ticks")]
    pub timeout_ticks: u64,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            policy: HedgePolicy::default(),
            tolerance: default_hedge_tolerance(),
            timeout_ticks: default_hedge_timeout_ticks(),
        }
    }
}

/// Market making configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MakerConfig {
    /// Absolute ETF position limit in lots, applied to both sides.
    #[serde(default = "default_position_limit")]
    pub position_limit: u64,

    /// Tick size in cents.
    #[serde(default = "default_tick_size")]
    pub tick_size: u64,

    /// Ticks kept between a quote and the future's price on the same side.
    #[serde(default = "default_clearance_ticks")]
    pub clearance_ticks: u64,

    #[serde(default)]
    pub headroom_split: HeadroomSplit,

    /// Never quote more than the future shows at its best level.
    #[serde(default = "default_true")]
    pub cap_to_book_volume: bool,

    /// Quote one tick inside the best competing ETF quote when that is
    /// more passive than the clearance floor.
    #[serde(default)]
    pub improve_on_book: bool,

    #[serde(default)]
    pub requote_mode: RequoteMode,

    #[serde(default)]
    pub resize_policy: ResizePolicy,

    /// Lifespan of quote orders.
    #[serde(default)]
    pub quote_lifespan: Lifespan,

    #[serde(default)]
    pub hedge: HedgeConfig,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            position_limit: default_position_limit(),
            tick_size: default_tick_size(),
            clearance_ticks: default_clearance_ticks(),
            headroom_split: HeadroomSplit::default(),
            cap_to_book_volume: true,
            improve_on_book: false,
            requote_mode: RequoteMode::default(),
            resize_policy: ResizePolicy::default(),
            quote_lifespan: Lifespan::default(),
            hedge: HedgeConfig::default(),
        }
    }
}

impl MakerConfig {
    /// Clearance in cents.
    pub fn clearance(&self) -> u64 {
        self.clearance_ticks.saturating_mul(self.tick_size)
    }

    /// Position limit as a signed quantity.
    pub fn limit(&self) -> i64 {
        self.position_limit as i64
    }

    /// Reject configurations the controller cannot honour.
    pub fn validate(&self) -> rtg_core::Result<()> {
        if self.tick_size == 0 {
            return Err(CoreError::InvalidConfig("tick_size must be positive".into()));
        }
        if self.position_limit == 0 || self.position_limit > i64::MAX as u64 {
            return Err(CoreError::InvalidConfig(format!(
                "position_limit out of range: {}",
                self.position_limit
            )));
        }
        if self.clearance_ticks == 0 {
            return Err(CoreError::InvalidConfig(
                "clearance_ticks must be at least 1 so quotes never cross the future".into(),
            ));
        }
        match self.clearance_ticks.checked_mul(self.tick_size) {
            Some(clearance) if clearance <= MAXIMUM_ASK => {}
            _ => {
                return Err(CoreError::InvalidConfig(format!(
                    "clearance of {} ticks of {} cents is beyond the price range",
                    self.clearance_ticks, self.tick_size
                )));
            }
        }
        if self.hedge.policy == HedgePolicy::Threshold
            && self.hedge.tolerance >= self.position_limit
        {
            return Err(CoreError::InvalidConfig(format!(
                "hedge.tolerance ({}) must be below position_limit ({})",
                self.hedge.tolerance, self.position_limit
            )));
        }
        if self.quote_lifespan == Lifespan::FillAndKill && self.improve_on_book {
            return Err(CoreError::InvalidConfig(
                "improve_on_book needs resting quotes (quote_lifespan = good_for_day)".into(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_position_limit() -> u64 {
    100
}
fn default_tick_size() -> u64 {
    TICK_SIZE_IN_CENTS
}
fn default_clearance_ticks() -> u64 {
    1
}
fn default_hedge_tolerance() -> u64 {
    10
}
fn default_hedge_timeout_ticks() -> u64 {
    20
}
