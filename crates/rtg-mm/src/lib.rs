//! ETF market making with future hedging.
//!
//! Quotes one bid and one ask on the ETF around the future's best prices:
//! - Quote calculation from the future reference and position headroom
//! - Quote lifecycle per side (insert/cancel/amend, pending cancels)
//! - Position and fee tracking for both instruments
//! - Hedging ETF exposure in the future
//!
//! # Architecture
//!
//! ```text
//! Future book → QuoteController.on_order_book()
//!                ├─ QuoteEngine: target price/volume per side
//!                ├─ SideState: idle / resting / pending cancel
//!                └─ Command::Insert | Cancel | Amend
//!
//! ETF fill    → QuoteController.on_order_filled()
//!                ├─ Inventory: ETF position
//!                └─ HedgeController → Command::Hedge
//!
//! ETF book    → HedgeController.on_etf_tick() (threshold policy)
//! ```

pub mod config;
pub mod controller;
pub mod hedge;
pub mod inventory;
pub mod ledger;
pub mod order_state;
pub mod quote_engine;

pub use config::{HeadroomSplit, HedgeConfig, HedgePolicy, MakerConfig, RequoteMode, ResizePolicy};
pub use controller::QuoteController;
pub use hedge::{HedgeController, HedgeOrder};
pub use inventory::{InstrumentPosition, Inventory};
pub use ledger::{LiveOrder, OrderLedger};
pub use order_state::{Completion, RestingQuote, SideState};
pub use quote_engine::{compute_target, QuoteInputs, QuoteTarget};
