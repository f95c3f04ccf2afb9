//! Core domain types for the ETF/future autotrader.
//!
//! This crate provides the vocabulary shared by the controller and the driver:
//! - `Instrument`, `Side`, `Lifespan`: trading enums
//! - `Price`, `OrderId`: integer-cent prices and caller-assigned identifiers
//! - `BookSnapshot`, `TopOfBook`: most recent top-N levels per instrument
//! - `Event`, `Command`: inbound callbacks and outbound requests

pub mod book;
pub mod error;
pub mod message;
pub mod market;
pub mod order;
pub mod price;

pub use book::{BookLevels, BookSnapshot, TopOfBook, TOP_LEVEL_COUNT};
pub use error::{CoreError, Result};
pub use market::{
    Instrument, MAXIMUM_ASK, MAX_ASK_NEAREST_TICK, MINIMUM_BID, MIN_BID_NEAREST_TICK,
    TICK_SIZE_IN_CENTS,
};
pub use message::{Command, Event};
pub use order::{Lifespan, OrderId, OrderIdGenerator, Side};
pub use price::Price;
