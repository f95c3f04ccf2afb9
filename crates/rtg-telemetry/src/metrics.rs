//! Prometheus metrics for the autotrader.
//!
//! Covers:
//! - Inbound events by kind
//! - Outbound commands by kind
//! - ETF fills and hedges by side
//! - ETF/future positions and fees
//! - Replay lines skipped
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which must crash at startup. These panics only
//! happen during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_gauge, register_int_gauge_vec, CounterVec, Encoder,
    IntGauge, IntGaugeVec, TextEncoder,
};
use rtg_core::{Command, Event, Instrument, Side};

use crate::error::TelemetryResult;

/// Inbound events by kind.
/// Labels: kind (order_book/trade_ticks/order_filled/order_status/hedge_filled/error/disconnect)
pub static EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rtg_events_total",
        "Total inbound events processed",
        &["kind"]
    )
    .unwrap()
});

/// Outbound commands by kind.
/// Labels: kind (insert/cancel/amend/hedge)
pub static COMMANDS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rtg_commands_total",
        "Total outbound commands emitted",
        &["kind"]
    )
    .unwrap()
});

/// ETF fills by side.
pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("rtg_fills_total", "Total ETF fills", &["side"]).unwrap()
});

/// ETF lots filled by side.
pub static FILL_VOLUME_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rtg_fill_volume_total",
        "Total ETF lots filled",
        &["side"]
    )
    .unwrap()
});

/// Hedge orders sent by side.
pub static HEDGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rtg_hedges_total",
        "Total future hedge orders sent",
        &["side"]
    )
    .unwrap()
});

/// Net position per instrument.
/// Labels: instrument (etf/future)
pub static POSITION: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "rtg_position",
        "Net position in lots (positive = long)",
        &["instrument"]
    )
    .unwrap()
});

/// Net fees in cents.
pub static FEES_CENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("rtg_fees_cents", "Net ETF fees in cents").unwrap()
});

/// Replay input lines skipped.
/// Labels: reason (parse/empty)
pub static REPLAY_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rtg_replay_skipped_total",
        "Replay input lines skipped",
        &["reason"]
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Count an inbound event.
    pub fn event_received(event: &Event) {
        EVENTS_TOTAL.with_label_values(&[event.kind()]).inc();
    }

    /// Count an outbound command. Hedges are also counted by side.
    pub fn command_sent(command: &Command) {
        COMMANDS_TOTAL.with_label_values(&[command.kind()]).inc();
        if let Command::Hedge { side, .. } = command {
            HEDGES_TOTAL.with_label_values(&[side.as_str()]).inc();
        }
    }

    /// Count an ETF fill.
    pub fn fill(side: Side, volume: u64) {
        FILLS_TOTAL.with_label_values(&[side.as_str()]).inc();
        FILL_VOLUME_TOTAL
            .with_label_values(&[side.as_str()])
            .inc_by(volume as f64);
    }

    /// Set both position gauges.
    pub fn positions(etf: i64, future: i64) {
        POSITION
            .with_label_values(&[Instrument::Etf.as_str()])
            .set(etf);
        POSITION
            .with_label_values(&[Instrument::Future.as_str()])
            .set(future);
    }

    pub fn fees(cents: i64) {
        FEES_CENTS.set(cents);
    }

    pub fn replay_skipped(reason: &str) {
        REPLAY_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Current value of a command counter.
    pub fn commands_sent(kind: &str) -> u64 {
        COMMANDS_TOTAL.with_label_values(&[kind]).get() as u64
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
