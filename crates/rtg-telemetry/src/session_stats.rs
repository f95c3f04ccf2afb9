//! Per-session statistics.
//!
//! Counts what one replay session saw and did, and logs a summary at the end:
//! - events processed and skipped
//! - commands by kind
//! - ETF fills and lots traded
//! - final positions and fees

use chrono::{DateTime, Utc};
use rtg_core::{Command, Event};
use serde::Serialize;
use tracing::info;

/// Statistics for one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub start_time: DateTime<Utc>,
    pub events: u64,
    pub skipped_lines: u64,
    pub inserts: u64,
    pub cancels: u64,
    pub amends: u64,
    pub hedges: u64,
    pub hedge_volume: u64,
    pub fills: u64,
    pub filled_volume: u64,
    pub etf_position: i64,
    pub future_position: i64,
    pub fees: i64,
    pub disconnected: bool,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            events: 0,
            skipped_lines: 0,
            inserts: 0,
            cancels: 0,
            amends: 0,
            hedges: 0,
            hedge_volume: 0,
            fills: 0,
            filled_volume: 0,
            etf_position: 0,
            future_position: 0,
            fees: 0,
            disconnected: false,
        }
    }

    pub fn record_event(&mut self, event: &Event) {
        self.events += 1;
        if matches!(event, Event::Disconnect) {
            self.disconnected = true;
        }
    }

    /// Count a fill on one of our ETF orders.
    pub fn record_fill(&mut self, volume: u64) {
        self.fills += 1;
        self.filled_volume += volume;
    }

    pub fn record_skipped(&mut self) {
        self.skipped_lines += 1;
    }

    pub fn record_command(&mut self, command: &Command) {
        match command {
            Command::Insert { .. } => self.inserts += 1,
            Command::Cancel { .. } => self.cancels += 1,
            Command::Amend { .. } => self.amends += 1,
            Command::Hedge { volume, .. } => {
                self.hedges += 1;
                self.hedge_volume += volume;
            }
        }
    }

    pub fn set_positions(&mut self, etf: i64, future: i64, fees: i64) {
        self.etf_position = etf;
        self.future_position = future;
        self.fees = fees;
    }

    /// Total commands emitted.
    pub fn commands(&self) -> u64 {
        self.inserts + self.cancels + self.amends + self.hedges
    }

    /// Session length in milliseconds, as of now.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.start_time).num_milliseconds()
    }

    /// Log the summary.
    pub fn log_summary(&self) {
        info!(
            start_time = %self.start_time,
            elapsed_ms = self.elapsed_ms(),
            events = self.events,
            skipped_lines = self.skipped_lines,
            inserts = self.inserts,
            cancels = self.cancels,
            amends = self.amends,
            hedges = self.hedges,
            hedge_volume = self.hedge_volume,
            fills = self.fills,
            filled_volume = self.filled_volume,
            etf_position = self.etf_position,
            future_position = self.future_position,
            fees = self.fees,
            disconnected = self.disconnected,
            "Session summary"
        );
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtg_core::{Lifespan, OrderId, Price, Side};

    #[test]
    fn test_counts_commands_and_fills() {
        let mut stats = SessionStats::new();
        stats.record_event(&Event::OrderFilled {
            order_id: OrderId(1),
            price: Price::new(10_100),
            volume: 7,
        });
        stats.record_fill(7);
        stats.record_command(&Command::Insert {
            order_id: OrderId(2),
            side: Side::Buy,
            price: Price::new(9_800),
            volume: 50,
            lifespan: Lifespan::GoodForDay,
        });
        stats.record_command(&Command::Hedge {
            order_id: OrderId(3),
            side: Side::Buy,
            price: Price::new(2_147_483_600),
            volume: 7,
        });
        stats.record_command(&Command::Cancel {
            order_id: OrderId(2),
        });

        assert_eq!(stats.events, 1);
        assert_eq!(stats.fills, 1);
        assert_eq!(stats.filled_volume, 7);
        assert_eq!(stats.hedge_volume, 7);
        assert_eq!(stats.commands(), 3);
    }

    #[test]
    fn test_disconnect_flag_and_json() {
        let mut stats = SessionStats::new();
        stats.record_event(&Event::Disconnect);
        stats.set_positions(-5, 5, 3);
        assert!(stats.disconnected);

        let json: serde_json::Value = serde_json::from_str(&stats.to_json()).unwrap();
        assert_eq!(json["etf_position"], -5);
        assert_eq!(json["future_position"], 5);
        assert_eq!(json["disconnected"], true);
    }
}
