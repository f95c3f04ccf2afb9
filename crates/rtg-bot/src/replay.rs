//! JSON-lines event replay.
//!
//! Reads one [`Event`] per line, feeds it to the controller and writes every
//! resulting [`Command`] as one JSON line, in emission order. Blank lines and
//! lines starting with `#` are ignored.

use rtg_core::{Command, Event};
use rtg_mm::QuoteController;
use rtg_telemetry::{Metrics, SessionStats};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Drives a [`QuoteController`] from a line stream.
#[derive(Debug)]
pub struct Replayer {
    controller: QuoteController,
    stats: SessionStats,
    strict: bool,
    stop_on_disconnect: bool,
}

impl Replayer {
    /// Build a replayer from a validated configuration.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            controller: QuoteController::new(config.maker.clone()),
            stats: SessionStats::new(),
            strict: config.replay.strict,
            stop_on_disconnect: config.replay.stop_on_disconnect,
        })
    }

    pub fn controller(&self) -> &QuoteController {
        &self.controller
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Process one event and return the commands it produced.
    pub fn handle(&mut self, event: &Event) -> Vec<Command> {
        Metrics::event_received(event);
        self.stats.record_event(event);

        if let Event::OrderFilled {
            order_id, volume, ..
        } = event
        {
            if !self.controller.is_disconnected() {
                if let Some(order) = self.controller.ledger().get(*order_id) {
                    Metrics::fill(order.side, *volume);
                    self.stats.record_fill(*volume);
                }
            }
        }

        let commands = self.controller.on_event(event);
        for command in &commands {
            Metrics::command_sent(command);
            self.stats.record_command(command);
        }

        let inventory = self.controller.inventory();
        Metrics::positions(inventory.etf_position(), inventory.future_position());
        Metrics::fees(inventory.fees());
        self.stats.set_positions(
            inventory.etf_position(),
            inventory.future_position(),
            inventory.fees(),
        );
        commands
    }

    /// Parse and process one input line. `Ok(None)` means the line was
    /// skipped.
    pub fn handle_line(&mut self, line_no: u64, line: &str) -> AppResult<Option<Vec<Command>>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        match serde_json::from_str::<Event>(trimmed) {
            Ok(event) => Ok(Some(self.handle(&event))),
            Err(e) if self.strict => Err(AppError::Parse {
                line: line_no,
                message: e.to_string(),
            }),
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed event");
                Metrics::replay_skipped("parse");
                self.stats.record_skipped();
                Ok(None)
            }
        }
    }

    /// Replay every line of `reader`, writing commands to `writer`.
    pub async fn run<R, W>(&mut self, reader: R, writer: &mut W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut line_no = 0u64;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let Some(commands) = self.handle_line(line_no, &line)? else {
                continue;
            };

            for command in &commands {
                let mut json = serde_json::to_string(command)?;
                json.push('\n');
                writer.write_all(json.as_bytes()).await?;
            }

            if self.stop_on_disconnect && self.controller.is_disconnected() {
                info!(line = line_no, "Disconnected, stopping replay");
                break;
            }
        }

        writer.flush().await?;
        debug!(lines = line_no, "Replay input exhausted");
        self.stats.log_summary();
        Ok(())
    }

    /// Consume the replayer, returning the session statistics.
    pub fn into_stats(self) -> SessionStats {
        self.stats
    }
}
