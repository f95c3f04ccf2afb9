//! ETF/future autotrader - replay entry point.
//!
//! Reads exchange callbacks as JSON lines (file or stdin) and writes the
//! resulting order commands as JSON lines to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rtg_bot::config::{AppConfig, DEFAULT_CONFIG_PATH};
use rtg_bot::Replayer;
use rtg_telemetry::Metrics;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

/// ETF quote and future hedge controller, driven by an event stream.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "RTG_CONFIG")]
    config: Option<String>,

    /// Event file (JSON lines). Reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Fail on the first malformed event line
    #[arg(long)]
    strict: bool,

    /// Write Prometheus metrics here when the replay ends
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the default log filter.
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = AppConfig::load_or_default(&config_path)?;
    if args.strict {
        config.replay.strict = true;
    }

    rtg_telemetry::init_logging(config.telemetry.log_filter.as_deref())?;

    info!("Starting rtg-bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        position_limit = config.maker.position_limit,
        requote_mode = ?config.maker.requote_mode,
        resize_policy = ?config.maker.resize_policy,
        hedge_policy = ?config.maker.hedge.policy,
        strict = config.replay.strict,
        "Configuration loaded"
    );

    let mut replayer = Replayer::new(&config)?;

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let mut stdout = tokio::io::stdout();

    replayer.run(reader, &mut stdout).await?;

    let metrics_out = args
        .metrics_out
        .or_else(|| config.telemetry.metrics_out.as_ref().map(PathBuf::from));
    if let Some(path) = metrics_out {
        let text = Metrics::render()?;
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Metrics written");
    }

    let stats = replayer.into_stats();
    info!(stats = %stats.to_json(), "Replay finished");
    Ok(())
}
