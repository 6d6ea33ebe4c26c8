//! TickHive CLI — historical export, daily trading run, watchlist.
//!
//! Commands:
//! - `export` — pull historical candles day by day and write CSV sinks
//! - `trade` — run the index-basket market strategy once (or plan it dry)
//! - `watchlist` — list symbols from the configured watchlist file

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tickhive_core::config::Config;
use tickhive_core::domain::Frequency;
use tickhive_core::export::{window::DAY_STRIDE_SECS, CsvSinkFactory, Exporter};
use tickhive_core::strategy::{MarketStrategy, TomlWatchlist, TradingFilter, Watchlist};

#[derive(Parser)]
#[command(name = "tickhive", about = "TickHive — trading scaffold CLI")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "tickhive.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull historical candles and write one CSV per (symbol, frequency).
    Export {
        /// Symbols to export (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Frequencies (1min/5min/15min/30min/60min/daily/weekly/monthly).
        #[arg(long, value_delimiter = ',', default_value = "daily")]
        frequencies: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End of the first window (YYYY-MM-DD). Defaults to one day
        /// after the start; later windows advance day by day regardless.
        #[arg(long)]
        end: Option<String>,

        /// Output directory. Defaults to the configured export dir.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the market strategy once.
    Trade {
        /// Compute the allocation and signal but submit nothing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// List watchlist symbols.
    Watchlist {
        /// Include trading-disabled entries.
        #[arg(long, default_value_t = false)]
        all: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    match cli.command {
        Commands::Export {
            symbols,
            frequencies,
            start,
            end,
            out,
        } => cmd_export(&config, &symbols, &frequencies, &start, end.as_deref(), out),
        Commands::Trade { dry_run } => cmd_trade(&config, dry_run),
        Commands::Watchlist { all } => cmd_watchlist(&config, all),
    }
}

/// Midnight UTC of a YYYY-MM-DD date, epoch seconds.
fn parse_day(date: &str) -> Result<i64> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{date}'"))?;
    Ok(day
        .and_hms_opt(0, 0, 0)
        .context("invalid start of day")?
        .and_utc()
        .timestamp())
}

/// First window bounds from the CLI dates. Without an explicit end the
/// window spans one stride from the start.
fn initial_window(start: &str, end: Option<&str>) -> Result<(i64, i64)> {
    let from = parse_day(start)?;
    let to = match end {
        Some(end) => {
            let to = parse_day(end)?;
            if to <= from {
                bail!("end date '{end}' is not after start date '{start}'");
            }
            to
        }
        None => from + DAY_STRIDE_SECS,
    };
    Ok((from, to))
}

fn cmd_export(
    config: &Config,
    symbols: &[String],
    frequencies: &[String],
    start: &str,
    end: Option<&str>,
    out: Option<PathBuf>,
) -> Result<()> {
    let frequencies: Vec<Frequency> = frequencies
        .iter()
        .map(|f| f.parse::<Frequency>())
        .collect::<Result<_, _>>()?;

    let (from, to) = initial_window(start, end)?;

    let facade = config.build_facade()?;
    let out_dir = out.unwrap_or_else(|| config.export.out_dir.clone());
    let sinks = CsvSinkFactory::new(&out_dir);
    let exporter = Exporter::new(&facade);

    let summary = exporter.export(&sinks, symbols, &frequencies, from, to)?;
    println!(
        "Export done: {} candles across {} windows ({} empty) -> {}",
        summary.candles_written,
        summary.windows_fetched,
        summary.no_data_windows,
        out_dir.display()
    );
    if !summary.clean() {
        for (symbol, frequency, error) in &summary.errors {
            eprintln!("  skipped window: {symbol} {frequency}: {error}");
        }
    }
    Ok(())
}

fn cmd_trade(config: &Config, dry_run: bool) -> Result<()> {
    let facade = config.build_facade()?;
    let broker = config.build_broker()?;

    let mut strategy = MarketStrategy::new(&broker, &facade)
        .with_risk_fraction(config.strategy.risk_fraction)
        .with_threshold_pct(config.strategy.threshold_pct)
        .with_signal_symbol(config.strategy.signal_symbol.clone());
    if !config.strategy.basket.is_empty() {
        strategy = strategy.with_basket(config.strategy.basket.clone());
    }

    if dry_run {
        let plan = strategy.plan()?;
        println!("cash: {:.2}  side: {:?}", plan.cash, plan.side);
        for allocation in plan.allocations.values() {
            println!(
                "  {} x{} @ {:.2} ({:.2} allocated)",
                allocation.symbol,
                allocation.shares_to_order,
                allocation.latest_price,
                allocation.cash_to_allocate
            );
        }
        return Ok(());
    }

    let report = strategy.run()?;
    println!(
        "run complete: {:?} {} orders submitted",
        report.plan.side,
        report.orders.len()
    );
    for order in &report.orders {
        println!("  {} x{} -> {}", order.symbol, order.qty, order.status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_defaults_the_window_end_to_one_stride() {
        let (from, to) = initial_window("2020-01-02", None).unwrap();
        assert_eq!(from, 1_577_923_200);
        assert_eq!(to, from + DAY_STRIDE_SECS);
    }

    #[test]
    fn export_takes_an_explicit_end_date() {
        let (from, to) = initial_window("2020-01-02", Some("2020-01-09")).unwrap();
        assert_eq!(to - from, 7 * DAY_STRIDE_SECS);
    }

    #[test]
    fn end_date_must_follow_the_start() {
        assert!(initial_window("2020-01-02", Some("2020-01-02")).is_err());
        assert!(initial_window("2020-01-02", Some("2019-12-31")).is_err());
    }

    #[test]
    fn export_command_parses_the_end_flag() {
        let cli = Cli::try_parse_from([
            "tickhive", "export", "SPY", "--start", "2020-01-02", "--end", "2020-01-09",
        ])
        .unwrap();
        match cli.command {
            Commands::Export { start, end, .. } => {
                assert_eq!(start, "2020-01-02");
                assert_eq!(end.as_deref(), Some("2020-01-09"));
            }
            _ => panic!("expected the export command"),
        }
    }
}

fn cmd_watchlist(config: &Config, all: bool) -> Result<()> {
    let Some(path) = &config.watchlist else {
        bail!("no watchlist path configured");
    };
    let watchlist = TomlWatchlist::new(path);
    let filter = if all {
        TradingFilter::All
    } else {
        TradingFilter::TradingEnabled
    };
    for entry in watchlist.entries(filter)? {
        println!(
            "{}\t{}\t{}",
            entry.symbol,
            if entry.trading { "trading" } else { "paused" },
            entry.name
        );
    }
    Ok(())
}
