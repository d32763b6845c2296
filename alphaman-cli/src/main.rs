//! alphaman CLI — build a feed from a TOML config and inspect it.
//!
//! Commands:
//! - `summary` — slot counts, layout, and one line per slot
//! - `price` — Close value of one instrument on one slot

use alphaman_core::{load_feed, FeedConfig, FeedTimeline, SlotLayout};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "alphaman",
    about = "alphaman CLI — calendar-indexed market data feed"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print slot counts and one line per slot.
    Summary {
        /// Path to the feed TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Drop non-tradable days even if the config does not ask for it.
        #[arg(long, default_value_t = false)]
        trim: bool,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the Close value of an instrument on one slot.
    Price {
        /// Path to the feed TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Instrument symbol.
        #[arg(long)]
        symbol: String,

        /// Slot index in the current layout.
        #[arg(long)]
        day: Option<usize>,

        /// Calendar date (YYYY-MM-DD), valid in either layout.
        #[arg(long)]
        date: Option<String>,

        /// Drop non-tradable days before the lookup.
        #[arg(long, default_value_t = false)]
        trim: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("alphaman=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary { config, trim, json } => run_summary(&config, trim, json),
        Commands::Price {
            config,
            symbol,
            day,
            date,
            trim,
        } => run_price(&config, &symbol, day, date.as_deref(), trim),
    }
}

fn build_timeline(config_path: &Path, trim: bool) -> Result<FeedTimeline> {
    let config = FeedConfig::from_file(config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let mut timeline = load_feed(&config, base_dir)
        .with_context(|| format!("loading feed from {}", config_path.display()))?;
    if trim && timeline.layout() == SlotLayout::Calendar {
        timeline.trim_daily();
    }
    info!(
        "built {:?} feed with {} slots from {}",
        timeline.layout(),
        timeline.get_tradable_dates(),
        config_path.display()
    );
    Ok(timeline)
}

#[derive(Serialize)]
struct SlotSummary {
    date: NaiveDate,
    tradable: bool,
    instruments: Vec<String>,
}

#[derive(Serialize)]
struct FeedSummary {
    start_date: NaiveDate,
    end_date: NaiveDate,
    layout: SlotLayout,
    slot_count: usize,
    tradable_count: usize,
    quarter_count: usize,
    slots: Vec<SlotSummary>,
}

fn summarize(timeline: &FeedTimeline) -> FeedSummary {
    let slots: Vec<SlotSummary> = timeline
        .slots()
        .iter()
        .map(|slot| SlotSummary {
            date: slot.date(),
            tradable: slot.is_tradable(),
            instruments: slot.instruments().into_iter().map(String::from).collect(),
        })
        .collect();

    FeedSummary {
        start_date: timeline.start_date(),
        end_date: timeline.end_date(),
        layout: timeline.layout(),
        slot_count: timeline.get_tradable_dates(),
        tradable_count: slots.iter().filter(|s| s.tradable).count(),
        quarter_count: timeline.quarters().len(),
        slots,
    }
}

fn run_summary(config_path: &Path, trim: bool, json: bool) -> Result<()> {
    let timeline = build_timeline(config_path, trim)?;
    let summary = summarize(&timeline);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Feed: {} to {}", summary.start_date, summary.end_date);
    println!("Layout: {:?}", summary.layout);
    println!("Slots: {}", summary.slot_count);
    println!("Tradable: {}", summary.tradable_count);
    println!("Quarters: {}", summary.quarter_count);
    println!();
    println!("{:<6} {:<12} {:<9} Instruments", "Index", "Date", "Tradable");
    println!("{}", "-".repeat(48));
    for (index, slot) in summary.slots.iter().enumerate() {
        println!(
            "{:<6} {:<12} {:<9} {}",
            index,
            slot.date.to_string(),
            if slot.tradable { "yes" } else { "no" },
            slot.instruments.join(" ")
        );
    }

    Ok(())
}

fn run_price(
    config_path: &Path,
    symbol: &str,
    day: Option<usize>,
    date: Option<&str>,
    trim: bool,
) -> Result<()> {
    let timeline = build_timeline(config_path, trim)?;

    let day_index = match (day, date) {
        (Some(_), Some(_)) => bail!("--day and --date are mutually exclusive"),
        (None, None) => bail!("one of --day or --date is required"),
        (Some(index), None) => index,
        (None, Some(text)) => {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")?;
            let Some(index) = timeline.position_of_date(date) else {
                bail!("no slot for {date} in the {:?} layout", timeline.layout());
            };
            index
        }
    };

    debug!("looking up {} on slot {}", symbol, day_index);
    let price = timeline.get_price_of_instrument(symbol, day_index)?;
    let slot_date = timeline.get_daily_feed(day_index)?.date();
    println!("{symbol} {slot_date} close {price}");
    Ok(())
}
