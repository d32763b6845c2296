//! alphaman core — a calendar-indexed feed of per-instrument market data.
//!
//! This crate holds:
//! - Domain records (daily bars plus extras, quarterly fundamentals)
//! - Day and quarter slots
//! - The feed timeline: gap-free calendar slots, ingestion by date,
//!   trimming to tradable days, and price lookups
//! - Date-keyed tables adapted from polars frames, and file loading
//! - TOML feed configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod feed;

pub use config::FeedConfig;
pub use data::{load_feed, DatedTable};
pub use feed::{DaySlot, FeedError, FeedTimeline, SlotLayout};
