//! Day slots, quarter slots, and the feed timeline

pub mod day_slot;
pub mod error;
pub mod quarter_slot;
pub mod timeline;

pub use day_slot::DaySlot;
pub use error::FeedError;
pub use quarter_slot::{ExactQuarter, QuarterResolver, QuarterSlot};
pub use timeline::{DailySlots, FeedTimeline, SlotLayout};
