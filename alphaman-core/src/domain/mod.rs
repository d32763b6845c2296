//! Domain types for the alphaman feed

pub mod bar;
pub mod record;

pub use bar::{BarData, BarField, ExtraData};
pub use record::{InstrumentDailyRecord, InstrumentQuarterlyRecord};

/// Symbol type alias
pub type Symbol = String;
