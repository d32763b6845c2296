use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by slots and the feed timeline.
///
/// Every error is returned to the caller immediately. Ingestion is not
/// transactional: rows applied before a failing row stay applied.
#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("end_date {end} precedes start_date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("day index {index} out of bounds ({len} slots)")]
    DayIndexOutOfBounds { index: usize, len: usize },

    #[error("instrument '{instrument}' has no record on {date}")]
    InstrumentNotFound { instrument: String, date: NaiveDate },

    #[error("row date {date} is outside the feed range {start}..={end}")]
    DateOutOfRange {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("slot for {date} was trimmed as non-tradable")]
    DateTrimmed { date: NaiveDate },

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("invalid value in column '{column}' at row {row}: {value}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("unparseable date key '{0}'")]
    InvalidDateKey(String),

    #[error("frame error: {0}")]
    Frame(String),
}

impl FeedError {
    /// True for the lookup kinds: a queried index, date, or instrument is absent.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            FeedError::DayIndexOutOfBounds { .. }
                | FeedError::InstrumentNotFound { .. }
                | FeedError::DateTrimmed { .. }
        )
    }
}
