//! DaySlot — every instrument record for one calendar day.

use super::error::FeedError;
use crate::domain::{InstrumentDailyRecord, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One calendar day's records, keyed by instrument.
///
/// `is_tradable` is an OR over every record added: it starts false and
/// `add_record` can only turn it on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySlot {
    date: NaiveDate,
    is_tradable: bool,
    records: HashMap<Symbol, InstrumentDailyRecord>,
}

impl DaySlot {
    pub fn new(date: NaiveDate) -> Self {
        Self::with_tradable(date, false)
    }

    pub fn with_tradable(date: NaiveDate, is_tradable: bool) -> Self {
        Self {
            date,
            is_tradable,
            records: HashMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_tradable(&self) -> bool {
        self.is_tradable
    }

    pub fn set_is_tradable(&mut self, is_tradable: bool) {
        self.is_tradable = is_tradable;
    }

    pub fn get_record(&self, instrument: &str) -> Result<&InstrumentDailyRecord, FeedError> {
        self.records
            .get(instrument)
            .ok_or_else(|| self.not_found(instrument))
    }

    /// Mutable access, for appending extra data after ingestion.
    pub fn get_record_mut(
        &mut self,
        instrument: &str,
    ) -> Result<&mut InstrumentDailyRecord, FeedError> {
        let date = self.date;
        self.records
            .get_mut(instrument)
            .ok_or_else(|| FeedError::InstrumentNotFound {
                instrument: instrument.to_string(),
                date,
            })
    }

    /// Insert a record, replacing any earlier one for the same instrument.
    pub fn add_record(&mut self, record: InstrumentDailyRecord) {
        if record.is_tradable() {
            self.is_tradable = true;
        }
        self.records.insert(record.instrument().to_string(), record);
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.records.contains_key(instrument)
    }

    pub fn records(&self) -> impl Iterator<Item = &InstrumentDailyRecord> {
        self.records.values()
    }

    /// Instruments present on this day, sorted.
    pub fn instruments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn not_found(&self, instrument: &str) -> FeedError {
        FeedError::InstrumentNotFound {
            instrument: instrument.to_string(),
            date: self.date,
        }
    }
}
