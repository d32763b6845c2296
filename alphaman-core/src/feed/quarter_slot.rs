//! Quarter-anchored fundamentals and the lookup hook over them.

use crate::domain::{InstrumentQuarterlyRecord, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One anchor date's quarterly records, keyed by instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterSlot {
    date: NaiveDate,
    records: HashMap<Symbol, InstrumentQuarterlyRecord>,
}

impl QuarterSlot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            records: HashMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Insert a record, replacing any earlier one for the same instrument.
    pub fn add_record(&mut self, record: InstrumentQuarterlyRecord) {
        self.records.insert(record.instrument().to_string(), record);
    }

    pub fn record(&self, instrument: &str) -> Option<&InstrumentQuarterlyRecord> {
        self.records.get(instrument)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Picks the quarter slot that answers a query date.
///
/// The closeness rule is left to the caller; the timeline only stores
/// quarter slots ordered by anchor date.
pub trait QuarterResolver {
    fn resolve<'a>(
        &self,
        quarters: &'a BTreeMap<NaiveDate, QuarterSlot>,
        date: NaiveDate,
    ) -> Option<&'a QuarterSlot>;
}

/// Matches only a quarter anchored exactly on the query date.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactQuarter;

impl QuarterResolver for ExactQuarter {
    fn resolve<'a>(
        &self,
        quarters: &'a BTreeMap<NaiveDate, QuarterSlot>,
        date: NaiveDate,
    ) -> Option<&'a QuarterSlot> {
        quarters.get(&date)
    }
}
