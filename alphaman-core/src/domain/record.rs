//! Per-instrument records held by day and quarter slots.

use super::bar::{BarData, BarField, ExtraData};
use super::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One instrument's data for one calendar day.
///
/// Bar data is mandatory; extra data may grow after creation. The tradable
/// flag is fixed once the record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDailyRecord {
    instrument: Symbol,
    bar_data: BarData,
    extra_data: ExtraData,
    is_tradable: bool,
}

impl InstrumentDailyRecord {
    pub fn new(
        instrument: impl Into<Symbol>,
        bar_data: BarData,
        extra_data: ExtraData,
        is_tradable: bool,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            bar_data,
            extra_data,
            is_tradable,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn is_tradable(&self) -> bool {
        self.is_tradable
    }

    pub fn bar_data(&self) -> &BarData {
        &self.bar_data
    }

    pub fn extra_data(&self) -> &ExtraData {
        &self.extra_data
    }

    /// Value of a single bar field.
    pub fn bar(&self, field: BarField) -> Option<i64> {
        self.bar_data.get(&field).copied()
    }

    /// Insert or overwrite an extra field.
    pub fn add_extra_data(&mut self, key: impl Into<String>, value: i64) {
        self.extra_data.insert(key.into(), value);
    }
}

/// One instrument's fundamentals for one quarter-anchored date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentQuarterlyRecord {
    instrument: Symbol,
    finance_data: BTreeMap<String, f64>,
}

impl InstrumentQuarterlyRecord {
    /// Record with no finance fields yet. Each call owns a fresh map.
    pub fn new(instrument: impl Into<Symbol>) -> Self {
        Self::with_finance_data(instrument, BTreeMap::new())
    }

    pub fn with_finance_data(
        instrument: impl Into<Symbol>,
        finance_data: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            finance_data,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn finance_data(&self) -> &BTreeMap<String, f64> {
        &self.finance_data
    }

    /// Insert or overwrite a finance field.
    pub fn add_finance_data(&mut self, key: impl Into<String>, value: f64) {
        self.finance_data.insert(key.into(), value);
    }
}
