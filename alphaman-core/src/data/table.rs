//! Date-keyed tables — the in-memory form every ingestion path consumes.
//!
//! A [`DatedTable`] is a list of named numeric columns plus rows, where each
//! row carries a [`DateKey`]. Polars frames are adapted with
//! [`DatedTable::from_frame`]; tests and callers without polars can build one
//! row by row.

use crate::feed::FeedError;
use chrono::NaiveDate;
use polars::prelude::*;

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// The date a row is keyed on: a calendar date or a date-like string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateKey {
    Date(NaiveDate),
    Text(String),
}

impl DateKey {
    /// Resolve to a calendar date, discarding any time-of-day part.
    pub fn to_date(&self) -> Result<NaiveDate, FeedError> {
        match self {
            DateKey::Date(date) => Ok(*date),
            DateKey::Text(text) => parse_date_key(text),
        }
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey::Date(date)
    }
}

impl From<&str> for DateKey {
    fn from(text: &str) -> Self {
        DateKey::Text(text.to_string())
    }
}

impl From<String> for DateKey {
    fn from(text: String) -> Self {
        DateKey::Text(text)
    }
}

/// Parse `YYYY-MM-DD`, ignoring anything after the first space or `T`.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, FeedError> {
    let trimmed = key.trim();
    let day_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .map_err(|_| FeedError::InvalidDateKey(key.to_string()))
}

/// One table row: its date key and one optional value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedRow {
    pub key: DateKey,
    pub values: Vec<Option<f64>>,
}

/// Named numeric columns with date-keyed rows, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatedTable {
    columns: Vec<String>,
    rows: Vec<DatedRow>,
}

impl DatedTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[DatedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. The value count must match the column count.
    pub fn push_row(
        &mut self,
        key: impl Into<DateKey>,
        values: Vec<Option<f64>>,
    ) -> Result<(), FeedError> {
        if values.len() != self.columns.len() {
            return Err(FeedError::Frame(format!(
                "row {} has {} values, expected {}",
                self.rows.len(),
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(DatedRow {
            key: key.into(),
            values,
        });
        Ok(())
    }

    /// Append a row with no missing values.
    pub fn push_values(&mut self, key: impl Into<DateKey>, values: &[f64]) -> Result<(), FeedError> {
        self.push_row(key, values.iter().copied().map(Some).collect())
    }

    /// Adapt a polars frame.
    ///
    /// `date_column` may be `Date`, `Datetime` or `String` typed; every other
    /// column is cast to `Float64`.
    pub fn from_frame(frame: &DataFrame, date_column: &str) -> Result<Self, FeedError> {
        let map_err = |e: PolarsError| FeedError::Frame(e.to_string());

        let date_col = frame
            .column(date_column)
            .map_err(|_| FeedError::MissingColumn(date_column.to_string()))?;
        let keys = date_keys(date_col)?;

        let mut columns = Vec::new();
        let mut series_values: Vec<Vec<Option<f64>>> = Vec::new();
        for column in frame.get_columns() {
            if column.name().as_str() == date_column {
                continue;
            }
            let cast = column.cast(&DataType::Float64).map_err(map_err)?;
            let values = cast.f64().map_err(map_err)?;
            columns.push(column.name().to_string());
            series_values.push(values.into_iter().collect());
        }

        let rows = keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| DatedRow {
                key,
                values: series_values.iter().map(|values| values[i]).collect(),
            })
            .collect();

        Ok(Self { columns, rows })
    }
}

fn date_keys(column: &Column) -> Result<Vec<DateKey>, FeedError> {
    let map_err = |e: PolarsError| FeedError::Frame(format!("date column: {e}"));
    let null_key = |row: usize| FeedError::InvalidDateKey(format!("null at row {row}"));

    match column.dtype() {
        DataType::String => {
            let keys = column.str().map_err(map_err)?;
            (0..keys.len())
                .map(|i| {
                    keys.get(i)
                        .map(|text| DateKey::Text(text.to_string()))
                        .ok_or_else(|| null_key(i))
                })
                .collect()
        }
        DataType::Date | DataType::Datetime(_, _) => {
            let as_date = column.cast(&DataType::Date).map_err(map_err)?;
            let days = as_date.date().map_err(map_err)?;
            (0..days.len())
                .map(|i| {
                    let day = days.get(i).ok_or_else(|| null_key(i))?;
                    NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + day)
                        .map(DateKey::Date)
                        .ok_or_else(|| FeedError::InvalidDateKey(format!("day {day} at row {i}")))
                })
                .collect()
        }
        other => Err(FeedError::Frame(format!(
            "date column '{}' has unsupported type {other:?}",
            column.name()
        ))),
    }
}
