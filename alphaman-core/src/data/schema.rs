use crate::data::table::DatedRow;
use crate::domain::{BarData, BarField, ExtraData, InstrumentDailyRecord};
use crate::feed::FeedError;

/// Column layout expected of daily bar tables.
pub struct DailySchema;

impl DailySchema {
    /// Split column names into the six bar fields and everything else.
    ///
    /// Fails if any bar field is missing. A second column mapping to an
    /// already-seen bar field is kept as an extra.
    pub fn partition(columns: &[String]) -> Result<ColumnPartition, FeedError> {
        let mut bar: Vec<(BarField, usize)> = Vec::with_capacity(BarField::ALL.len());
        let mut extra = Vec::new();

        for (index, name) in columns.iter().enumerate() {
            match BarField::from_column(name) {
                Some(field) if !bar.iter().any(|(seen, _)| *seen == field) => {
                    bar.push((field, index));
                }
                _ => extra.push((name.clone(), index)),
            }
        }

        for field in BarField::ALL {
            if !bar.iter().any(|(seen, _)| *seen == field) {
                return Err(FeedError::MissingColumn(field.column_name().to_string()));
            }
        }

        Ok(ColumnPartition { bar, extra })
    }
}

/// Column indices of a daily table, split into bar fields and extras.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPartition {
    bar: Vec<(BarField, usize)>,
    extra: Vec<(String, usize)>,
}

impl ColumnPartition {
    pub fn bar_columns(&self) -> &[(BarField, usize)] {
        &self.bar
    }

    pub fn extra_columns(&self) -> &[(String, usize)] {
        &self.extra
    }

    /// Build one instrument's record from a row.
    ///
    /// Every value is truncated to an integer. The record is tradable when
    /// the raw volume is non-zero.
    pub fn build_record(
        &self,
        instrument: &str,
        row: &DatedRow,
        row_index: usize,
    ) -> Result<InstrumentDailyRecord, FeedError> {
        let mut bar_data = BarData::new();
        let mut is_tradable = false;
        for (field, column) in &self.bar {
            let raw = row.values.get(*column).copied().flatten();
            let value = coerce_integer(raw, field.column_name(), row_index)?;
            if *field == BarField::Volume {
                is_tradable = raw.is_some_and(|v| v != 0.0);
            }
            bar_data.insert(*field, value);
        }

        let mut extra_data = ExtraData::new();
        for (name, column) in &self.extra {
            let raw = row.values.get(*column).copied().flatten();
            extra_data.insert(name.clone(), coerce_integer(raw, name, row_index)?);
        }

        Ok(InstrumentDailyRecord::new(
            instrument,
            bar_data,
            extra_data,
            is_tradable,
        ))
    }
}

/// Truncate toward zero, rejecting nulls and values with no `i64` image.
pub fn coerce_integer(value: Option<f64>, column: &str, row: usize) -> Result<i64, FeedError> {
    let invalid = |shown: String| FeedError::InvalidValue {
        column: column.to_string(),
        row,
        value: shown,
    };

    let value = value.ok_or_else(|| invalid("null".into()))?;
    if !value.is_finite() {
        return Err(invalid(value.to_string()));
    }
    let truncated = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(invalid(value.to_string()));
    }
    Ok(truncated as i64)
}
