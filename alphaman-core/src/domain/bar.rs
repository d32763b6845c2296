//! Bar fields — the canonical OHLCV vocabulary of a daily row.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the six canonical daily bar fields.
///
/// Every record built from tabular ingestion carries all six. Any other column
/// in the source table is treated as extra data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    #[serde(rename = "Adj Close", alias = "AdjClose")]
    AdjClose,
    Volume,
}

impl BarField {
    pub const ALL: [BarField; 6] = [
        BarField::Open,
        BarField::High,
        BarField::Low,
        BarField::Close,
        BarField::AdjClose,
        BarField::Volume,
    ];

    /// Canonical column name as found in daily CSV exports.
    pub fn column_name(self) -> &'static str {
        match self {
            BarField::Open => "Open",
            BarField::High => "High",
            BarField::Low => "Low",
            BarField::Close => "Close",
            BarField::AdjClose => "Adj Close",
            BarField::Volume => "Volume",
        }
    }

    /// Map a source column name onto a bar field, if it is one.
    ///
    /// Matching is exact except for adjusted close, which is accepted both
    /// with and without the space.
    pub fn from_column(name: &str) -> Option<Self> {
        match name {
            "Open" => Some(BarField::Open),
            "High" => Some(BarField::High),
            "Low" => Some(BarField::Low),
            "Close" => Some(BarField::Close),
            "Adj Close" | "AdjClose" => Some(BarField::AdjClose),
            "Volume" => Some(BarField::Volume),
            _ => None,
        }
    }
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Integer-coerced bar values keyed by field.
pub type BarData = BTreeMap<BarField, i64>;

/// Integer-coerced non-bar values keyed by source column name.
pub type ExtraData = BTreeMap<String, i64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_map_back() {
        for field in BarField::ALL {
            assert_eq!(BarField::from_column(field.column_name()), Some(field));
        }
    }

    #[test]
    fn adj_close_accepts_both_spellings() {
        assert_eq!(BarField::from_column("AdjClose"), Some(BarField::AdjClose));
        assert_eq!(BarField::from_column("Adj Close"), Some(BarField::AdjClose));
    }

    #[test]
    fn unknown_columns_are_not_bar_fields() {
        assert_eq!(BarField::from_column("close"), None);
        assert_eq!(BarField::from_column("PER"), None);
    }

    #[test]
    fn bar_field_serializes_as_column_name() {
        let json = serde_json::to_string(&BarField::AdjClose).unwrap();
        assert_eq!(json, "\"Adj Close\"");
        let back: BarField = serde_json::from_str("\"AdjClose\"").unwrap();
        assert_eq!(back, BarField::AdjClose);
    }
}
