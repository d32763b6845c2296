//! FeedTimeline — the calendar-indexed sequence of day slots.
//!
//! A timeline is built over an inclusive date range with one empty
//! [`DaySlot`] per calendar day. Daily tables are routed into slots by row
//! date. Trimming switches the timeline from the dense calendar layout to a
//! tradable-only layout; the two layouts index differently:
//!
//! - [`SlotLayout::Calendar`]: index `i` is `start_date + i` days.
//! - [`SlotLayout::TradableOnly`]: index `i` is the `i`-th tradable day.
//!
//! [`FeedTimeline::slot_for_date`] is valid in both layouts.

use super::day_slot::DaySlot;
use super::error::FeedError;
use super::quarter_slot::{QuarterResolver, QuarterSlot};
use crate::data::schema::DailySchema;
use crate::data::table::DatedTable;
use crate::domain::{BarField, InstrumentQuarterlyRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// How slot indices map onto dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotLayout {
    Calendar,
    TradableOnly,
}

/// Day slots tagged with their addressing scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DailySlots {
    /// Gap-free: one slot per day of the range.
    Calendar(Vec<DaySlot>),
    /// Only tradable slots, ascending by date.
    TradableOnly(Vec<DaySlot>),
}

impl DailySlots {
    pub fn layout(&self) -> SlotLayout {
        match self {
            DailySlots::Calendar(_) => SlotLayout::Calendar,
            DailySlots::TradableOnly(_) => SlotLayout::TradableOnly,
        }
    }

    pub fn as_slice(&self) -> &[DaySlot] {
        match self {
            DailySlots::Calendar(slots) | DailySlots::TradableOnly(slots) => slots,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [DaySlot] {
        match self {
            DailySlots::Calendar(slots) | DailySlots::TradableOnly(slots) => slots,
        }
    }

    fn into_vec(self) -> Vec<DaySlot> {
        match self {
            DailySlots::Calendar(slots) | DailySlots::TradableOnly(slots) => slots,
        }
    }

    /// Index of the slot for `date`, if one is held.
    fn position(&self, start: NaiveDate, date: NaiveDate) -> Option<usize> {
        match self {
            DailySlots::Calendar(slots) => usize::try_from((date - start).num_days())
                .ok()
                .filter(|&offset| offset < slots.len()),
            DailySlots::TradableOnly(slots) => {
                slots.binary_search_by_key(&date, DaySlot::date).ok()
            }
        }
    }
}

/// The date-range-spanning feed of daily and quarterly data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedTimeline {
    start_date: NaiveDate,
    end_date: NaiveDate,
    daily: DailySlots,
    quarters: BTreeMap<NaiveDate, QuarterSlot>,
}

impl FeedTimeline {
    /// Allocate one empty slot per day in `start_date..=end_date`.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, FeedError> {
        check_range(start_date, end_date)?;
        Ok(Self {
            start_date,
            end_date,
            daily: DailySlots::Calendar(calendar_slots(start_date, end_date)),
            quarters: BTreeMap::new(),
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn layout(&self) -> SlotLayout {
        self.daily.layout()
    }

    pub fn daily(&self) -> &DailySlots {
        &self.daily
    }

    pub fn slots(&self) -> &[DaySlot] {
        self.daily.as_slice()
    }

    /// Move the start bound and rebuild the slots to match.
    pub fn set_start_date(&mut self, start_date: NaiveDate) -> Result<(), FeedError> {
        check_range(start_date, self.end_date)?;
        self.rebuild(start_date, self.end_date);
        Ok(())
    }

    /// Move the end bound and rebuild the slots to match.
    pub fn set_end_date(&mut self, end_date: NaiveDate) -> Result<(), FeedError> {
        check_range(self.start_date, end_date)?;
        self.rebuild(self.start_date, end_date);
        Ok(())
    }

    /// Records on days that stay in range are kept. The calendar layout
    /// gains empty slots for newly covered days; the tradable-only layout
    /// only loses slots.
    fn rebuild(&mut self, start_date: NaiveDate, end_date: NaiveDate) {
        let in_range = |slot: &DaySlot| slot.date() >= start_date && slot.date() <= end_date;
        let old = std::mem::replace(&mut self.daily, DailySlots::Calendar(Vec::new()));

        self.daily = match old {
            DailySlots::Calendar(slots) => {
                let mut kept: HashMap<NaiveDate, DaySlot> = slots
                    .into_iter()
                    .filter(|slot| in_range(slot))
                    .map(|slot| (slot.date(), slot))
                    .collect();
                let rebuilt = date_range(start_date, end_date)
                    .map(|date| kept.remove(&date).unwrap_or_else(|| DaySlot::new(date)))
                    .collect();
                DailySlots::Calendar(rebuilt)
            }
            DailySlots::TradableOnly(slots) => {
                DailySlots::TradableOnly(slots.into_iter().filter(|slot| in_range(slot)).collect())
            }
        };
        self.start_date = start_date;
        self.end_date = end_date;
        debug!(
            "rebuilt timeline {}..={} ({} slots)",
            start_date,
            end_date,
            self.daily.as_slice().len()
        );
    }

    /// Route every row of a daily table into the slot for its date.
    ///
    /// Returns the number of rows applied. Not transactional: on error,
    /// rows before the failing one have already been applied.
    pub fn ingest_daily(&mut self, table: &DatedTable, instrument: &str) -> Result<usize, FeedError> {
        let partition = DailySchema::partition(table.columns())?;

        let mut applied = 0;
        for (row_index, row) in table.rows().iter().enumerate() {
            let date = row.key.to_date()?;
            let index = self.ingest_position(date)?;
            let record = partition.build_record(instrument, row, row_index)?;
            self.daily.as_mut_slice()[index].add_record(record);
            applied += 1;
        }

        debug!("ingested {} daily rows for {}", applied, instrument);
        Ok(applied)
    }

    fn ingest_position(&self, date: NaiveDate) -> Result<usize, FeedError> {
        if date < self.start_date || date > self.end_date {
            return Err(FeedError::DateOutOfRange {
                date,
                start: self.start_date,
                end: self.end_date,
            });
        }
        self.daily
            .position(self.start_date, date)
            .ok_or(FeedError::DateTrimmed { date })
    }

    /// Keep only tradable slots, in order. Returns how many were removed.
    ///
    /// Afterwards the layout is [`SlotLayout::TradableOnly`]; calling again
    /// removes nothing.
    pub fn trim_daily(&mut self) -> usize {
        let old = std::mem::replace(&mut self.daily, DailySlots::TradableOnly(Vec::new()));
        let before = old.as_slice().len();
        let kept: Vec<DaySlot> = old.into_vec().into_iter().filter(DaySlot::is_tradable).collect();
        let removed = before - kept.len();

        info!("trimmed {} non-tradable days, {} remain", removed, kept.len());
        self.daily = DailySlots::TradableOnly(kept);
        removed
    }

    pub fn get_daily_feed(&self, index: usize) -> Result<&DaySlot, FeedError> {
        let slots = self.daily.as_slice();
        slots.get(index).ok_or(FeedError::DayIndexOutOfBounds {
            index,
            len: slots.len(),
        })
    }

    pub fn get_daily_feed_mut(&mut self, index: usize) -> Result<&mut DaySlot, FeedError> {
        let slots = self.daily.as_mut_slice();
        let len = slots.len();
        slots
            .get_mut(index)
            .ok_or(FeedError::DayIndexOutOfBounds { index, len })
    }

    /// The slot for a calendar date, in either layout.
    pub fn slot_for_date(&self, date: NaiveDate) -> Option<&DaySlot> {
        self.position_of_date(date)
            .map(|index| &self.daily.as_slice()[index])
    }

    /// Index of the slot for a calendar date in the current layout.
    pub fn position_of_date(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start_date || date > self.end_date {
            return None;
        }
        self.daily.position(self.start_date, date)
    }

    /// Number of slots currently held.
    ///
    /// Equals the tradable-day count only after [`trim_daily`](Self::trim_daily).
    pub fn get_tradable_dates(&self) -> usize {
        self.daily.as_slice().len()
    }

    /// Close value of `instrument` on the slot at `day_index`.
    pub fn get_price_of_instrument(&self, instrument: &str, day_index: usize) -> Result<i64, FeedError> {
        self.get_daily_feed(day_index)?
            .get_record(instrument)?
            .bar(BarField::Close)
            .ok_or_else(|| FeedError::MissingColumn(BarField::Close.column_name().to_string()))
    }

    /// Whether `price` was achievable for `instrument` on the slot at
    /// `day_index`: the record is tradable and `Low <= price <= High`.
    pub fn is_instrument_enabled(
        &self,
        instrument: &str,
        day_index: usize,
        price: f64,
    ) -> Result<bool, FeedError> {
        let record = self.get_daily_feed(day_index)?.get_record(instrument)?;
        if !record.is_tradable() {
            return Ok(false);
        }
        match (record.bar(BarField::Low), record.bar(BarField::High)) {
            (Some(low), Some(high)) => Ok(price >= low as f64 && price <= high as f64),
            _ => Ok(false),
        }
    }

    /// Store each row as the instrument's fundamentals for the row's date.
    ///
    /// Every column is a finance field; null cells are skipped. Quarter
    /// dates are not bounded by the daily range.
    pub fn add_quarterly_feed(&mut self, table: &DatedTable, instrument: &str) -> Result<usize, FeedError> {
        let mut applied = 0;
        for row in table.rows() {
            let date = row.key.to_date()?;
            let mut record = InstrumentQuarterlyRecord::new(instrument);
            for (name, value) in table.columns().iter().zip(&row.values) {
                if let Some(value) = value {
                    record.add_finance_data(name.clone(), *value);
                }
            }
            self.quarters
                .entry(date)
                .or_insert_with(|| QuarterSlot::new(date))
                .add_record(record);
            applied += 1;
        }

        debug!("added {} quarterly rows for {}", applied, instrument);
        Ok(applied)
    }

    /// The quarter slot `resolver` picks for `date`.
    pub fn get_quarterly_feed(
        &self,
        date: NaiveDate,
        resolver: &dyn QuarterResolver,
    ) -> Option<&QuarterSlot> {
        resolver.resolve(&self.quarters, date)
    }

    pub fn quarters(&self) -> &BTreeMap<NaiveDate, QuarterSlot> {
        &self.quarters
    }
}

fn check_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), FeedError> {
    if end_date < start_date {
        return Err(FeedError::InvalidRange {
            start: start_date,
            end: end_date,
        });
    }
    Ok(())
}

fn date_range(start_date: NaiveDate, end_date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start_date.iter_days().take_while(move |date| *date <= end_date)
}

fn calendar_slots(start_date: NaiveDate, end_date: NaiveDate) -> Vec<DaySlot> {
    date_range(start_date, end_date).map(DaySlot::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ExactQuarter;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily_table(rows: &[(&str, f64, f64)]) -> DatedTable {
        let mut table = DatedTable::new(["Open", "High", "Low", "Close", "Adj Close", "Volume"]);
        for (date, close, volume) in rows {
            table
                .push_values(*date, &[*close, close + 1.0, close - 1.0, *close, *close, *volume])
                .unwrap();
        }
        table
    }

    fn sample_timeline() -> FeedTimeline {
        let mut timeline = FeedTimeline::new(d(2020, 1, 1), d(2020, 1, 5)).unwrap();
        let table = daily_table(&[
            ("2020-01-01", 10.0, 100.0),
            ("2020-01-02", 11.0, 0.0),
            ("2020-01-03", 12.0, 50.0),
        ]);
        timeline.ingest_daily(&table, "ABC").unwrap();
        timeline
    }

    #[test]
    fn new_allocates_one_slot_per_day() {
        let timeline = FeedTimeline::new(d(2020, 1, 1), d(2020, 1, 5)).unwrap();
        assert_eq!(timeline.get_tradable_dates(), 5);
        for (i, slot) in timeline.slots().iter().enumerate() {
            assert_eq!(slot.date(), d(2020, 1, 1 + i as u32));
            assert!(!slot.is_tradable());
        }
        assert_eq!(timeline.layout(), SlotLayout::Calendar);
    }

    #[test]
    fn single_day_range_has_one_slot() {
        let timeline = FeedTimeline::new(d(2020, 2, 29), d(2020, 2, 29)).unwrap();
        assert_eq!(timeline.get_tradable_dates(), 1);
    }

    #[test]
    fn new_rejects_inverted_range() {
        let err = FeedTimeline::new(d(2020, 1, 5), d(2020, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            FeedError::InvalidRange {
                start: d(2020, 1, 5),
                end: d(2020, 1, 1)
            }
        );
    }

    #[test]
    fn scenario_before_and_after_trim() {
        let mut timeline = sample_timeline();
        assert_eq!(timeline.get_tradable_dates(), 5);
        assert_eq!(timeline.get_price_of_instrument("ABC", 0).unwrap(), 10);

        assert_eq!(timeline.trim_daily(), 3);
        assert_eq!(timeline.get_tradable_dates(), 2);
        let dates: Vec<NaiveDate> = timeline.slots().iter().map(DaySlot::date).collect();
        assert_eq!(dates, vec![d(2020, 1, 1), d(2020, 1, 3)]);
        assert_eq!(timeline.get_price_of_instrument("ABC", 1).unwrap(), 12);
    }

    #[test]
    fn trim_twice_is_idempotent() {
        let mut timeline = sample_timeline();
        timeline.trim_daily();
        let once = timeline.clone();
        assert_eq!(timeline.trim_daily(), 0);
        assert_eq!(timeline, once);
    }

    #[test]
    fn zero_volume_row_leaves_slot_untradable() {
        let timeline = sample_timeline();
        assert!(!timeline.get_daily_feed(1).unwrap().is_tradable());
        assert!(timeline.get_daily_feed(2).unwrap().is_tradable());
    }

    #[test]
    fn another_tradable_instrument_keeps_slot_tradable() {
        let mut timeline = sample_timeline();
        timeline
            .ingest_daily(&daily_table(&[("2020-01-02", 50.0, 10.0)]), "XYZ")
            .unwrap();
        assert!(timeline.get_daily_feed(1).unwrap().is_tradable());
        assert!(!timeline
            .get_daily_feed(1)
            .unwrap()
            .get_record("ABC")
            .unwrap()
            .is_tradable());
    }

    #[test]
    fn price_is_truncated_close() {
        let mut timeline = FeedTimeline::new(d(2020, 1, 1), d(2020, 1, 1)).unwrap();
        timeline
            .ingest_daily(&daily_table(&[("2020-01-01", 101.7, 10.0)]), "ABC")
            .unwrap();
        assert_eq!(timeline.get_price_of_instrument("ABC", 0).unwrap(), 101);
    }

    #[test]
    fn price_lookup_errors() {
        let timeline = sample_timeline();
        assert_eq!(
            timeline.get_price_of_instrument("ABC", 5).unwrap_err(),
            FeedError::DayIndexOutOfBounds { index: 5, len: 5 }
        );
        let err = timeline.get_price_of_instrument("XYZ", 0).unwrap_err();
        assert!(err.is_lookup());
    }

    #[test]
    fn out_of_range_row_fails_after_earlier_rows_applied() {
        let mut timeline = FeedTimeline::new(d(2020, 1, 1), d(2020, 1, 2)).unwrap();
        let table = daily_table(&[("2020-01-01", 10.0, 1.0), ("2020-01-09", 10.0, 1.0)]);
        let err = timeline.ingest_daily(&table, "ABC").unwrap_err();
        assert_eq!(
            err,
            FeedError::DateOutOfRange {
                date: d(2020, 1, 9),
                start: d(2020, 1, 1),
                end: d(2020, 1, 2)
            }
        );
        assert!(timeline.get_daily_feed(0).unwrap().contains("ABC"));
    }

    #[test]
    fn row_before_start_is_out_of_range() {
        let mut timeline = FeedTimeline::new(d(2020, 1, 2), d(2020, 1, 3)).unwrap();
        let err = timeline
            .ingest_daily(&daily_table(&[("2020-01-01", 1.0, 1.0)]), "ABC")
            .unwrap_err();
        assert!(matches!(err, FeedError::DateOutOfRange { .. }));
    }

    #[test]
    fn ingest_after_trim_routes_by_date() {
        let mut timeline = sample_timeline();
        timeline.trim_daily();

        timeline
            .ingest_daily(&daily_table(&[("2020-01-03", 40.0, 5.0)]), "XYZ")
            .unwrap();
        assert_eq!(timeline.get_price_of_instrument("XYZ", 1).unwrap(), 40);

        let err = timeline
            .ingest_daily(&daily_table(&[("2020-01-02", 40.0, 5.0)]), "XYZ")
            .unwrap_err();
        assert_eq!(err, FeedError::DateTrimmed { date: d(2020, 1, 2) });
    }

    #[test]
    fn slot_for_date_works_in_both_layouts() {
        let mut timeline = sample_timeline();
        assert_eq!(timeline.slot_for_date(d(2020, 1, 3)).unwrap().date(), d(2020, 1, 3));
        assert!(timeline.slot_for_date(d(2019, 12, 31)).is_none());

        timeline.trim_daily();
        assert_eq!(timeline.slot_for_date(d(2020, 1, 3)).unwrap().date(), d(2020, 1, 3));
        assert!(timeline.slot_for_date(d(2020, 1, 2)).is_none());
    }

    #[test]
    fn set_start_date_rebuilds_and_keeps_records() {
        let mut timeline = sample_timeline();
        timeline.set_start_date(d(2020, 1, 3)).unwrap();
        assert_eq!(timeline.get_tradable_dates(), 3);
        assert_eq!(timeline.get_price_of_instrument("ABC", 0).unwrap(), 12);

        timeline.set_start_date(d(2019, 12, 30)).unwrap();
        assert_eq!(timeline.get_tradable_dates(), 7);
        assert!(timeline.get_daily_feed(0).unwrap().is_empty());
        assert_eq!(timeline.get_price_of_instrument("ABC", 4).unwrap(), 12);
    }

    #[test]
    fn set_end_date_rebuilds_calendar() {
        let mut timeline = sample_timeline();
        timeline.set_end_date(d(2020, 1, 10)).unwrap();
        assert_eq!(timeline.get_tradable_dates(), 10);
        assert_eq!(timeline.slots().last().unwrap().date(), d(2020, 1, 10));
    }

    #[test]
    fn bound_updates_reject_inverted_range() {
        let mut timeline = sample_timeline();
        assert!(matches!(
            timeline.set_start_date(d(2020, 1, 6)),
            Err(FeedError::InvalidRange { .. })
        ));
        assert!(matches!(
            timeline.set_end_date(d(2019, 12, 31)),
            Err(FeedError::InvalidRange { .. })
        ));
        assert_eq!(timeline.get_tradable_dates(), 5);
    }

    #[test]
    fn bound_update_after_trim_only_drops() {
        let mut timeline = sample_timeline();
        timeline.trim_daily();
        timeline.set_end_date(d(2020, 1, 20)).unwrap();
        assert_eq!(timeline.get_tradable_dates(), 2);
        timeline.set_start_date(d(2020, 1, 2)).unwrap();
        assert_eq!(timeline.get_tradable_dates(), 1);
        assert_eq!(timeline.layout(), SlotLayout::TradableOnly);
    }

    #[test]
    fn instrument_enabled_checks_tradable_and_range() {
        let timeline = sample_timeline();
        // 2020-01-01: close 10, high 11, low 9, volume 100
        assert!(timeline.is_instrument_enabled("ABC", 0, 10.0).unwrap());
        assert!(timeline.is_instrument_enabled("ABC", 0, 9.0).unwrap());
        assert!(!timeline.is_instrument_enabled("ABC", 0, 11.5).unwrap());
        // 2020-01-02 has zero volume
        assert!(!timeline.is_instrument_enabled("ABC", 1, 11.0).unwrap());
        assert!(timeline.is_instrument_enabled("XYZ", 0, 10.0).is_err());
    }

    #[test]
    fn quarterly_feed_is_stored_by_anchor_date() {
        let mut timeline = sample_timeline();
        let mut table = DatedTable::new(["EPS", "BPS"]);
        table.push_row("2019-12-31", vec![Some(1.5), None]).unwrap();
        table.push_row("2020-03-31", vec![Some(1.7), Some(20.0)]).unwrap();

        assert_eq!(timeline.add_quarterly_feed(&table, "ABC").unwrap(), 2);
        assert_eq!(timeline.quarters().len(), 2);

        let q4 = timeline
            .get_quarterly_feed(d(2019, 12, 31), &ExactQuarter)
            .unwrap();
        let record = q4.record("ABC").unwrap();
        assert_eq!(record.finance_data().get("EPS"), Some(&1.5));
        assert!(!record.finance_data().contains_key("BPS"));

        assert!(timeline.get_quarterly_feed(d(2020, 1, 1), &ExactQuarter).is_none());
    }

    #[test]
    fn position_of_date_follows_layout() {
        let mut timeline = sample_timeline();
        assert_eq!(timeline.position_of_date(d(2020, 1, 3)), Some(2));
        assert_eq!(timeline.position_of_date(d(2020, 1, 6)), None);

        timeline.trim_daily();
        assert_eq!(timeline.position_of_date(d(2020, 1, 3)), Some(1));
        assert_eq!(timeline.position_of_date(d(2020, 1, 2)), None);
    }

    #[test]
    fn extra_data_can_be_added_after_ingestion() {
        let mut timeline = sample_timeline();
        timeline
            .get_daily_feed_mut(2)
            .unwrap()
            .get_record_mut("ABC")
            .unwrap()
            .add_extra_data("PER", 9);

        let record = timeline.get_daily_feed(2).unwrap().get_record("ABC").unwrap();
        assert_eq!(record.extra_data().get("PER"), Some(&9));

        let err = timeline
            .get_daily_feed_mut(2)
            .unwrap()
            .get_record_mut("XYZ")
            .unwrap_err();
        assert_eq!(
            err,
            FeedError::InstrumentNotFound {
                instrument: "XYZ".into(),
                date: d(2020, 1, 3)
            }
        );
        assert!(matches!(
            timeline.get_daily_feed_mut(9),
            Err(FeedError::DayIndexOutOfBounds { index: 9, len: 5 })
        ));
    }

    #[test]
    fn missing_bar_column_fails_before_any_row() {
        let mut timeline = FeedTimeline::new(d(2020, 1, 1), d(2020, 1, 2)).unwrap();
        let mut table = DatedTable::new(["Close", "Volume"]);
        table.push_values("2020-01-01", &[1.0, 1.0]).unwrap();
        let err = timeline.ingest_daily(&table, "ABC").unwrap_err();
        assert!(matches!(err, FeedError::MissingColumn(_)));
        assert!(timeline.get_daily_feed(0).unwrap().is_empty());
    }
}
