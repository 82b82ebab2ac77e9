//! Calendar structure: working days, holidays, slot weights and the grid.
//!
//! The grid holds exactly `SLOTS_PER_DAY` consecutive slots per working day,
//! ordered by (date, time of day). Weekly recurrence jumps a fixed number of
//! slots and relies on that layout, so the grid never skips a slot.

use crate::config::SchedulerConfig;
use crate::data::{SlotId, TimeSlot};
use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub const SLOTS_PER_DAY: usize = 8;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(raw.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Position of a weekday in the weight table, Monday first.
///
/// Sunday has no entry; the table only covers Monday..Saturday.
pub fn weekday_index(date: NaiveDate) -> Option<usize> {
    match date.weekday() {
        Weekday::Sun => None,
        day => Some(day.num_days_from_monday() as usize),
    }
}

/// Monday through Saturday count as teaching days.
pub fn is_workday(date: NaiveDate) -> bool {
    weekday_index(date).is_some()
}

/// Every teaching day in `[start, end]`, ascending.
pub fn workdays_between(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Err(Error::InvalidDateRange { start, end });
    }
    Ok(start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_workday(*d))
        .collect())
}

/// Dates on which nothing may be scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidaySet(HashSet<NaiveDate>);

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self> {
        raw.iter().map(|s| parse_date(s.as_ref())).collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Initial desirability of a slot from its weekday and time of day.
pub struct WeightModel<'a> {
    weekday_weights: &'a [f64],
    time_of_day_weights: &'a [f64],
    holidays: &'a HolidaySet,
}

impl<'a> WeightModel<'a> {
    pub fn new(config: &'a SchedulerConfig, holidays: &'a HolidaySet) -> Self {
        Self {
            weekday_weights: &config.weekday_weights,
            time_of_day_weights: &config.time_of_day_weights,
            holidays,
        }
    }

    /// Zero on holidays and on days or bands missing from the tables.
    pub fn weight(&self, date: NaiveDate, time_of_day: usize) -> f64 {
        if self.holidays.contains(date) {
            return 0.0;
        }
        let day = weekday_index(date).and_then(|i| self.weekday_weights.get(i));
        let band = self.time_of_day_weights.get(time_of_day);
        match (day, band) {
            (Some(day), Some(band)) => day * band,
            _ => 0.0,
        }
    }
}

/// The ordered slot sequence a run fills.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarGrid {
    slots: Vec<TimeSlot>,
}

impl CalendarGrid {
    /// Builds one block of `SLOTS_PER_DAY` empty slots per working date.
    ///
    /// Dates are sorted and de-duplicated first so the block layout holds.
    /// The config is validated so every day gets a full set of bands.
    pub fn build(workdays: &[NaiveDate], config: &SchedulerConfig, holidays: &HolidaySet) -> Result<Self> {
        config.validate()?;

        let days: BTreeSet<NaiveDate> = workdays.iter().copied().collect();
        if days.len() != workdays.len() {
            debug!("Dropped {} duplicate working day(s)", workdays.len() - days.len());
        }

        let model = WeightModel::new(config, holidays);
        let mut slots = Vec::with_capacity(days.len() * SLOTS_PER_DAY);
        for date in days {
            for (time_of_day, &minutes) in config.time_of_day_minutes.iter().enumerate() {
                let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN);
                slots.push(TimeSlot {
                    id: slots.len(),
                    date,
                    time_of_day,
                    date_time: date.and_time(time),
                    weight: model.weight(date, time_of_day),
                    assignment: None,
                    entropy: -1,
                });
            }
        }

        info!(
            "Built calendar grid: {} working day(s), {} slot(s)",
            slots.len() / SLOTS_PER_DAY,
            slots.len()
        );
        Ok(Self { slots })
    }

    pub fn from_slots(slots: Vec<TimeSlot>) -> Self {
        Self { slots }
    }

    pub fn slots_per_day(&self) -> usize {
        SLOTS_PER_DAY
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: SlotId) -> Option<&TimeSlot> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut TimeSlot> {
        self.slots.get_mut(id)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [TimeSlot] {
        &mut self.slots
    }

    pub fn filled(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter().filter(|s| s.is_filled())
    }
}
