//! Working-day arithmetic and the organisation holiday calendar.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{HrmResult, ValidationError};
use crate::model::holiday::Holiday;

/// Holiday lookups the core consumes.
pub trait HolidayLookup: Send + Sync {
    fn holiday_on(&self, date: NaiveDate) -> Option<Holiday>;

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_on(date).is_some()
    }

    /// Holiday dates inside the inclusive range.
    fn holidays_in_range(&self, start: NaiveDate, end: NaiveDate) -> BTreeSet<NaiveDate>;
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts the days in `[start, end]` that are neither holidays nor, when
/// `exclude_weekends` is set, Saturdays or Sundays. Returns 0 when `start > end`.
pub fn working_days(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &BTreeSet<NaiveDate>,
    exclude_weekends: bool,
) -> u32 {
    if start > end {
        return 0;
    }
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !(exclude_weekends && is_weekend(*day)))
        .filter(|day| !holidays.contains(day))
        .count() as u32
}

/// Every calendar day in `[start, end]`, or 0 when `start > end`.
pub fn calendar_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }
    ((end - start).num_days() + 1) as u32
}

/// How leave requests are charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayCountMode {
    /// Holidays never count; weekends count unless excluded.
    Working,
    /// Every day of the range counts.
    Calendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavePolicy {
    pub mode: DayCountMode,
    pub exclude_weekends: bool,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            mode: DayCountMode::Working,
            exclude_weekends: true,
        }
    }
}

impl LeavePolicy {
    /// Days a request covering `[start, end]` is charged under this policy.
    pub fn count_days(&self, start: NaiveDate, end: NaiveDate, holidays: &dyn HolidayLookup) -> u32 {
        match self.mode {
            DayCountMode::Calendar => calendar_days(start, end),
            DayCountMode::Working => working_days(
                start,
                end,
                &holidays.holidays_in_range(start, end),
                self.exclude_weekends,
            ),
        }
    }
}

/// In-process holiday registry, one holiday per date.
#[derive(Default)]
pub struct HolidayCalendar {
    days: RwLock<BTreeMap<NaiveDate, Holiday>>,
    next_id: AtomicU64,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a holiday loaded from storage, replacing any entry on its date.
    pub fn load(&self, holiday: Holiday) {
        self.next_id.fetch_max(holiday.id, Ordering::Relaxed);
        self.days
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(holiday.date, holiday);
    }

    pub fn declare(
        &self,
        date: NaiveDate,
        name: impl Into<String>,
        is_optional: bool,
        description: impl Into<String>,
    ) -> HrmResult<Holiday> {
        let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
        if days.contains_key(&date) {
            return Err(ValidationError::DuplicateHoliday { date }.into());
        }
        let holiday = Holiday {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            date,
            name: name.into(),
            is_optional,
            description: description.into(),
        };
        days.insert(date, holiday.clone());
        Ok(holiday)
    }

    pub fn remove(&self, date: NaiveDate) -> Option<Holiday> {
        self.days
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&date)
    }

    pub fn for_year(&self, year: i32) -> Vec<Holiday> {
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Vec::new();
        };
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range(first..=last)
            .map(|(_, holiday)| holiday.clone())
            .collect()
    }
}

impl HolidayLookup for HolidayCalendar {
    fn holiday_on(&self, date: NaiveDate) -> Option<Holiday> {
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&date)
            .cloned()
    }

    fn holidays_in_range(&self, start: NaiveDate, end: NaiveDate) -> BTreeSet<NaiveDate> {
        if start > end {
            return BTreeSet::new();
        }
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range(start..=end)
            .map(|(date, _)| *date)
            .collect()
    }
}
