use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::models::{Appointment, Weekday, WeeklyHours};
use crate::slots::TimeSlot;

/// Layout of one displayed month: how many blank cells lead the grid and how
/// many days the month has. Weeks start on Sunday, as the original grid did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days_in_month: u32,
}

impl MonthGrid {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let days_in_month = next_month.pred_opt()?.day();

        Some(Self {
            year,
            month,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days_in_month,
        })
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        if day == 0 || day > self.days_in_month {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=self.days_in_month).filter_map(|day| self.date(day))
    }

    pub fn prev(&self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn next(&self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

/// Appointments falling on a calendar date. Pure `NaiveDate` equality, so a
/// row dated "2024-06-15" always lands on June 15 no matter what timezone the
/// process runs in.
pub fn appointments_on<'a>(appointments: &'a [Appointment], date: NaiveDate) -> Vec<&'a Appointment> {
    appointments.iter().filter(|apt| apt.date == date).collect()
}

/// Weekly-hours overlay used by both the booking page and the management
/// calendar: a date is bookable when it is not individually closed, its
/// weekday is open, and at least one slot is selected.
pub fn is_available(date: NaiveDate, hours: &WeeklyHours, closed: &BTreeSet<NaiveDate>) -> bool {
    if closed.contains(&date) {
        return false;
    }
    let day = hours.day(Weekday::of(date));
    day.is_open && !day.selected_slots.is_empty()
}

pub fn is_open(date: NaiveDate, hours: &WeeklyHours, closed: &BTreeSet<NaiveDate>) -> bool {
    !closed.contains(&date) && hours.day(Weekday::of(date)).is_open
}

/// Bookable start times for one date: the weekday's selected slots, unless
/// the date is in the past or closed.
pub fn available_slots(
    date: NaiveDate,
    today: NaiveDate,
    hours: &WeeklyHours,
    closed: &BTreeSet<NaiveDate>,
) -> Vec<TimeSlot> {
    if date < today || !is_available(date, hours, closed) {
        return Vec::new();
    }
    let mut slots = hours.day(Weekday::of(date)).selected_slots;
    slots.sort();
    slots.dedup();
    slots
}
