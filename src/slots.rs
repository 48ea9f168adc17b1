use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Length of one bookable slot.
pub const SLOT_MINUTES: u32 = 30;
/// Slot 0 starts at 05:00; the last slot starts at 23:30.
pub const DAY_START_HOUR: u32 = 5;
/// Number of slots in a business day (05:00 up to midnight).
pub const SLOT_COUNT: u8 = ((24 - DAY_START_HOUR) * 60 / SLOT_MINUTES) as u8;

/// A 30-minute booking slot, encoded as an offset from 05:00.
///
/// The backend stores selected hours as bare integers; this newtype keeps the
/// epoch in one place so range merging cannot drift off by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = u8, example = 8)]
pub struct TimeSlot(u8);

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u8::deserialize(deserializer)?;
        TimeSlot::new(index).ok_or_else(|| {
            serde::de::Error::custom(format!("slot index {index} out of range 0..{SLOT_COUNT}"))
        })
    }
}

impl TimeSlot {
    pub fn new(index: u8) -> Option<Self> {
        (index < SLOT_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Start of the slot, e.g. slot 8 -> 09:00.
    pub fn start_time(self) -> NaiveTime {
        let minutes = DAY_START_HOUR * 60 + self.0 as u32 * SLOT_MINUTES;
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).expect("slot index in range")
    }

    /// Exclusive end of the slot; midnight for the last slot of the day.
    pub fn end_time(self) -> NaiveTime {
        let minutes = DAY_START_HOUR * 60 + (self.0 as u32 + 1) * SLOT_MINUTES;
        NaiveTime::from_hms_opt((minutes / 60) % 24, minutes % 60, 0).expect("slot index in range")
    }

    /// Slot whose start matches the given time, if it falls on a boundary.
    pub fn from_start_time(time: NaiveTime) -> Option<Self> {
        if time.second() != 0 || time.minute() % SLOT_MINUTES != 0 {
            return None;
        }
        let minutes = time.hour() * 60 + time.minute();
        let offset = minutes.checked_sub(DAY_START_HOUR * 60)?;
        Self::new((offset / SLOT_MINUTES) as u8)
    }

    /// 12-hour display label, e.g. "9:00 AM".
    pub fn label(self) -> String {
        format_label(self.start_time())
    }

    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..SLOT_COUNT).map(TimeSlot)
    }

    /// The editor's "default hours" bulk helper: 09:00 to 17:00.
    pub fn nine_to_five() -> Vec<TimeSlot> {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("valid time");
        let five = NaiveTime::from_hms_opt(17, 0, 0).expect("valid time");
        Self::all()
            .filter(|slot| slot.start_time() >= nine && slot.end_time() <= five)
            .collect()
    }

    /// The editor's "select all" bulk helper.
    pub fn full_day() -> Vec<TimeSlot> {
        Self::all().collect()
    }
}

fn format_label(time: NaiveTime) -> String {
    let hour = time.hour();
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    let ampm = if hour < 12 { "AM" } else { "PM" };
    format!("{}:{:02} {}", hour12, time.minute(), ampm)
}

/// Renders selected slots as merged display ranges.
///
/// Adjacent indices collapse into "start - end" with an exclusive end, so
/// slots 8 and 9 read "9:00 AM - 10:00 AM". Isolated slots render as their
/// bare start label, ranges join with ", ".
pub fn format_slot_ranges(slots: &[TimeSlot]) -> String {
    if slots.is_empty() {
        return "No times selected".to_string();
    }

    let mut sorted: Vec<TimeSlot> = slots.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut ranges: Vec<String> = Vec::new();
    let mut start = sorted[0];
    let mut end = sorted[0];

    for &slot in &sorted[1..] {
        if slot.index() == end.index() + 1 {
            end = slot;
        } else {
            ranges.push(render_range(start, end));
            start = slot;
            end = slot;
        }
    }
    ranges.push(render_range(start, end));

    ranges.join(", ")
}

fn render_range(start: TimeSlot, end: TimeSlot) -> String {
    if start == end {
        start.label()
    } else {
        format!("{} - {}", start.label(), format_label(end.end_time()))
    }
}
