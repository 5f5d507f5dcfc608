use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Membership, TimeSlot};

/// A click on one visible schedule cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Toggle {
    pub date: NaiveDate,
    pub time: String,
    pub court: String,
    pub price: i64,
    pub field_id: String,
    pub time_id: String,
}

impl Toggle {
    fn slot_on(&self, date: NaiveDate) -> TimeSlot {
        TimeSlot {
            date,
            time: self.time.clone(),
            time_id: self.time_id.clone(),
            court: self.court.clone(),
            field_id: self.field_id.clone(),
            price: self.price,
        }
    }

    fn same_cell(&self, slot: &TimeSlot) -> bool {
        slot.time == self.time && slot.court == self.court && slot.field_id == self.field_id
    }
}

impl From<&TimeSlot> for Toggle {
    fn from(slot: &TimeSlot) -> Self {
        Toggle {
            date: slot.date,
            time: slot.time.clone(),
            court: slot.court.clone(),
            price: slot.price,
            field_id: slot.field_id.clone(),
            time_id: slot.time_id.clone(),
        }
    }
}

/// Currently selected slots, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    slots: Vec<TimeSlot>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, date: NaiveDate, field_id: &str, time_id: &str) -> bool {
        self.slots
            .iter()
            .any(|s| s.date == date && s.field_id == field_id && s.time_id == time_id)
    }

    /// Replace every price with the one `price_of` reports, dropping slots it
    /// has no price for.
    pub fn reprice<F>(mut self, price_of: F) -> Selection
    where
        F: Fn(&TimeSlot) -> Option<i64>,
    {
        self.slots = self
            .slots
            .into_iter()
            .filter_map(|mut s| {
                s.price = price_of(&s)?;
                Some(s)
            })
            .collect();
        self
    }

    /// Apply one click. With a membership the unit is the weekly pattern.
    pub fn toggle(self, action: &Toggle, membership: Option<&Membership>) -> Selection {
        match membership {
            Some(m) => self.toggle_pattern(action, m.weeks),
            None => self.toggle_single(action),
        }
    }

    fn toggle_single(mut self, action: &Toggle) -> Selection {
        let before = self.slots.len();
        self.slots
            .retain(|s| !(s.date == action.date && action.same_cell(s)));
        if self.slots.len() == before {
            self.slots.push(action.slot_on(action.date));
        }
        self
    }

    fn toggle_pattern(mut self, action: &Toggle, weeks: u32) -> Selection {
        let dates = weekly_dates(action.date, weeks);
        let matches = |s: &TimeSlot| action.same_cell(s) && dates.contains(&s.date);

        if self.slots.iter().any(|s| matches(s)) {
            self.slots.retain(|s| !matches(s));
        } else {
            self.slots
                .extend(dates.iter().map(|date| action.slot_on(*date)));
        }
        self
    }
}

/// Longest weekly pattern one click may generate.
pub const MAX_PATTERN_WEEKS: u32 = 104;

/// `weeks` dates from `start`, seven days apart. Fewer than one week counts
/// as one; the pattern stops at `MAX_PATTERN_WEEKS` or the calendar's end.
pub fn weekly_dates(start: NaiveDate, weeks: u32) -> Vec<NaiveDate> {
    (0..weeks.clamp(1, MAX_PATTERN_WEEKS))
        .map_while(|w| start.checked_add_signed(Duration::weeks(w as i64)))
        .collect()
}
