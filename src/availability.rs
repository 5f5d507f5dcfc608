use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::error::FieldError;

/// An availability block that closes one field for a date and time window.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClosedFieldForm {
    pub field_id: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    pub reason: String,
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
        .ok()
}

impl ClosedFieldForm {
    /// Field-level checks run before anything is sent to the API.
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.field_id.trim().is_empty() {
            errors.push(FieldError::new("fieldId", "Field is required"));
        }
        if self.reason.trim().is_empty() {
            errors.push(FieldError::new("reason", "Reason is required"));
        }

        let start = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").ok();
        let end = NaiveDate::parse_from_str(self.end_date.trim(), "%Y-%m-%d").ok();
        match start {
            None => errors.push(FieldError::new("startDate", "Start date must be YYYY-MM-DD")),
            Some(s) if s < today => {
                errors.push(FieldError::new("startDate", "Start date cannot be in the past"))
            }
            _ => {}
        }
        match (start, end) {
            (_, None) => errors.push(FieldError::new("endDate", "End date must be YYYY-MM-DD")),
            (Some(s), Some(e)) if e < s => {
                errors.push(FieldError::new("endDate", "End date must not be before start date"))
            }
            _ => {}
        }

        let start_time = parse_time(&self.start_time);
        let end_time = parse_time(&self.end_time);
        if start_time.is_none() {
            errors.push(FieldError::new("startTime", "Start time must be HH:MM"));
        }
        match (start_time, end_time) {
            (_, None) => errors.push(FieldError::new("endTime", "End time must be HH:MM")),
            (Some(s), Some(e)) if e <= s => {
                errors.push(FieldError::new("endTime", "End time must be after start time"))
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
