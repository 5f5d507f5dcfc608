use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::models::{PriceValue, ScheduleResponse, TimeSlot};

/// One schedule cell flattened out of the nested API response.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub field_id: String,
    pub court: String,
    pub date: NaiveDate,
    pub time: String,
    pub time_id: String,
    pub price: i64,
    pub status: String,
    pub is_booked: bool,
    pub location_id: String,
}

impl SlotRecord {
    /// Booked cells and availability blocks cannot be picked.
    pub fn is_available(&self) -> bool {
        if self.is_booked {
            return false;
        }
        !matches!(
            self.status.to_lowercase().as_str(),
            "booked" | "closed" | "unavailable"
        )
    }

    pub fn to_time_slot(&self) -> TimeSlot {
        TimeSlot {
            date: self.date,
            time: self.time.clone(),
            time_id: self.time_id.clone(),
            court: self.court.clone(),
            field_id: self.field_id.clone(),
            price: self.price,
        }
    }
}

/// Strip currency formatting: `"Rp 50.000"` becomes `50000`.
///
/// Dots and commas are thousands separators in the facility's locale, so
/// only digits are kept from text prices.
pub fn parse_price(value: &PriceValue) -> i64 {
    match value {
        PriceValue::Number(n) => n.round() as i64,
        PriceValue::Text(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        }
    }
}

/// Parse `YYYY-MM-DD`, also accepting a trailing time part.
pub fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let head = s.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Every day from `start` to `end`, both inclusive.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        day += Duration::days(1);
    }
    days
}

pub fn display_dates(resp: &ScheduleResponse) -> Vec<NaiveDate> {
    let start = resp.start_date.as_deref().and_then(parse_api_date);
    let end = resp.end_date.as_deref().and_then(parse_api_date);
    match (start, end) {
        (Some(s), Some(e)) => date_range(s, e),
        _ => {
            debug!("Schedule response has no usable date range");
            Vec::new()
        }
    }
}

pub fn normalize(resp: &ScheduleResponse, location_id: &str) -> Vec<SlotRecord> {
    let mut records = Vec::new();
    for field in &resp.fields {
        for daily in &field.daily_schedules {
            let date = match parse_api_date(&daily.date) {
                Some(d) => d,
                None => {
                    warn!(
                        "Skipping schedule for field {} with bad date '{}'",
                        field.field_id, daily.date
                    );
                    continue;
                }
            };
            for entry in &daily.schedules {
                records.push(SlotRecord {
                    field_id: field.field_id.clone(),
                    court: field.field_name.clone(),
                    date,
                    time: entry.time.clone(),
                    time_id: entry.time_id.clone(),
                    price: parse_price(&entry.price),
                    status: entry.status.clone(),
                    is_booked: entry.is_booked,
                    location_id: location_id.to_string(),
                });
            }
        }
    }
    debug!("Normalized {} schedule slots", records.len());
    records
}

/// Per-court, per-date buckets, courts in response order.
pub fn group_by_court(records: &[SlotRecord]) -> Vec<(String, BTreeMap<NaiveDate, Vec<&SlotRecord>>)> {
    let mut courts: Vec<(String, BTreeMap<NaiveDate, Vec<&SlotRecord>>)> = Vec::new();
    for record in records {
        let idx = match courts.iter().position(|(c, _)| *c == record.court) {
            Some(i) => i,
            None => {
                courts.push((record.court.clone(), BTreeMap::new()));
                courts.len() - 1
            }
        };
        courts[idx].1.entry(record.date).or_default().push(record);
    }
    courts
}

pub fn find_record<'a>(
    records: &'a [SlotRecord],
    date: NaiveDate,
    field_id: &str,
    time_id: &str,
) -> Option<&'a SlotRecord> {
    records
        .iter()
        .find(|r| r.date == date && r.field_id == field_id && r.time_id == time_id)
}

#[cfg(test)]
pub(crate) fn sample_response() -> ScheduleResponse {
    serde_json::from_value(serde_json::json!({
        "fields": [
            {
                "fieldId": 5,
                "fieldName": "Lapangan A",
                "dailySchedules": [
                    {
                        "date": "2025-03-10",
                        "schedules": [
                            {"time": "19 - 20", "timeId": "t19", "price": "Rp 50.000", "status": "available", "isBooked": false},
                            {"time": "20 - 21", "timeId": "t20", "price": 50000, "status": "available", "isBooked": false},
                            {"time": "21 - 22", "timeId": "t21", "price": 60000, "status": "booked", "isBooked": true}
                        ]
                    },
                    {
                        "date": "2025-03-11T00:00:00.000Z",
                        "schedules": [
                            {"time": "19 - 20", "timeId": "t19", "price": 50000, "status": "closed", "isBooked": false}
                        ]
                    }
                ]
            },
            {
                "fieldId": "6",
                "fieldName": "Lapangan B",
                "dailySchedules": [
                    {
                        "date": "2025-03-10",
                        "schedules": [
                            {"time": "19 - 20", "timeId": "t19", "price": "75,000", "status": "available", "isBooked": false}
                        ]
                    }
                ]
            }
        ],
        "start_date": "2025-03-10",
        "end_date": "2025-03-16"
    }))
    .unwrap()
}
