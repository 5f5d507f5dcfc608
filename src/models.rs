use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// IANA name of the facility timezone; decides what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Explicit session handed to the API client instead of ambient cookies.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_timezone() -> String {
    "Asia/Jakarta".to_string()
}

fn default_addr() -> String {
    "0.0.0.0:3009".to_string()
}

/// Accepts ids the API sends either as JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Prices arrive as numbers or as formatted strings like "Rp 50.000".
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl Default for PriceValue {
    fn default() -> Self {
        PriceValue::Number(0.0)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Location {
    #[serde(deserialize_with = "string_or_number", alias = "locationId")]
    pub id: String,
    #[serde(alias = "locationName")]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Sport {
    #[serde(default, deserialize_with = "string_or_number", alias = "sportId")]
    pub id: String,
    #[serde(alias = "sportName")]
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub fields: Vec<FieldSchedule>,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchedule {
    #[serde(deserialize_with = "string_or_number", alias = "field_id")]
    pub field_id: String,
    #[serde(default, alias = "field_name")]
    pub field_name: String,
    #[serde(default, alias = "daily_schedules")]
    pub daily_schedules: Vec<DailySchedule>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DailySchedule {
    pub date: String,
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub time: String,
    #[serde(default, deserialize_with = "string_or_number", alias = "time_id")]
    pub time_id: String,
    #[serde(default)]
    pub price: PriceValue,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "is_booked")]
    pub is_booked: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Membership {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "one_week")]
    pub weeks: u32,
    /// Percentage, e.g. `20.0` for 20 %.
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

fn one_week() -> u32 {
    1
}

/// One selectable hour-long booking unit.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: String,
    pub time_id: String,
    pub court: String,
    pub field_id: String,
    pub price: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(deserialize_with = "string_or_number", alias = "reservationId")]
    pub id: String,
    #[serde(default, alias = "reservationDate")]
    pub date: String,
    #[serde(default, alias = "timeRange")]
    pub time: String,
    #[serde(default, alias = "court")]
    pub field_name: String,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "total")]
    pub total_price: Option<PriceValue>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub reservation_id: String,
    #[serde(default)]
    pub amount: Option<PriceValue>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Placeholder for partial records; `Some("")` and `None` both render as it.
pub fn or_not_available(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("not available")
}

#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_or_not_available() {
        assert_eq!(or_not_available(Some("BCA")), "BCA");
        assert_eq!(or_not_available(Some("  ")), "not available");
        assert_eq!(or_not_available(None), "not available");
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let sport: Sport = serde_json::from_value(json!({"id": 3, "name": "Futsal"})).unwrap();
        assert_eq!(sport.id, "3");
        let sport: Sport =
            serde_json::from_value(json!({"sportId": "7", "sportName": "Badminton"})).unwrap();
        assert_eq!(sport.id, "7");
        assert_eq!(sport.name, "Badminton");
    }

    #[test]
    fn test_schedule_entry_defaults() {
        let entry: ScheduleEntry =
            serde_json::from_value(json!({"time": "19 - 20", "timeId": 12, "price": "Rp 50.000"}))
                .unwrap();
        assert_eq!(entry.time_id, "12");
        assert_eq!(entry.price, PriceValue::Text("Rp 50.000".into()));
        assert!(!entry.is_booked);
        assert!(entry.status.is_empty());
    }

    #[test]
    fn test_membership_defaults_to_one_week() {
        let m: Membership = serde_json::from_value(json!({"id": 1, "name": "Basic"})).unwrap();
        assert_eq!(m.weeks, 1);
        assert_eq!(m.discount, 0.0);
    }

    #[test]
    fn test_time_slot_serializes_camel_case() {
        let slot = TimeSlot {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: "19 - 20".into(),
            time_id: "t1".into(),
            court: "Lapangan A".into(),
            field_id: "5".into(),
            price: 50000,
        };
        let v = serde_json::to_value(&slot).unwrap();
        assert_eq!(v["date"], "2025-03-10");
        assert_eq!(v["fieldId"], "5");
        assert_eq!(v["timeId"], "t1");
    }

    #[test]
    fn test_cancel_request_skips_missing_bank_details() {
        let req = CancelRequest {
            reason: "rain".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"reason": "rain"}));
    }
}
