use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Membership, TimeSlot};
use crate::pricing::{calculate_total, Totals};

pub const PAYMENT_ROUTE: &str = "/reservation/payment";
pub const LOGIN_ROUTE: &str = "/login";

/// Slots of one court on one date, sent as a single booking line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingGroup {
    pub date: NaiveDate,
    pub court: String,
    pub field_id: String,
    pub times: Vec<String>,
    pub time_ids: Vec<String>,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    pub bookings: Vec<BookingGroup>,
    pub location_id: String,
    pub payment_type: PaymentType,
    pub user_id: String,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Regular,
    Membership,
}

impl PaymentData {
    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            discount: self.discount,
            total: self.total,
        }
    }
}

/// Where "Pay" sends the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    Payment(String),
    Login,
}

impl Handoff {
    pub fn location(&self) -> &str {
        match self {
            Handoff::Payment(url) => url,
            Handoff::Login => LOGIN_ROUTE,
        }
    }
}

/// Group by date, then by court. Times keep their selection order.
pub fn group_bookings(slots: &[TimeSlot]) -> Vec<BookingGroup> {
    let mut by_date: BTreeMap<NaiveDate, Vec<BookingGroup>> = BTreeMap::new();
    for slot in slots {
        let groups = by_date.entry(slot.date).or_default();
        match groups.iter_mut().find(|g| g.court == slot.court) {
            Some(group) => {
                group.times.push(slot.time.clone());
                group.time_ids.push(slot.time_id.clone());
                group.price = group.price.saturating_add(slot.price);
            }
            None => groups.push(BookingGroup {
                date: slot.date,
                court: slot.court.clone(),
                field_id: slot.field_id.clone(),
                times: vec![slot.time.clone()],
                time_ids: vec![slot.time_id.clone()],
                price: slot.price,
            }),
        }
    }
    by_date.into_values().flatten().collect()
}

pub fn build_payment_data(
    slots: &[TimeSlot],
    membership: Option<&Membership>,
    location_id: &str,
    user_id: &str,
) -> PaymentData {
    let totals = calculate_total(slots, membership);
    PaymentData {
        bookings: group_bookings(slots),
        location_id: location_id.to_string(),
        payment_type: if membership.is_some() {
            PaymentType::Membership
        } else {
            PaymentType::Regular
        },
        user_id: user_id.to_string(),
        subtotal: totals.subtotal,
        discount: totals.discount,
        total: totals.total,
        membership_id: membership.map(|m| m.id.clone()),
    }
}

pub fn payment_url(data: &PaymentData) -> Result<String> {
    let json = serde_json::to_string(data).context("Failed to serialize payment data")?;
    Ok(format!("{}?data={}", PAYMENT_ROUTE, urlencoding::encode(&json)))
}

/// Decode the `data` query value. Accepts both raw and still-encoded JSON.
pub fn decode_payment_data(raw: &str) -> Result<PaymentData> {
    let decoded = if raw.trim_start().starts_with('{') {
        raw.to_string()
    } else {
        urlencoding::decode(raw)
            .context("Payment data is not valid URL encoding")?
            .into_owned()
    };
    serde_json::from_str(&decoded).context("Payment data is not valid JSON")
}

/// Build the handoff for the current selection. No user id means sign in first.
pub fn handoff(
    slots: &[TimeSlot],
    membership: Option<&Membership>,
    location_id: &str,
    user_id: Option<&str>,
) -> Result<Handoff> {
    match user_id.filter(|u| !u.is_empty()) {
        Some(uid) => {
            let data = build_payment_data(slots, membership, location_id, uid);
            Ok(Handoff::Payment(payment_url(&data)?))
        }
        None => Ok(Handoff::Login),
    }
}
