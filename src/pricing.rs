use serde::Serialize;

use crate::models::{Membership, TimeSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Totals {
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
}

/// Subtotal of the selected slots, membership discount and what is left to pay.
///
/// Amounts are whole currency units. The discount is rounded half up and
/// the percentage is clamped to 0..=100 so the total never goes negative.
pub fn calculate_total(slots: &[TimeSlot], membership: Option<&Membership>) -> Totals {
    let subtotal = slots
        .iter()
        .fold(0i64, |acc, s| acc.saturating_add(s.price));
    let discount = match membership {
        Some(m) => {
            let pct = m.discount.clamp(0.0, 100.0);
            (subtotal as f64 * pct / 100.0).round() as i64
        }
        None => 0,
    };
    Totals {
        subtotal,
        discount,
        total: subtotal.saturating_sub(discount),
    }
}

/// `50000` becomes `"Rp 50.000"`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}
