use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use tracing::{info, warn};

use crate::availability::ClosedFieldForm;
use crate::calendar::{self, CellKind, MonthView};
use crate::client::{AdminResource, ApiClient};
use crate::models::{or_not_available, CancelRequest, Config, PriceValue, Refund, Reservation};
use crate::payment::{self, Handoff};
use crate::pricing::{calculate_total, format_rupiah};
use crate::schedule::{self, SlotRecord};
use crate::selection::{Selection, Toggle};

pub enum AdminAction {
    List,
    Create(Value),
    Update(String, Value),
    Delete(String),
}

fn client(cfg: &Config) -> Result<ApiClient> {
    ApiClient::new(&cfg.api, Some(&cfg.session))
}

fn signed_in_client(cfg: &Config) -> Result<ApiClient> {
    let api = client(cfg)?;
    if !api.is_authenticated() {
        bail!(
            "Sign in required: set `token` under [session] in the config file or pass --token \
             (the web UI redirects to {})",
            payment::LOGIN_ROUTE
        );
    }
    Ok(api)
}

fn price_text(price: &Option<PriceValue>) -> String {
    price
        .as_ref()
        .map(|p| format_rupiah(schedule::parse_price(p)))
        .unwrap_or_else(|| "-".to_string())
}

pub async fn run_locations(cfg: &Config) -> Result<()> {
    let api = client(cfg)?;
    let locations = api.locations().await?;
    if locations.is_empty() {
        println!("No locations.");
    }
    for loc in &locations {
        match &loc.address {
            Some(addr) => println!("  [{}] {} ({})", loc.id, loc.name, addr),
            None => println!("  [{}] {}", loc.id, loc.name),
        }
    }
    Ok(())
}

pub async fn run_sports(cfg: &Config, location_id: &str) -> Result<()> {
    let api = client(cfg)?;
    let sports = api.sports_by_location(location_id).await?;
    if sports.is_empty() {
        println!("No sports offered at location {}.", location_id);
    }
    for sport in &sports {
        println!("  [{}] {}", sport.id, sport.name);
    }
    Ok(())
}

async fn load_records(
    api: &ApiClient,
    location_id: &str,
    date: Option<NaiveDate>,
    sport: Option<&str>,
) -> Result<(Vec<NaiveDate>, Vec<SlotRecord>)> {
    let resp = api.schedule(location_id, date, sport).await?;
    Ok((
        schedule::display_dates(&resp),
        schedule::normalize(&resp, location_id),
    ))
}

pub async fn run_schedule(
    cfg: &Config,
    location_id: &str,
    date: Option<NaiveDate>,
    sport: Option<&str>,
) -> Result<()> {
    let api = client(cfg)?;
    let (dates, records) = load_records(&api, location_id, date, sport).await?;

    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!("Schedule {} to {} ({} days)\n", first, last, dates.len());
    }
    if records.is_empty() {
        println!("No slots published for location {}.", location_id);
        return Ok(());
    }

    for (court, days) in schedule::group_by_court(&records) {
        println!("{}", court);
        for (day, slots) in days {
            println!("  {}", day.format("%a %Y-%m-%d"));
            for s in slots {
                let state = if s.is_available() { "open" } else { "booked" };
                println!(
                    "    {:<12} {:>12}  {:<6}  ({}:{})",
                    s.time,
                    format_rupiah(s.price),
                    state,
                    s.field_id,
                    s.time_id
                );
            }
        }
        println!();
    }
    Ok(())
}

fn print_month(view: &MonthView) {
    println!("{:^28}", view.title());
    println!(
        "{}",
        calendar::WEEKDAY_LABELS
            .iter()
            .map(|l| format!("{:>4}", &l[..2]))
            .collect::<String>()
    );
    for week in view.weeks() {
        let line: String = week
            .iter()
            .map(|c| match c.kind {
                CellKind::CurrentMonth if c.is_today => format!("{:>3}*", c.date.day()),
                CellKind::CurrentMonth if c.selectable => format!("{:>4}", c.date.day()),
                CellKind::CurrentMonth => format!("{:>3}x", c.date.day()),
                _ => format!("{:>4}", "."),
            })
            .collect();
        println!("{}", line);
    }
}

pub fn run_calendar(cfg: &Config, month: Option<&str>) -> Result<()> {
    let today = calendar::today(cfg.timezone()?);
    let months = match month {
        Some(m) => {
            let (year, mon) =
                calendar::parse_month(m).with_context(|| format!("Invalid month '{m}', use YYYY-MM"))?;
            let (ny, nm) = calendar::next_month(year, mon);
            [
                calendar::month_grid(year, mon, today),
                calendar::month_grid(ny, nm, today),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
        }
        None => calendar::two_months(today).to_vec(),
    };
    for view in &months {
        print_month(view);
        println!();
    }
    println!("* today   x past (not bookable)");
    Ok(())
}

/// `<fieldId>:<timeId>` with an optional `@YYYY-MM-DD` date.
pub fn parse_slot_arg(arg: &str, default_date: Option<NaiveDate>) -> Result<(NaiveDate, String, String)> {
    let (cell, date) = match arg.split_once('@') {
        Some((cell, d)) => (
            cell,
            Some(
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .with_context(|| format!("Invalid date in slot '{arg}'"))?,
            ),
        ),
        None => (arg, default_date),
    };
    let (field_id, time_id) = cell
        .split_once(':')
        .with_context(|| format!("Slot '{arg}' must look like <fieldId>:<timeId>[@YYYY-MM-DD]"))?;
    let date = date.with_context(|| format!("No date for slot '{arg}'"))?;
    Ok((date, field_id.trim().to_string(), time_id.trim().to_string()))
}

pub async fn run_quote(
    cfg: &Config,
    location_id: &str,
    date: Option<NaiveDate>,
    sport: Option<&str>,
    slot_args: &[String],
    membership_id: Option<&str>,
) -> Result<()> {
    let api = client(cfg)?;
    let (dates, records) = load_records(&api, location_id, date, sport).await?;
    let membership = match membership_id {
        Some(id) => Some(api.membership(id).await?),
        None => None,
    };
    if let Some(m) = &membership {
        info!(
            "Membership {}: {} weeks, {}% discount",
            m.name, m.weeks, m.discount
        );
    }

    let default_date = date.or_else(|| dates.first().copied());
    let mut selection = Selection::new();
    for arg in slot_args {
        let (day, field_id, time_id) = parse_slot_arg(arg, default_date)?;
        let record = schedule::find_record(&records, day, &field_id, &time_id)
            .with_context(|| format!("Slot {arg} is not in the schedule"))?;
        if !record.is_available() {
            warn!("Slot {} on {} is already booked, skipping", record.time, day);
            continue;
        }
        selection = selection.toggle(&Toggle::from(&record.to_time_slot()), membership.as_ref());
    }

    if selection.is_empty() {
        println!("No slots selected.");
        return Ok(());
    }

    println!("Selected slots:");
    for s in selection.slots() {
        println!(
            "  {}  {:<12} {:<16} {:>12}",
            s.date,
            s.time,
            s.court,
            format_rupiah(s.price)
        );
    }

    let totals = calculate_total(selection.slots(), membership.as_ref());
    println!("\n  Subtotal  {:>14}", format_rupiah(totals.subtotal));
    println!("  Discount  {:>14}", format_rupiah(totals.discount));
    println!("  Total     {:>14}", format_rupiah(totals.total));

    let user_id = cfg.session.resolved_user_id();
    match payment::handoff(
        selection.slots(),
        membership.as_ref(),
        location_id,
        user_id.as_deref(),
    )? {
        Handoff::Payment(url) => println!("\nPay at: {}", url),
        Handoff::Login => bail!(
            "Sign in required before paying ({}): set user_id or token under [session]",
            payment::LOGIN_ROUTE
        ),
    }
    Ok(())
}

fn print_reservation(r: &Reservation) {
    println!(
        "  #{:<6} {} {:<12} {:<16} {:<18} {:>12}  {}",
        r.id,
        r.date,
        r.time,
        r.field_name,
        r.location_name,
        price_text(&r.total_price),
        r.status
    );
}

fn print_refund(r: &Refund) {
    println!(
        "  #{:<6} reservation #{:<6} {:>12}  {}",
        r.id,
        r.reservation_id,
        price_text(&r.amount),
        r.status
    );
    if let Some(reason) = r.reason.as_deref().filter(|s| !s.is_empty()) {
        println!("      reason:  {}", reason);
    }
    println!(
        "      bank:    {} / {} / {}",
        or_not_available(r.bank_name.as_deref()),
        or_not_available(r.account_number.as_deref()),
        or_not_available(r.account_name.as_deref())
    );
}

pub async fn run_bookings(cfg: &Config) -> Result<()> {
    let api = signed_in_client(cfg)?;
    let reservations = api.user_reservations().await?;
    if reservations.is_empty() {
        println!("No reservations yet.");
        return Ok(());
    }
    println!("Reservations:\n");
    for r in &reservations {
        print_reservation(r);
    }
    Ok(())
}

pub async fn run_cancel(cfg: &Config, id: &str, req: &CancelRequest) -> Result<()> {
    if req.reason.trim().is_empty() {
        bail!("A cancellation reason is required");
    }
    let api = signed_in_client(cfg)?;
    let resp = api.cancel_reservation(id, req).await?;
    let msg = resp
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Cancellation requested");
    println!("Reservation #{}: {}", id, msg);
    Ok(())
}

pub async fn run_refunds(cfg: &Config, admin: bool) -> Result<()> {
    let api = signed_in_client(cfg)?;
    let refunds = if admin {
        api.admin_refunds().await?
    } else {
        api.user_refunds().await?
    };
    if refunds.is_empty() {
        println!("No refund requests.");
        return Ok(());
    }
    println!("Refunds:\n");
    for r in &refunds {
        print_refund(r);
    }
    Ok(())
}

pub async fn run_admin_reservations(cfg: &Config) -> Result<()> {
    let api = signed_in_client(cfg)?;
    let reservations = api.admin_reservations().await?;
    println!("{} reservations\n", reservations.len());
    for r in &reservations {
        print_reservation(r);
    }
    Ok(())
}

pub async fn run_refund_status(cfg: &Config, id: &str, status: &str) -> Result<()> {
    let api = signed_in_client(cfg)?;
    api.update_refund_status(id, status).await?;
    println!("Refund #{} marked {}", id, status);
    Ok(())
}

pub async fn run_admin(cfg: &Config, resource: AdminResource, action: AdminAction) -> Result<()> {
    let api = signed_in_client(cfg)?;
    match action {
        AdminAction::List => {
            let items = api.list(resource).await?;
            println!("{} {}:", items.len(), resource);
            for item in &items {
                println!("  {}", item);
            }
        }
        AdminAction::Create(body) => {
            if resource == AdminResource::ClosedFields {
                validate_block(cfg, &body)?;
            }
            let created = api.create(resource, &body).await?;
            println!("Created: {}", serde_json::to_string_pretty(&created)?);
        }
        AdminAction::Update(id, body) => {
            let updated = api.update(resource, &id, &body).await?;
            println!("Updated: {}", serde_json::to_string_pretty(&updated)?);
        }
        AdminAction::Delete(id) => {
            api.delete(resource, &id).await?;
            println!("Deleted {} {}", resource, id);
        }
    }
    Ok(())
}

fn validate_block(cfg: &Config, body: &Value) -> Result<()> {
    let text = |k: &str| {
        body.get(k)
            .map(|v| match v {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .unwrap_or_default()
    };
    let form = ClosedFieldForm {
        field_id: text("fieldId"),
        start_date: text("startDate"),
        end_date: text("endDate"),
        start_time: text("startTime"),
        end_time: text("endTime"),
        reason: text("reason"),
    };
    if let Err(errors) = form.validate(calendar::today(cfg.timezone()?)) {
        for e in &errors {
            println!("  {}", e);
        }
        bail!("Availability block has {} invalid field(s)", errors.len());
    }
    Ok(())
}
