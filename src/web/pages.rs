use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{error, warn};

use super::session::UserSession;
use super::views::{
    self, CalendarDay, CalendarMonth, CourtBlock, CourtDay, SchedulePage, SlotCell, SportTab,
    SummaryLine,
};
use super::AppState;
use crate::calendar::{self, CellKind};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Membership, Session};
use crate::payment::{self, LOGIN_ROUTE};
use crate::pricing::{calculate_total, format_rupiah};
use crate::schedule::{self, SlotRecord};
use crate::selection::{Selection, Toggle};

#[derive(Debug, Deserialize, Default, Clone)]
pub(crate) struct ScheduleQuery {
    sport: Option<String>,
    date: Option<String>,
    membership: Option<String>,
    sel: Option<String>,
    toggle: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PayQuery {
    sport: Option<String>,
    date: Option<String>,
    sel: Option<String>,
    membership: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentQuery {
    data: Option<String>,
}

fn api(state: &AppState, session: &Session) -> anyhow::Result<ApiClient> {
    ApiClient::new(&state.config.api, Some(session))
}

fn error_response(err: &anyhow::Error, retry_href: &str) -> Response {
    error!("Request failed: {:#}", err);
    let status = match err.downcast_ref::<ApiError>() {
        Some(ApiError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::BAD_GATEWAY,
    };
    let html = views::render_error_page(&format!("{err:#}"), retry_href);
    (status, Html(html)).into_response()
}

fn with_param(href: &str, key: &str, value: &str) -> String {
    let sep = if href.contains('?') { '&' } else { '?' };
    format!("{href}{sep}{key}={}", urlencoding::encode(value))
}

impl ScheduleQuery {
    /// Canonical page URL; the one-shot `toggle` action is never carried over.
    fn href(&self, location: &str) -> String {
        let mut href = format!("/reservation/schedule/{}", urlencoding::encode(location));
        let params = [
            ("sport", &self.sport),
            ("date", &self.date),
            ("membership", &self.membership),
            ("sel", &self.sel),
            ("details", &self.details),
        ];
        for (key, value) in params {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                href = with_param(&href, key, v);
            }
        }
        href
    }

    fn details_open(&self) -> bool {
        self.details.as_deref() == Some("1")
    }
}

fn encode_selection(selection: &Selection) -> Option<String> {
    if selection.is_empty() {
        return None;
    }
    serde_json::to_string(selection).ok()
}

fn decode_selection(raw: Option<&str>) -> Selection {
    match raw.filter(|s| !s.is_empty()) {
        Some(s) => serde_json::from_str(s).unwrap_or_else(|e| {
            warn!("Ignoring malformed selection: {}", e);
            Selection::new()
        }),
        None => Selection::new(),
    }
}

/// Prices come from the schedule, never from the query string. A slot outside
/// the loaded days takes the price of the same field and hour; a slot with no
/// such field and hour is dropped.
fn trusted_prices(selection: Selection, records: &[SlotRecord]) -> Selection {
    let before = selection.len();
    let selection = selection.reprice(|s| {
        schedule::find_record(records, s.date, &s.field_id, &s.time_id)
            .or_else(|| {
                records
                    .iter()
                    .find(|r| r.field_id == s.field_id && r.time_id == s.time_id)
            })
            .map(|r| r.price)
    });
    if selection.len() < before {
        warn!(
            "Dropped {} selected slot(s) missing from the schedule",
            before - selection.len()
        );
    }
    selection
}

/// `toggle` value of a schedule cell.
fn toggle_key(record: &SlotRecord) -> String {
    format!("{}|{}|{}", record.date, record.field_id, record.time_id)
}

fn parse_toggle_key(key: &str) -> Option<(NaiveDate, &str, &str)> {
    let mut parts = key.splitn(3, '|');
    let date = schedule::parse_api_date(parts.next()?)?;
    Some((date, parts.next()?, parts.next()?))
}

fn apply_toggle(
    selection: Selection,
    key: &str,
    records: &[SlotRecord],
    membership: Option<&Membership>,
) -> Selection {
    let Some((date, field_id, time_id)) = parse_toggle_key(key) else {
        warn!("Ignoring malformed toggle '{}'", key);
        return selection;
    };
    match schedule::find_record(records, date, field_id, time_id) {
        Some(record) if record.is_available() => {
            selection.toggle(&Toggle::from(&record.to_time_slot()), membership)
        }
        Some(record) => {
            warn!("Slot {} on {} is not available", record.time, date);
            selection
        }
        None => {
            warn!("Toggle '{}' does not match any schedule slot", key);
            selection
        }
    }
}

async fn fetch_membership(api: &ApiClient, id: Option<&str>) -> anyhow::Result<Option<Membership>> {
    match id.filter(|m| !m.is_empty()) {
        Some(id) => Ok(Some(api.membership(id).await?)),
        None => Ok(None),
    }
}

pub(crate) async fn locations_handler(
    State(state): State<AppState>,
    UserSession(session): UserSession,
    uri: Uri,
) -> Response {
    let result = async { api(&state, &session)?.locations().await }.await;
    match result {
        Ok(locations) => Html(views::render_locations(&locations)).into_response(),
        Err(e) => error_response(&e, &uri.to_string()),
    }
}

fn calendar_months(
    location: &str,
    q: &ScheduleQuery,
    today: NaiveDate,
    picked: Option<NaiveDate>,
) -> Vec<CalendarMonth> {
    calendar::two_months(today)
        .iter()
        .map(|view| CalendarMonth {
            title: view.title(),
            weeks: view
                .weeks()
                .map(|week| {
                    week.iter()
                        .map(|cell| {
                            let mut css = match cell.kind {
                                CellKind::CurrentMonth if cell.selectable => "day".to_string(),
                                CellKind::CurrentMonth => "day past".to_string(),
                                _ => "day outside".to_string(),
                            };
                            if cell.is_today {
                                css.push_str(" today");
                            }
                            if picked == Some(cell.date) {
                                css.push_str(" picked");
                            }
                            let href = cell.selectable.then(|| {
                                let target = ScheduleQuery {
                                    date: Some(cell.date.format("%Y-%m-%d").to_string()),
                                    toggle: None,
                                    ..q.clone()
                                };
                                target.href(location)
                            });
                            CalendarDay {
                                label: cell.date.day().to_string(),
                                href,
                                css,
                            }
                        })
                        .collect()
                })
                .collect(),
        })
        .collect()
}

fn court_blocks(
    location: &str,
    q: &ScheduleQuery,
    records: &[SlotRecord],
    selection: &Selection,
) -> Vec<CourtBlock> {
    let base = q.href(location);
    schedule::group_by_court(records)
        .into_iter()
        .map(|(court, days)| CourtBlock {
            court,
            days: days
                .into_iter()
                .map(|(date, slots)| CourtDay {
                    label: date.format("%a %d %b").to_string(),
                    cells: slots
                        .into_iter()
                        .map(|r| {
                            let selected = selection.contains(r.date, &r.field_id, &r.time_id);
                            let (href, css) = if !r.is_available() {
                                (None, "slot booked")
                            } else if selected {
                                (Some(with_param(&base, "toggle", &toggle_key(r))), "slot selected")
                            } else {
                                (Some(with_param(&base, "toggle", &toggle_key(r))), "slot open")
                            };
                            SlotCell {
                                time: r.time.clone(),
                                price: format_rupiah(r.price),
                                href,
                                css: css.to_string(),
                            }
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

pub(crate) async fn schedule_handler(
    State(state): State<AppState>,
    UserSession(session): UserSession,
    Path(location): Path<String>,
    Query(mut q): Query<ScheduleQuery>,
    uri: Uri,
) -> Response {
    let retry = uri.to_string();
    let api = match api(&state, &session) {
        Ok(a) => a,
        Err(e) => return error_response(&e, &retry),
    };

    let sports = match api.sports_by_location(&location).await {
        Ok(s) => s,
        Err(e) => return error_response(&e, &retry),
    };
    if q.sport.as_deref().map_or(true, str::is_empty) {
        q.sport = sports.first().map(|s| s.name.clone());
    }

    let date = q.date.as_deref().and_then(schedule::parse_api_date);
    let resp = match api.schedule(&location, date, q.sport.as_deref()).await {
        Ok(r) => r,
        Err(e) => return error_response(&e, &retry),
    };
    let membership = match fetch_membership(&api, q.membership.as_deref()).await {
        Ok(m) => m,
        Err(e) => return error_response(&e, &retry),
    };

    let records = schedule::normalize(&resp, &location);
    let mut selection = trusted_prices(decode_selection(q.sel.as_deref()), &records);

    if let Some(key) = q.toggle.take() {
        selection = apply_toggle(selection, &key, &records, membership.as_ref());
        q.sel = encode_selection(&selection);
        return Redirect::to(&q.href(&location)).into_response();
    }

    let tabs = sports
        .iter()
        .map(|s| SportTab {
            name: s.name.clone(),
            href: ScheduleQuery {
                sport: Some(s.name.clone()),
                sel: None,
                toggle: None,
                ..q.clone()
            }
            .href(&location),
            active: q.sport.as_deref() == Some(s.name.as_str()),
        })
        .collect();

    let dates = schedule::display_dates(&resp);
    let range = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => Some(format!(
            "Showing {} to {}",
            first.format("%d %b %Y"),
            last.format("%d %b %Y")
        )),
        _ => None,
    };

    let totals = calculate_total(selection.slots(), membership.as_ref());
    let details_href = ScheduleQuery {
        details: if q.details_open() {
            None
        } else {
            Some("1".to_string())
        },
        ..q.clone()
    }
    .href(&location);

    let pay_href = encode_selection(&selection).map(|sel| {
        let mut href = with_param(
            &format!("/reservation/pay/{}", urlencoding::encode(&location)),
            "sel",
            &sel,
        );
        let params = [
            ("sport", &q.sport),
            ("date", &q.date),
            ("membership", &q.membership),
        ];
        for (key, value) in params {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                href = with_param(&href, key, v);
            }
        }
        href
    });

    let page = SchedulePage {
        location: location.clone(),
        tabs,
        months: calendar_months(&location, &q, calendar::today(state.tz), date),
        range,
        courts: court_blocks(&location, &q, &records, &selection),
        membership: membership
            .as_ref()
            .map(|m| format!("{} ({} weeks, {}% off)", m.name, m.weeks, m.discount)),
        lines: selection
            .slots()
            .iter()
            .map(|s| SummaryLine {
                date: s.date.format("%a %d %b %Y").to_string(),
                time: s.time.clone(),
                court: s.court.clone(),
                price: format_rupiah(s.price),
            })
            .collect(),
        details_open: q.details_open(),
        details_href,
        totals,
        pay_href,
    };

    Html(views::render_schedule_page(&page)).into_response()
}

pub(crate) async fn pay_handler(
    State(state): State<AppState>,
    UserSession(session): UserSession,
    Path(location): Path<String>,
    Query(q): Query<PayQuery>,
    uri: Uri,
) -> Response {
    let selection = decode_selection(q.sel.as_deref());
    if selection.is_empty() {
        let back = format!("/reservation/schedule/{}", urlencoding::encode(&location));
        return Redirect::to(&back).into_response();
    }

    let user_id = session.resolved_user_id();
    if user_id.is_none() {
        return Redirect::to(LOGIN_ROUTE).into_response();
    }

    let retry = uri.to_string();
    let api = match api(&state, &session) {
        Ok(a) => a,
        Err(e) => return error_response(&e, &retry),
    };
    let date = q.date.as_deref().and_then(schedule::parse_api_date);
    let resp = match api.schedule(&location, date, q.sport.as_deref()).await {
        Ok(r) => r,
        Err(e) => return error_response(&e, &retry),
    };
    let membership = match fetch_membership(&api, q.membership.as_deref()).await {
        Ok(m) => m,
        Err(e) => return error_response(&e, &retry),
    };

    let selection = trusted_prices(selection, &schedule::normalize(&resp, &location));
    if selection.is_empty() {
        let back = format!("/reservation/schedule/{}", urlencoding::encode(&location));
        return Redirect::to(&back).into_response();
    }

    match payment::handoff(
        selection.slots(),
        membership.as_ref(),
        &location,
        user_id.as_deref(),
    ) {
        Ok(handoff) => Redirect::to(handoff.location()).into_response(),
        Err(e) => error_response(&e, &retry),
    }
}

pub(crate) async fn payment_handler(Query(q): Query<PaymentQuery>) -> Response {
    let decoded = q
        .data
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("No payment data supplied"))
        .and_then(payment::decode_payment_data);
    match decoded {
        Ok(data) => Html(views::render_payment(&data)).into_response(),
        Err(e) => {
            warn!("Bad payment data: {:#}", e);
            let html = views::render_error_page(&format!("{e:#}"), "/");
            (StatusCode::BAD_REQUEST, Html(html)).into_response()
        }
    }
}

pub(crate) async fn history_handler(
    State(state): State<AppState>,
    UserSession(session): UserSession,
    uri: Uri,
) -> Response {
    let api = match api(&state, &session) {
        Ok(a) => a,
        Err(e) => return error_response(&e, &uri.to_string()),
    };
    if !api.is_authenticated() {
        return Redirect::to(LOGIN_ROUTE).into_response();
    }

    let result = async {
        let reservations = api.user_reservations().await?;
        let refunds = api.user_refunds().await?;
        anyhow::Ok((reservations, refunds))
    }
    .await;

    match result {
        Ok((reservations, refunds)) => {
            Html(views::render_history(&reservations, &refunds)).into_response()
        }
        Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) => {
            Redirect::to(LOGIN_ROUTE).into_response()
        }
        Err(e) => error_response(&e, &uri.to_string()),
    }
}

pub(crate) async fn login_handler() -> Html<String> {
    Html(views::render_login())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::client::fake_api;
    use crate::models::{ApiConfig, Config, ServerConfig, TimeSlot};
    use crate::web::router;

    async fn app(session: Session) -> axum::Router {
        let base_url = fake_api::spawn().await;
        let config = Config {
            api: ApiConfig {
                base_url,
                timezone: "Asia/Jakarta".into(),
            },
            session,
            server: ServerConfig::default(),
        };
        router(AppState {
            config: Arc::new(config),
            tz: chrono_tz::Asia::Jakarta,
        })
    }

    async fn get(app: &axum::Router, uri: &str) -> (StatusCode, String, Option<String>) {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned(), location)
    }

    fn selected(date: &str, time: &str, time_id: &str) -> TimeSlot {
        TimeSlot {
            date: schedule::parse_api_date(date).unwrap(),
            time: time.into(),
            time_id: time_id.into(),
            court: "Lapangan A".into(),
            field_id: "5".into(),
            price: 50000,
        }
    }

    fn sel_param(slots: Vec<TimeSlot>) -> String {
        let mut selection = Selection::new();
        for s in &slots {
            selection = selection.toggle(&Toggle::from(s), None);
        }
        urlencoding::encode(&encode_selection(&selection).unwrap()).into_owned()
    }

    #[test]
    fn test_href_drops_toggle_and_empty_params() {
        let q = ScheduleQuery {
            sport: Some("Futsal".into()),
            date: Some(String::new()),
            toggle: Some("2025-03-10|5|t19".into()),
            ..Default::default()
        };
        assert_eq!(q.href("1"), "/reservation/schedule/1?sport=Futsal");
    }

    #[test]
    fn test_parse_toggle_key() {
        let (date, field, time) = parse_toggle_key("2025-03-10|5|t|19").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(field, "5");
        assert_eq!(time, "t|19");
        assert!(parse_toggle_key("yesterday|5|t19").is_none());
        assert!(parse_toggle_key("2025-03-10|5").is_none());
    }

    #[test]
    fn test_apply_toggle_ignores_booked_and_unknown() {
        let records = schedule::normalize(&schedule::sample_response(), "1");
        let sel = apply_toggle(Selection::new(), "2025-03-10|5|t21", &records, None);
        assert!(sel.is_empty());
        let sel = apply_toggle(sel, "2025-03-10|9|t19", &records, None);
        assert!(sel.is_empty());
        let sel = apply_toggle(sel, "2025-03-10|5|t19", &records, None);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn test_malformed_selection_is_empty() {
        assert!(decode_selection(Some("[{oops")).is_empty());
        assert!(decode_selection(None).is_empty());
    }

    #[tokio::test]
    async fn test_locations_page() {
        let app = app(Session::default()).await;
        let (status, body, _) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("GOR Senayan"));
        assert!(body.contains("/reservation/schedule/1"));
    }

    #[tokio::test]
    async fn test_schedule_page_renders_slots() {
        let app = app(Session::default()).await;
        let (status, body, _) = get(&app, "/reservation/schedule/1?date=2025-03-10").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Futsal"));
        assert!(body.contains("Lapangan A"));
        assert!(body.contains("slot open"));
        assert!(body.contains("slot booked"));
        assert!(body.contains("Pick one or more open slots."));
    }

    #[tokio::test]
    async fn test_toggle_redirects_with_selection() {
        let app = app(Session::default()).await;
        let (status, _, location) = get(
            &app,
            "/reservation/schedule/1?date=2025-03-10&toggle=2025-03-10%7C5%7Ct19",
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let location = location.unwrap();
        assert!(location.contains("sel="));
        assert!(!location.contains("toggle="));

        let (status, body, _) = get(&app, &location).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("slot selected"));
        assert!(body.contains("1 slot(s) selected"));
        assert!(body.contains("Rp 50.000"));
        assert!(body.contains("/reservation/pay/1?sel="));
    }

    #[tokio::test]
    async fn test_summary_totals_and_details() {
        let app = app(Session::default()).await;
        let sel = sel_param(vec![
            selected("2025-03-10", "19 - 20", "t19"),
            selected("2025-03-10", "20 - 21", "t20"),
        ]);
        let (status, body, _) = get(
            &app,
            &format!("/reservation/schedule/1?date=2025-03-10&sel={sel}&details=1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("2 slot(s) selected"));
        assert!(body.contains("Rp 100.000"));
        assert!(body.contains("Hide details"));
        assert!(body.contains("Mon 10 Mar 2025"));
    }

    #[tokio::test]
    async fn test_membership_toggle_selects_weekly_pattern() {
        let app = app(Session::default()).await;
        let (status, _, location) = get(
            &app,
            "/reservation/schedule/1?date=2025-03-10&membership=m1&toggle=2025-03-10%7C5%7Ct19",
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let location = location.unwrap();
        assert!(location.contains("membership=m1"));

        let (status, body, _) = get(&app, &format!("{location}&details=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("4 slot(s) selected"));
        for day in ["Mon 10 Mar 2025", "Mon 17 Mar 2025", "Mon 24 Mar 2025", "Mon 31 Mar 2025"] {
            assert!(body.contains(day), "missing {day}");
        }
        assert!(body.contains("Rp 200.000"));
        assert!(body.contains("Rp 40.000"));
        assert!(body.contains("Rp 160.000"));
    }

    #[tokio::test]
    async fn test_selection_prices_come_from_schedule() {
        let app = app(Session::default()).await;
        let mut a = selected("2025-03-10", "19 - 20", "t19");
        let mut b = selected("2025-03-10", "20 - 21", "t20");
        a.price = i64::MAX;
        b.price = i64::MAX;
        let sel = sel_param(vec![a, b]);
        let (status, body, _) = get(
            &app,
            &format!("/reservation/schedule/1?date=2025-03-10&sel={sel}"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("2 slot(s) selected"));
        assert!(body.contains("Rp 100.000"));
    }

    #[tokio::test]
    async fn test_unknown_selected_slot_is_dropped() {
        let app = app(Session::default()).await;
        let mut ghost = selected("2025-03-10", "19 - 20", "t99");
        ghost.field_id = "77".into();
        let sel = sel_param(vec![ghost, selected("2025-03-10", "20 - 21", "t20")]);
        let (status, body, _) = get(
            &app,
            &format!("/reservation/schedule/1?date=2025-03-10&sel={sel}"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1 slot(s) selected"));
    }

    #[tokio::test]
    async fn test_pay_reprices_before_handoff() {
        let session = Session {
            token: None,
            user_id: Some("42".into()),
        };
        let app = app(session).await;
        let mut slot = selected("2025-03-10", "19 - 20", "t19");
        slot.price = i64::MAX;
        let sel = sel_param(vec![slot]);
        let (status, _, location) =
            get(&app, &format!("/reservation/pay/1?sel={sel}&date=2025-03-10")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let location = location.unwrap();
        assert!(location.starts_with("/reservation/payment?data="));

        let (_, body, _) = get(&app, &location).await;
        assert!(body.contains("Rp 50.000"));
        assert!(!body.contains("9.223.372"));
    }

    #[tokio::test]
    async fn test_pay_without_user_redirects_to_login() {
        let app = app(Session::default()).await;
        let sel = sel_param(vec![selected("2025-03-10", "19 - 20", "t19")]);
        let (status, _, location) = get(&app, &format!("/reservation/pay/1?sel={sel}")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn test_pay_hands_off_to_payment_page() {
        let session = Session {
            token: Some("good-token".into()),
            user_id: Some("42".into()),
        };
        let app = app(session).await;
        let sel = sel_param(vec![selected("2025-03-10", "19 - 20", "t19")]);
        let (status, _, location) =
            get(&app, &format!("/reservation/pay/1?sel={sel}&membership=m1")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let location = location.unwrap();
        assert!(location.starts_with("/reservation/payment?data="));

        let (status, body, _) = get(&app, &location).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Membership booking (#m1)"));
        assert!(body.contains("Rp 10.000"));
        assert!(body.contains("Rp 40.000"));
    }

    #[tokio::test]
    async fn test_empty_selection_pay_goes_back() {
        let app = app(Session::default()).await;
        let (status, _, location) = get(&app, "/reservation/pay/1").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/reservation/schedule/1"));
    }

    #[tokio::test]
    async fn test_bad_payment_data() {
        let app = app(Session::default()).await;
        let (status, body, _) = get(&app, "/reservation/payment?data=garbage").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Retry"));
    }

    #[tokio::test]
    async fn test_unknown_location_shows_error_with_retry() {
        let app = app(Session::default()).await;
        let (status, body, _) = get(&app, "/reservation/schedule/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Location not found"));
        assert!(body.contains("/reservation/schedule/404"));
    }

    #[tokio::test]
    async fn test_history_requires_session() {
        let app = app(Session::default()).await;
        let (status, _, location) = get(&app, "/history").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn test_history_with_cookie_session() {
        let app = app(Session::default()).await;
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/history")
                    .header(header::COOKIE, "token=good-token; userId=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("GOR Senayan"));
        assert!(body.contains("BCA"));
        assert!(body.contains("not available"));
        assert!(body.contains("Rp 75.000"));
    }

    #[tokio::test]
    async fn test_expired_token_redirects_to_login() {
        let session = Session {
            token: Some("stale".into()),
            user_id: None,
        };
        let app = app(session).await;
        let (status, _, location) = get(&app, "/history").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn test_login_page() {
        let app = app(Session::default()).await;
        let (status, body, _) = get(&app, "/login").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Sign in required"));
    }
}
