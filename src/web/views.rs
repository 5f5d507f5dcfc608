use leptos::prelude::*;

use crate::calendar::WEEKDAY_LABELS;
use crate::models::{or_not_available, Location, Refund, Reservation};
use crate::payment::PaymentData;
use crate::pricing::{format_rupiah, Totals};
use crate::schedule::parse_price;

const STYLE: &str = include_str!("../style.css");

pub(super) struct SportTab {
    pub(super) name: String,
    pub(super) href: String,
    pub(super) active: bool,
}

pub(super) struct CalendarDay {
    pub(super) label: String,
    pub(super) href: Option<String>,
    pub(super) css: String,
}

pub(super) struct CalendarMonth {
    pub(super) title: String,
    pub(super) weeks: Vec<Vec<CalendarDay>>,
}

pub(super) struct SlotCell {
    pub(super) time: String,
    pub(super) price: String,
    pub(super) href: Option<String>,
    pub(super) css: String,
}

pub(super) struct CourtDay {
    pub(super) label: String,
    pub(super) cells: Vec<SlotCell>,
}

pub(super) struct CourtBlock {
    pub(super) court: String,
    pub(super) days: Vec<CourtDay>,
}

pub(super) struct SummaryLine {
    pub(super) date: String,
    pub(super) time: String,
    pub(super) court: String,
    pub(super) price: String,
}

pub(super) struct SchedulePage {
    pub(super) location: String,
    pub(super) tabs: Vec<SportTab>,
    pub(super) months: Vec<CalendarMonth>,
    pub(super) range: Option<String>,
    pub(super) courts: Vec<CourtBlock>,
    pub(super) membership: Option<String>,
    pub(super) lines: Vec<SummaryLine>,
    pub(super) details_open: bool,
    pub(super) details_href: String,
    pub(super) totals: Totals,
    pub(super) pay_href: Option<String>,
}

fn layout(title: &str, body_html: String) -> String {
    let title = title.to_string();
    let heading = title.clone();
    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>{title}</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <nav>
                    <a href="/">"Locations"</a>
                    <a href="/history">"My bookings"</a>
                </nav>
                <h1>{heading}</h1>
                <div inner_html=body_html />
            </body>
        </html>
    }
    .to_html()
}

pub(super) fn render_error_page(message: &str, retry_href: &str) -> String {
    let message = message.to_string();
    let retry_href = retry_href.to_string();
    let body = view! {
        <div class="error">
            <p>{message}</p>
            <a class="button" href=retry_href>"Retry"</a>
        </div>
    }
    .to_html();
    layout("Something went wrong", body)
}

pub(super) fn render_locations(locations: &[Location]) -> String {
    if locations.is_empty() {
        return layout(
            "Locations",
            view! { <p class="empty">"No locations available."</p> }.to_html(),
        );
    }

    let items: String = locations
        .iter()
        .map(|l| {
            let href = format!("/reservation/schedule/{}", urlencoding::encode(&l.id));
            let name = l.name.clone();
            let address = l.address.clone().unwrap_or_default();
            view! {
                <li>
                    <a href=href>{name}</a>
                    <span class="address">{address}</span>
                </li>
            }
            .to_html()
        })
        .collect();

    layout("Locations", view! { <ul class="locations" inner_html=items /> }.to_html())
}

fn render_tabs(tabs: &[SportTab]) -> String {
    if tabs.is_empty() {
        return view! { <p class="empty">"No sports offered here."</p> }.to_html();
    }
    let items: String = tabs
        .iter()
        .map(|t| {
            let css = if t.active { "tab active" } else { "tab" }.to_string();
            let href = t.href.clone();
            let name = t.name.clone();
            view! { <a class=css href=href>{name}</a> }.to_html()
        })
        .collect();
    view! { <div class="tabs" inner_html=items /> }.to_html()
}

fn render_month(month: &CalendarMonth) -> String {
    let head: String = WEEKDAY_LABELS
        .iter()
        .map(|l| {
            let l = l.to_string();
            view! { <th>{l}</th> }.to_html()
        })
        .collect();

    let rows: String = month
        .weeks
        .iter()
        .map(|week| {
            let cells: String = week
                .iter()
                .map(|day| {
                    let css = day.css.clone();
                    let label = day.label.clone();
                    match day.href.clone() {
                        Some(href) => view! {
                            <td class=css><a href=href>{label}</a></td>
                        }
                        .to_html(),
                        None => view! { <td class=css>{label}</td> }.to_html(),
                    }
                })
                .collect();
            view! { <tr inner_html=cells /> }.to_html()
        })
        .collect();

    let title = month.title.clone();
    view! {
        <table class="calendar">
            <caption>{title}</caption>
            <thead><tr inner_html=head /></thead>
            <tbody inner_html=rows />
        </table>
    }
    .to_html()
}

fn render_courts(courts: &[CourtBlock]) -> String {
    if courts.is_empty() {
        return view! { <p class="empty">"No slots published for this day."</p> }.to_html();
    }

    courts
        .iter()
        .map(|court| {
            let days: String = court
                .days
                .iter()
                .map(|day| {
                    let cells: String = day
                        .cells
                        .iter()
                        .map(|c| {
                            let css = c.css.clone();
                            let time = c.time.clone();
                            let price = c.price.clone();
                            match c.href.clone() {
                                Some(href) => view! {
                                    <a class=css href=href>
                                        <span class="time">{time}</span>
                                        <span class="price">{price}</span>
                                    </a>
                                }
                                .to_html(),
                                None => view! {
                                    <span class=css>
                                        <span class="time">{time}</span>
                                        <span class="price">"Booked"</span>
                                    </span>
                                }
                                .to_html(),
                            }
                        })
                        .collect();
                    let label = day.label.clone();
                    view! {
                        <div class="court-day">
                            <h4>{label}</h4>
                            <div class="slots" inner_html=cells />
                        </div>
                    }
                    .to_html()
                })
                .collect();
            let name = court.court.clone();
            view! {
                <section class="court">
                    <h3>{name}</h3>
                    <div inner_html=days />
                </section>
            }
            .to_html()
        })
        .collect()
}

fn render_summary(page: &SchedulePage) -> String {
    if page.lines.is_empty() {
        return view! {
            <aside class="summary">
                <p class="empty">"Pick one or more open slots."</p>
            </aside>
        }
        .to_html();
    }

    let details = if page.details_open {
        let rows: String = page
            .lines
            .iter()
            .map(|l| {
                let date = l.date.clone();
                let time = l.time.clone();
                let court = l.court.clone();
                let price = l.price.clone();
                view! {
                    <tr>
                        <td>{date}</td>
                        <td>{time}</td>
                        <td>{court}</td>
                        <td class="amount">{price}</td>
                    </tr>
                }
                .to_html()
            })
            .collect();
        view! {
            <table>
                <thead>
                    <tr><th>"Date"</th><th>"Time"</th><th>"Court"</th><th>"Price"</th></tr>
                </thead>
                <tbody inner_html=rows />
            </table>
        }
        .to_html()
    } else {
        String::new()
    };

    let toggle_label = if page.details_open {
        "Hide details"
    } else {
        "Show details"
    };
    let details_href = page.details_href.clone();
    let count = format!("{} slot(s) selected", page.lines.len());
    let membership = page
        .membership
        .clone()
        .map(|m| format!("Membership: {m}"))
        .unwrap_or_default();
    let subtotal = format_rupiah(page.totals.subtotal);
    let discount = format_rupiah(page.totals.discount);
    let total = format_rupiah(page.totals.total);
    let pay = match page.pay_href.clone() {
        Some(href) => view! { <a class="button pay" href=href>"Pay"</a> }.to_html(),
        None => String::new(),
    };

    view! {
        <aside class="summary">
            <p>{count}</p>
            <p class="membership">{membership}</p>
            <a href=details_href>{toggle_label}</a>
            <div inner_html=details />
            <dl>
                <dt>"Subtotal"</dt><dd>{subtotal}</dd>
                <dt>"Discount"</dt><dd>{discount}</dd>
                <dt>"Total"</dt><dd class="total">{total}</dd>
            </dl>
            <div inner_html=pay />
        </aside>
    }
    .to_html()
}

pub(super) fn render_schedule_page(page: &SchedulePage) -> String {
    let tabs = render_tabs(&page.tabs);
    let months: String = page.months.iter().map(render_month).collect();
    let courts = render_courts(&page.courts);
    let summary = render_summary(page);
    let range = page.range.clone().unwrap_or_default();

    let body = view! {
        <div inner_html=tabs />
        <div class="months" inner_html=months />
        <p class="range">{range}</p>
        <div class="schedule" inner_html=courts />
        <div inner_html=summary />
    }
    .to_html();
    layout(&format!("Book a court: {}", page.location), body)
}

pub(super) fn render_payment(data: &PaymentData) -> String {
    let rows: String = data
        .bookings
        .iter()
        .map(|b| {
            let date = b.date.format("%a %d %b %Y").to_string();
            let court = b.court.clone();
            let times = b.times.join(", ");
            let price = format_rupiah(b.price);
            view! {
                <tr>
                    <td>{date}</td>
                    <td>{court}</td>
                    <td>{times}</td>
                    <td class="amount">{price}</td>
                </tr>
            }
            .to_html()
        })
        .collect();

    let totals = data.totals();
    let subtotal = format_rupiah(totals.subtotal);
    let discount = format_rupiah(totals.discount);
    let total = format_rupiah(totals.total);
    let kind = match &data.membership_id {
        Some(id) => format!("Membership booking (#{id})"),
        None => "Regular booking".to_string(),
    };

    let body = view! {
        <p>{kind}</p>
        <table>
            <thead>
                <tr><th>"Date"</th><th>"Court"</th><th>"Times"</th><th>"Price"</th></tr>
            </thead>
            <tbody inner_html=rows />
        </table>
        <dl>
            <dt>"Subtotal"</dt><dd>{subtotal}</dd>
            <dt>"Discount"</dt><dd>{discount}</dd>
            <dt>"Total"</dt><dd class="total">{total}</dd>
        </dl>
    }
    .to_html();
    layout("Payment", body)
}

fn render_reservations(reservations: &[Reservation]) -> String {
    if reservations.is_empty() {
        return view! { <p class="empty">"No reservations yet."</p> }.to_html();
    }
    let rows: String = reservations
        .iter()
        .map(|r| {
            let date = r.date.clone();
            let time = r.time.clone();
            let court = r.field_name.clone();
            let location = r.location_name.clone();
            let total = r
                .total_price
                .as_ref()
                .map(|p| format_rupiah(parse_price(p)))
                .unwrap_or_default();
            let status = r.status.clone();
            view! {
                <tr>
                    <td>{date}</td>
                    <td>{time}</td>
                    <td>{court}</td>
                    <td>{location}</td>
                    <td class="amount">{total}</td>
                    <td>{status}</td>
                </tr>
            }
            .to_html()
        })
        .collect();
    view! {
        <table>
            <thead>
                <tr>
                    <th>"Date"</th>
                    <th>"Time"</th>
                    <th>"Court"</th>
                    <th>"Location"</th>
                    <th>"Total"</th>
                    <th>"Status"</th>
                </tr>
            </thead>
            <tbody inner_html=rows />
        </table>
    }
    .to_html()
}

fn render_refunds(refunds: &[Refund]) -> String {
    if refunds.is_empty() {
        return view! { <p class="empty">"No refund requests."</p> }.to_html();
    }
    let rows: String = refunds
        .iter()
        .map(|r| {
            let reservation = format!("#{}", r.reservation_id);
            let amount = r
                .amount
                .as_ref()
                .map(|p| format_rupiah(parse_price(p)))
                .unwrap_or_default();
            let status = r.status.clone();
            let bank = or_not_available(r.bank_name.as_deref()).to_string();
            let account = or_not_available(r.account_number.as_deref()).to_string();
            let holder = or_not_available(r.account_name.as_deref()).to_string();
            view! {
                <tr>
                    <td>{reservation}</td>
                    <td class="amount">{amount}</td>
                    <td>{status}</td>
                    <td>{bank}</td>
                    <td>{account}</td>
                    <td>{holder}</td>
                </tr>
            }
            .to_html()
        })
        .collect();
    view! {
        <table>
            <thead>
                <tr>
                    <th>"Reservation"</th>
                    <th>"Amount"</th>
                    <th>"Status"</th>
                    <th>"Bank"</th>
                    <th>"Account"</th>
                    <th>"Holder"</th>
                </tr>
            </thead>
            <tbody inner_html=rows />
        </table>
    }
    .to_html()
}

pub(super) fn render_history(reservations: &[Reservation], refunds: &[Refund]) -> String {
    let reservations = render_reservations(reservations);
    let refunds = render_refunds(refunds);
    let body = view! {
        <section>
            <h2>"Reservations"</h2>
            <div inner_html=reservations />
        </section>
        <section>
            <h2>"Refunds"</h2>
            <div inner_html=refunds />
        </section>
    }
    .to_html();
    layout("My bookings", body)
}

pub(super) fn render_login() -> String {
    let body = view! {
        <div class="notice">
            <p>"You need to sign in before paying or viewing your bookings."</p>
            <p>"Sign in on the main site, then come back to this page."</p>
            <a class="button" href="/">"Back to locations"</a>
        </div>
    }
    .to_html();
    layout("Sign in required", body)
}
