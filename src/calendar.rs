use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;

pub const GRID_CELLS: usize = 42;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    PreviousMonth,
    CurrentMonth,
    NextMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub date: NaiveDate,
    pub kind: CellKind,
    pub selectable: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub cells: [Cell; GRID_CELLS],
}

impl MonthView {
    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(7)
    }
}

/// Current time in the facility timezone.
pub fn now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

pub fn today(tz: Tz) -> NaiveDate {
    now(tz).date_naive()
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    first_of_month(year, month)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .map(|next| next.pred_opt().map_or(31, |last| last.day()))
        .unwrap_or(31)
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Six Sunday-first weeks covering `month`. Only the month's own days can be
/// picked, and none of those strictly before `today`.
pub fn month_grid(year: i32, month: u32, today: NaiveDate) -> Option<MonthView> {
    first_of_month(year, month).map(|first| grid_from(first, today))
}

fn grid_from(first: NaiveDate, today: NaiveDate) -> MonthView {
    let (year, month) = (first.year(), first.month());
    let leading = first.weekday().num_days_from_sunday() as i64;
    let grid_start = first - Duration::days(leading);

    let cells = std::array::from_fn(|i| {
        let date = grid_start + Duration::days(i as i64);
        let kind = if date < first {
            CellKind::PreviousMonth
        } else if date.month() == month && date.year() == year {
            CellKind::CurrentMonth
        } else {
            CellKind::NextMonth
        };
        Cell {
            date,
            kind,
            selectable: kind == CellKind::CurrentMonth && date >= today,
            is_today: date == today,
        }
    });

    MonthView { year, month, cells }
}

/// The month containing `today` and the one after it.
pub fn two_months(today: NaiveDate) -> [MonthView; 2] {
    let first = today - Duration::days(today.day0() as i64);
    let next = first + Duration::days(days_in_month(first.year(), first.month()) as i64);
    [grid_from(first, today), grid_from(next, today)]
}

/// Parse `YYYY-MM` as used by the `--month` flag.
pub fn parse_month(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.trim().split_once('-')?;
    let year = y.parse().ok()?;
    let month = m.parse().ok()?;
    first_of_month(year, month).map(|_| (year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_grid_always_42_cells_with_month_days() {
        let today = d(2000, 1, 1);
        for year in [2023, 2024, 2025, 2026] {
            for month in 1..=12 {
                let view = month_grid(year, month, today).unwrap();
                assert_eq!(view.cells.len(), GRID_CELLS);
                let current = view
                    .cells
                    .iter()
                    .filter(|c| c.kind == CellKind::CurrentMonth)
                    .count();
                assert_eq!(current as u32, days_in_month(year, month));
                assert_eq!(view.cells[0].date.weekday(), chrono::Weekday::Sun);
                assert_eq!(view.weeks().count(), 6);
            }
        }
    }

    #[test]
    fn test_grid_layout_march_2025() {
        // 1 March 2025 is a Saturday
        let view = month_grid(2025, 3, d(2025, 3, 1)).unwrap();
        let leading = view
            .cells
            .iter()
            .take_while(|c| c.kind == CellKind::PreviousMonth)
            .count();
        assert_eq!(leading, 6);
        assert_eq!(view.cells[0].date, d(2025, 2, 23));
        assert_eq!(view.cells[6].date, d(2025, 3, 1));
        assert_eq!(view.cells[41].date, d(2025, 4, 5));
        assert_eq!(view.cells[41].kind, CellKind::NextMonth);
        assert_eq!(view.title(), "March 2025");
    }

    #[test]
    fn test_past_days_never_selectable() {
        let today = d(2025, 3, 15);
        let view = month_grid(2025, 3, today).unwrap();
        for cell in &view.cells {
            if cell.date < today {
                assert!(!cell.selectable, "{} should be disabled", cell.date);
            }
        }
        let today_cell = view.cells.iter().find(|c| c.is_today).unwrap();
        assert!(today_cell.selectable);
        let selectable = view.cells.iter().filter(|c| c.selectable).count();
        assert_eq!(selectable, 17);
    }

    #[test]
    fn test_adjacent_month_cells_inactive() {
        let view = month_grid(2025, 3, d(2020, 1, 1)).unwrap();
        assert!(view
            .cells
            .iter()
            .filter(|c| c.kind != CellKind::CurrentMonth)
            .all(|c| !c.selectable));
    }

    #[test]
    fn test_two_months_crosses_year() {
        let [current, next] = two_months(d(2025, 12, 20));
        assert_eq!((current.year, current.month), (2025, 12));
        assert_eq!((next.year, next.month), (2026, 1));
        assert!(next
            .cells
            .iter()
            .filter(|c| c.kind == CellKind::CurrentMonth)
            .all(|c| c.selectable));
    }

    #[test]
    fn test_invalid_month() {
        assert!(month_grid(2025, 13, d(2025, 1, 1)).is_none());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-03"), Some((2025, 3)));
        assert_eq!(parse_month("2025-13"), None);
        assert_eq!(parse_month("March"), None);
    }
}
