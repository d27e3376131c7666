//! Trip exports: a printable PDF report, an iCalendar file of the activities
//! and a JSON dump of the trip.

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use printpdf::{Mm, PdfDocument, Pt};
use serde::Serialize;

use crate::models::{
    activity::{Activity, ActivityType},
    expense::{Expense, ExpenseCategory},
    trip::Trip,
};

/// Attachment name derived from the trip title, e.g. `Summer_in_Rome_report.pdf`.
pub fn export_filename(trip: &Trip, suffix: &str) -> String {
    let stem: String = trip
        .title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "trip".to_string() } else { stem };
    format!("{}_{}", stem, suffix)
}

fn activities_by_schedule(trip: &Trip) -> Vec<&Activity> {
    let mut activities: Vec<&Activity> = trip.activities.iter().collect();
    activities.sort_by(|a, b| (a.day, &a.time, a.order).cmp(&(b.day, &b.time, b.order)));
    activities
}

// ---------------------------------------------------------------------------
// JSON

#[derive(Serialize)]
struct TripExport<'a> {
    trip: TripDetails<'a>,
    activities: Vec<ActivityExport<'a>>,
    expenses: Vec<ExpenseExport<'a>>,
}

#[derive(Serialize)]
struct TripDetails<'a> {
    id: &'a str,
    title: &'a str,
    destination: &'a str,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    budget: f64,
    notes: &'a str,
}

#[derive(Serialize)]
struct ActivityExport<'a> {
    id: &'a str,
    title: &'a str,
    time: &'a str,
    location: &'a str,
    activity_type: ActivityType,
    notes: Option<&'a str>,
    cost: Option<f64>,
    day: u32,
}

#[derive(Serialize)]
struct ExpenseExport<'a> {
    id: &'a str,
    title: &'a str,
    amount: f64,
    category: ExpenseCategory,
    date: DateTime<Utc>,
    notes: Option<&'a str>,
}

pub fn trip_json(trip: &Trip) -> serde_json::Result<String> {
    let export = TripExport {
        trip: TripDetails {
            id: &trip.id,
            title: &trip.title,
            destination: &trip.destination,
            start_date: trip.start_date,
            end_date: trip.end_date,
            budget: trip.budget,
            notes: &trip.notes,
        },
        activities: trip
            .activities
            .iter()
            .map(|a| ActivityExport {
                id: &a.id,
                title: &a.title,
                time: &a.time,
                location: &a.location,
                activity_type: a.activity_type,
                notes: a.notes.as_deref(),
                cost: a.cost,
                day: a.day,
            })
            .collect(),
        expenses: trip
            .expenses
            .iter()
            .map(|e| ExpenseExport {
                id: &e.id,
                title: &e.title,
                amount: e.amount,
                category: e.category,
                date: e.date,
                notes: e.notes.as_deref(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&export)
}

// ---------------------------------------------------------------------------
// iCalendar

fn ics_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// One VEVENT per activity, starting on `start_date + day - 1` at the
/// activity's time and lasting one hour. Times are floating (no zone).
pub fn trip_calendar(trip: &Trip) -> String {
    const FORMAT: &str = "%Y%m%dT%H%M%S";

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//TravelMate//Trip Calendar//EN".to_string(),
        format!("X-WR-CALNAME:{}", ics_escape(&trip.title)),
        format!(
            "X-WR-CALDESC:Trip activities for {}",
            ics_escape(&trip.destination)
        ),
    ];

    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    for activity in activities_by_schedule(trip) {
        let Some(date) = trip
            .start_date
            .date_naive()
            .checked_add_days(Days::new(u64::from(activity.day.saturating_sub(1))))
        else {
            log::warn!(
                "Skipping activity {} with out-of-range day {}",
                activity.id,
                activity.day
            );
            continue;
        };
        let start = date.and_time(activity.start_time().unwrap_or(NaiveTime::MIN));
        let Some(end) = start.checked_add_signed(Duration::hours(1)) else {
            continue;
        };

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@travelmate", activity.id));
        lines.push(format!("DTSTAMP:{}", stamp));
        lines.push(format!("DTSTART:{}", start.format(FORMAT)));
        lines.push(format!("DTEND:{}", end.format(FORMAT)));
        lines.push(format!("SUMMARY:{}", ics_escape(&activity.title)));
        lines.push(format!("LOCATION:{}", ics_escape(&activity.location)));
        lines.push(format!(
            "DESCRIPTION:{}",
            ics_escape(activity.notes.as_deref().unwrap_or(""))
        ));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

// ---------------------------------------------------------------------------
// PDF

const PAGE_WIDTH: Mm = Mm(215.9);
const PAGE_HEIGHT: Mm = Mm(279.4);
const MARGIN: Mm = Mm(25.4);

// DejaVu Sans covers Latin, Greek and Cyrillic, unlike the WinAnsi base fonts.
static REGULAR_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static BOLD_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

struct ReportLine {
    text: String,
    size: f32,
    bold: bool,
}

impl ReportLine {
    fn new(text: impl Into<String>, size: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            size,
            bold,
        }
    }

    fn blank() -> Self {
        Self::new("", 8.0, false)
    }
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn category_label(category: ExpenseCategory) -> &'static str {
    match category {
        ExpenseCategory::Accommodation => "Accommodation",
        ExpenseCategory::Food => "Food",
        ExpenseCategory::Transport => "Transport",
        ExpenseCategory::Entertainment => "Entertainment",
    }
}

fn report_lines(trip: &Trip) -> Vec<ReportLine> {
    let mut lines = vec![
        ReportLine::new(format!("Trip Report: {}", trip.title), 22.0, true),
        ReportLine::blank(),
        ReportLine::new(format!("Destination: {}", trip.destination), 11.0, false),
        ReportLine::new(
            format!(
                "Dates: {} - {}",
                trip.start_date.format("%B %d, %Y"),
                trip.end_date.format("%B %d, %Y")
            ),
            11.0,
            false,
        ),
        ReportLine::new(format!("Budget: {}", money(trip.budget)), 11.0, false),
    ];

    if !trip.activities.is_empty() {
        lines.push(ReportLine::blank());
        lines.push(ReportLine::new("Activities", 16.0, true));
        for activity in activities_by_schedule(trip) {
            let cost = activity.cost.map(money).unwrap_or_else(|| "N/A".to_string());
            lines.push(ReportLine::new(
                format!(
                    "Day {}  {}  {} @ {}  ({})",
                    activity.day, activity.time, activity.title, activity.location, cost
                ),
                10.0,
                false,
            ));
        }
    }

    if !trip.expenses.is_empty() {
        let mut expenses: Vec<&Expense> = trip.expenses.iter().collect();
        expenses.sort_by_key(|e| e.date);
        let total: f64 = expenses.iter().map(|e| e.amount).sum();

        lines.push(ReportLine::blank());
        lines.push(ReportLine::new("Expenses", 16.0, true));
        for expense in expenses {
            lines.push(ReportLine::new(
                format!(
                    "{}  {}  {}  {}",
                    expense.date.format("%m/%d/%Y"),
                    category_label(expense.category),
                    expense.title,
                    money(expense.amount)
                ),
                10.0,
                false,
            ));
        }
        lines.push(ReportLine::blank());
        lines.push(ReportLine::new(format!("Total Expenses: {}", money(total)), 11.0, true));
        lines.push(ReportLine::new(
            format!("Remaining Budget: {}", money(trip.budget - total)),
            11.0,
            true,
        ));
    }

    lines
}

/// Single-column text report of the trip, its activities and expenses.
/// Starts a new page whenever the next line would cross the bottom margin.
pub fn trip_pdf(trip: &Trip) -> Result<Vec<u8>, printpdf::Error> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Trip Report: {}", trip.title),
        PAGE_WIDTH,
        PAGE_HEIGHT,
        "Report",
    );
    let regular = doc.add_external_font(REGULAR_FONT)?;
    let bold = doc.add_external_font(BOLD_FONT)?;

    let mut canvas = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in report_lines(trip) {
        let step = Mm::from(Pt(line.size + 6.0));
        if y < MARGIN + step {
            let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Report");
            canvas = doc.get_page(page).get_layer(layer);
            y = PAGE_HEIGHT - MARGIN;
        }
        y -= step;
        if line.text.is_empty() {
            continue;
        }
        let font = if line.bold { &bold } else { &regular };
        canvas.use_text(line.text, line.size, MARGIN, y, font);
    }

    doc.save_to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::TripCreate;
    use chrono::TimeZone;

    fn activity(title: &str, day: u32, time: &str) -> Activity {
        Activity {
            id: crate::models::new_id(),
            title: title.to_string(),
            time: time.to_string(),
            location: "Old Town, Main Square".to_string(),
            activity_type: ActivityType::Activity,
            notes: None,
            cost: Some(12.5),
            day,
            order: 0,
        }
    }

    fn trip() -> Trip {
        let start = Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap();
        let mut trip = Trip::new(
            TripCreate {
                title: "Spring in Prague".to_string(),
                destination: "Czechia".to_string(),
                start_date: start,
                end_date: start + Duration::days(4),
                budget: 900.0,
            },
            "owner".to_string(),
            crate::models::new_id(),
            start,
        );
        trip.activities = vec![
            activity("Castle tour", 2, "14:00"),
            activity("Walking tour", 1, "09:30"),
        ];
        trip.expenses = vec![Expense {
            id: crate::models::new_id(),
            title: "Hostel (2 nights)".to_string(),
            amount: 120.0,
            category: ExpenseCategory::Accommodation,
            date: start,
            notes: None,
        }];
        trip
    }

    #[test]
    fn calendar_has_one_event_per_activity_on_its_day() {
        let ics = trip_calendar(&trip());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("DTSTART:20250510T093000\r\n"));
        assert!(ics.contains("DTEND:20250510T103000\r\n"));
        assert!(ics.contains("DTSTART:20250511T140000\r\n"));
        assert!(ics.contains("LOCATION:Old Town\\, Main Square\r\n"));
    }

    #[test]
    fn calendar_skips_days_past_the_calendar_range() {
        let mut trip = trip();
        trip.activities.push(activity("Lost in time", u32::MAX, "10:00"));
        let ics = trip_calendar(&trip);
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(!ics.contains("Lost in time"));
    }

    fn page_count(pdf: &[u8]) -> usize {
        printpdf::lopdf::Document::load_mem(pdf)
            .unwrap()
            .get_pages()
            .len()
    }

    #[test]
    fn report_lists_schedule_and_totals() {
        let lines: Vec<String> = report_lines(&trip()).into_iter().map(|l| l.text).collect();

        assert_eq!(lines[0], "Trip Report: Spring in Prague");
        let walking = lines.iter().position(|l| l.contains("Walking tour")).unwrap();
        let castle = lines.iter().position(|l| l.contains("Castle tour")).unwrap();
        assert!(walking < castle);
        assert!(lines.iter().any(|l| l.contains("Hostel (2 nights)")));
        assert!(lines.contains(&"Remaining Budget: $780.00".to_string()));
    }

    #[test]
    fn pdf_is_well_formed() {
        let pdf = trip_pdf(&trip()).unwrap();

        assert!(pdf.starts_with(b"%PDF-"));
        assert!(pdf.ends_with(b"%%EOF"));
        assert_eq!(page_count(&pdf), 1);
    }

    #[test]
    fn long_reports_span_pages() {
        let mut trip = trip();
        trip.activities = (1..=120).map(|day| activity("Museum", day, "10:00")).collect();
        let pdf = trip_pdf(&trip).unwrap();
        assert!(page_count(&pdf) > 1);
    }

    #[test]
    fn json_export_lists_everything() {
        let trip = trip();
        let json: serde_json::Value = serde_json::from_str(&trip_json(&trip).unwrap()).unwrap();
        assert_eq!(json["trip"]["id"], trip.id.as_str());
        assert_eq!(json["activities"].as_array().unwrap().len(), 2);
        assert_eq!(json["expenses"][0]["category"], "accommodation");
    }

    #[test]
    fn filenames_are_header_safe() {
        let mut trip = trip();
        trip.title = "Rome \"2025\"; ok".to_string();
        assert_eq!(export_filename(&trip, "data.json"), "Rome__2025___ok_data.json");
    }
}
