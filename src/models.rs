use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Raw row from a weekday CSV export
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvRecord {
    #[serde(default, rename = "Order ID", alias = "order_id")]
    pub order_id: Option<String>,
    #[serde(default, rename = "Order date", alias = "purchase_date")]
    pub order_date: Option<String>,
    #[serde(default, rename = "Event start date", alias = "show_date")]
    pub event_start_date: Option<String>,
    #[serde(default, rename = "Event name", alias = "event_name")]
    pub event_name: Option<String>,
    #[serde(default, rename = "Buyer email", alias = "customer_identifier")]
    pub buyer_email: Option<String>,
    #[serde(default, rename = "Purchaser city", alias = "customer_city")]
    pub purchaser_city: Option<String>,
    #[serde(default, rename = "Purchaser state", alias = "customer_location")]
    pub purchaser_state: Option<String>,
    #[serde(default, rename = "Payment type", alias = "payment_method")]
    pub payment_type: Option<String>,
    #[serde(default, rename = "Ticket quantity", alias = "ticket_quantity")]
    pub ticket_quantity: Option<String>,
    #[serde(default, rename = "Gross sales", alias = "price")]
    pub gross_sales: Option<String>,
}

/// Columns a weekday file must carry, as (header, snake_case alias)
pub const REQUIRED_COLUMNS: &[(&str, &str)] = &[
    ("Order date", "purchase_date"),
    ("Event start date", "show_date"),
    ("Buyer email", "customer_identifier"),
    ("Purchaser state", "customer_location"),
    ("Payment type", "payment_method"),
    ("Ticket quantity", "ticket_quantity"),
    ("Gross sales", "price"),
];

pub const UNKNOWN: &str = "Unknown";

/// Show day. Shows run Monday through Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown weekday '{0}'. Expected one of Monday..Saturday")]
pub struct ParseWeekdayError(pub String);

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    /// `None` for Sunday
    pub fn from_chrono(day: chrono::Weekday) -> Option<Self> {
        match day {
            chrono::Weekday::Mon => Some(Weekday::Monday),
            chrono::Weekday::Tue => Some(Weekday::Tuesday),
            chrono::Weekday::Wed => Some(Weekday::Wednesday),
            chrono::Weekday::Thu => Some(Weekday::Thursday),
            chrono::Weekday::Fri => Some(Weekday::Friday),
            chrono::Weekday::Sat => Some(Weekday::Saturday),
            chrono::Weekday::Sun => None,
        }
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
        }
    }

    pub fn of(date: NaiveDate) -> Option<Self> {
        Self::from_chrono(date.weekday())
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ParseWeekdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" | "tues" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" | "thurs" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            "saturday" | "sat" => Ok(Weekday::Saturday),
            _ => Err(ParseWeekdayError(s.to_string())),
        }
    }
}

/// Purchaser location
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
}

impl Location {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
        }
    }

    /// e.g. "Washington, DC"
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }
}

/// One order for one show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSale {
    pub order_id: Option<String>,
    pub purchased_at: NaiveDateTime,
    pub show_date: NaiveDate,
    pub show_weekday: Weekday,
    pub event_name: Option<String>,
    /// Lower-cased buyer e-mail
    pub customer_id: Option<String>,
    pub location: Location,
    pub payment_method: String,
    pub ticket_quantity: u32,
    pub price: f64,
}

impl TicketSale {
    /// Calendar days between purchase and show. Negative when bought after the show date.
    pub fn lead_days(&self) -> i64 {
        (self.show_date - self.purchased_at.date()).num_days()
    }

    pub fn is_free(&self) -> bool {
        self.payment_method.eq_ignore_ascii_case("free")
    }
}

/// Per-file outcome of a load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub weekday: Weekday,
    pub path: PathBuf,
    pub loaded: usize,
    pub skipped: usize,
}

/// All loaded sales, read-only after construction
#[derive(Debug, Clone, Default)]
pub struct TicketTable {
    records: Vec<TicketSale>,
    summaries: Vec<LoadSummary>,
}

impl TicketTable {
    pub fn new(records: Vec<TicketSale>, summaries: Vec<LoadSummary>) -> Self {
        Self { records, summaries }
    }

    pub fn from_records(records: Vec<TicketSale>) -> Self {
        Self::new(records, Vec::new())
    }

    pub fn records(&self) -> &[TicketSale] {
        &self.records
    }

    /// Rows for one show day, or all rows when `filter` is `None`
    pub fn rows(&self, filter: Option<Weekday>) -> impl Iterator<Item = &TicketSale> + '_ {
        self.records
            .iter()
            .filter(move |r| filter.map_or(true, |day| r.show_weekday == day))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summaries(&self) -> &[LoadSummary] {
        &self.summaries
    }

    pub fn skipped_rows(&self) -> usize {
        self.summaries.iter().map(|s| s.skipped).sum()
    }

    /// Weekdays with at least one row, Monday first
    pub fn weekdays(&self) -> Vec<Weekday> {
        let mut days: Vec<Weekday> = self.records.iter().map(|r| r.show_weekday).collect();
        days.sort();
        days.dedup();
        days
    }
}

fn clean(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_purchase_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_show_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.split(|c: char| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_quantity(s: &str) -> Option<u32> {
    s.parse::<u32>().ok().or_else(|| {
        let f = s.parse::<f64>().ok()?;
        (f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u32)
    })
}

fn parse_price(s: Option<&str>) -> Option<f64> {
    let Some(s) = s else { return Some(0.0) };
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    let value = cleaned.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

impl CsvRecord {
    /// Validate and convert a raw row. The error string names the offending field.
    pub fn to_ticket_sale(&self, file_weekday: Weekday) -> Result<TicketSale, String> {
        let order_date = clean(&self.order_date).ok_or("missing order date")?;
        let purchased_at = parse_purchase_datetime(order_date)
            .ok_or_else(|| format!("unparsable order date '{}'", order_date))?;

        let event_date = clean(&self.event_start_date).ok_or("missing event start date")?;
        let show_date = parse_show_date(event_date)
            .ok_or_else(|| format!("unparsable event start date '{}'", event_date))?;

        let show_weekday = Weekday::of(show_date)
            .ok_or_else(|| format!("show date {} falls on a Sunday", show_date))?;
        if show_weekday != file_weekday {
            return Err(format!(
                "show date {} is a {}, expected {}",
                show_date, show_weekday, file_weekday
            ));
        }

        let quantity_raw = clean(&self.ticket_quantity).ok_or("missing ticket quantity")?;
        let ticket_quantity = parse_quantity(quantity_raw)
            .ok_or_else(|| format!("invalid ticket quantity '{}'", quantity_raw))?;

        let price = parse_price(clean(&self.gross_sales)).ok_or_else(|| {
            format!(
                "invalid gross sales '{}'",
                self.gross_sales.as_deref().unwrap_or_default()
            )
        })?;

        Ok(TicketSale {
            order_id: clean(&self.order_id).map(str::to_string),
            purchased_at,
            show_date,
            show_weekday,
            event_name: clean(&self.event_name).map(str::to_string),
            customer_id: clean(&self.buyer_email).map(str::to_lowercase),
            location: Location::new(
                clean(&self.purchaser_city).unwrap_or(UNKNOWN),
                clean(&self.purchaser_state).unwrap_or(UNKNOWN),
            ),
            payment_method: clean(&self.payment_type).unwrap_or(UNKNOWN).to_string(),
            ticket_quantity,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_date: &str, event_date: &str) -> CsvRecord {
        CsvRecord {
            order_id: Some("1001".into()),
            order_date: Some(order_date.into()),
            event_start_date: Some(event_date.into()),
            event_name: Some("Open Mic".into()),
            buyer_email: Some("Fan@Example.com ".into()),
            purchaser_city: Some("Washington".into()),
            purchaser_state: Some("DC".into()),
            payment_type: Some("Card".into()),
            ticket_quantity: Some("2".into()),
            gross_sales: Some("$1,024.50".into()),
        }
    }

    #[test]
    fn test_weekday_parsing() {
        assert_eq!("friday".parse::<Weekday>(), Ok(Weekday::Friday));
        assert_eq!(" SAT ".parse::<Weekday>(), Ok(Weekday::Saturday));
        assert_eq!("Mon".parse::<Weekday>(), Ok(Weekday::Monday));
        assert!("Sunday".parse::<Weekday>().is_err());
        assert!("".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_weekday_from_date() {
        // 2024-01-10 was a Wednesday, 2024-01-14 a Sunday
        let wed = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let sun = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(Weekday::of(wed), Some(Weekday::Wednesday));
        assert_eq!(Weekday::of(sun), None);
        assert_eq!(Weekday::Wednesday.to_chrono(), chrono::Weekday::Wed);
    }

    #[test]
    fn test_record_conversion() {
        let sale = record("2024-01-01 19:30:00", "2024-01-10")
            .to_ticket_sale(Weekday::Wednesday)
            .unwrap();
        assert_eq!(sale.customer_id.as_deref(), Some("fan@example.com"));
        assert_eq!(sale.ticket_quantity, 2);
        assert!((sale.price - 1024.5).abs() < 1e-9);
        assert_eq!(sale.lead_days(), 9);
        assert_eq!(sale.location.label(), "Washington, DC");
    }

    #[test]
    fn test_record_rejects_bad_dates_and_mismatched_day() {
        assert!(record("yesterday", "2024-01-10")
            .to_ticket_sale(Weekday::Wednesday)
            .is_err());
        assert!(record("2024-01-01 10:00:00", "2024/01/10")
            .to_ticket_sale(Weekday::Wednesday)
            .is_err());
        let err = record("2024-01-01 10:00:00", "2024-01-10")
            .to_ticket_sale(Weekday::Friday)
            .unwrap_err();
        assert!(err.contains("expected Friday"));
    }

    #[test]
    fn test_blank_fields_fall_back() {
        let mut raw = record("2024-01-05", "2024-01-10 20:00:00");
        raw.gross_sales = None;
        raw.purchaser_city = Some("  ".into());
        raw.payment_type = None;
        raw.buyer_email = None;
        let sale = raw.to_ticket_sale(Weekday::Wednesday).unwrap();
        assert_eq!(sale.price, 0.0);
        assert_eq!(sale.location.city, UNKNOWN);
        assert_eq!(sale.payment_method, UNKNOWN);
        assert_eq!(sale.customer_id, None);
        assert_eq!(sale.lead_days(), 5);
    }

    #[test]
    fn test_table_rows_filter() {
        let wed = record("2024-01-01 10:00:00", "2024-01-10")
            .to_ticket_sale(Weekday::Wednesday)
            .unwrap();
        let fri = record("2024-01-01 10:00:00", "2024-01-12")
            .to_ticket_sale(Weekday::Friday)
            .unwrap();
        let table = TicketTable::from_records(vec![wed, fri.clone(), fri]);
        assert_eq!(table.rows(None).count(), 3);
        assert_eq!(table.rows(Some(Weekday::Friday)).count(), 2);
        assert_eq!(table.rows(Some(Weekday::Monday)).count(), 0);
        assert_eq!(table.weekdays(), vec![Weekday::Wednesday, Weekday::Friday]);
    }
}
