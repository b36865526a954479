//! Holiday calendars used to flag show dates

use crate::error::{CalculationError, DataError};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Answers "is this date a holiday?"
pub trait HolidayCalendar: Send + Sync {
    /// Holiday name, `None` for ordinary days
    fn holiday_name(&self, date: NaiveDate) -> Result<Option<String>, CalculationError>;

    fn is_holiday(&self, date: NaiveDate) -> Result<bool, CalculationError> {
        Ok(self.holiday_name(date)?.is_some())
    }
}

/// US federal holidays, including observed weekday substitutes
#[derive(Debug, Clone, Copy, Default)]
pub struct UsFederalHolidays;

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}

/// Saturday holidays are observed on Friday, Sunday holidays on Monday
fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

impl UsFederalHolidays {
    /// All holidays of `year`, observed dates included. Observed dates may spill into the previous year.
    pub fn for_year(year: i32) -> Vec<(NaiveDate, String)> {
        let fixed = |month, day| NaiveDate::from_ymd_opt(year, month, day);

        let mut rules: Vec<(Option<NaiveDate>, &str, bool)> = vec![
            (fixed(1, 1), "New Year's Day", true),
            (nth_weekday(year, 1, Weekday::Mon, 3), "Martin Luther King Jr. Day", false),
            (nth_weekday(year, 2, Weekday::Mon, 3), "Washington's Birthday", false),
            (last_weekday(year, 5, Weekday::Mon), "Memorial Day", false),
            (fixed(7, 4), "Independence Day", true),
            (nth_weekday(year, 9, Weekday::Mon, 1), "Labor Day", false),
            (nth_weekday(year, 10, Weekday::Mon, 2), "Columbus Day", false),
            (fixed(11, 11), "Veterans Day", true),
            (nth_weekday(year, 11, Weekday::Thu, 4), "Thanksgiving", false),
            (fixed(12, 25), "Christmas Day", true),
        ];
        if year >= 2021 {
            rules.push((fixed(6, 19), "Juneteenth National Independence Day", true));
        }

        let mut days = Vec::new();
        for (date, name, fixed_date) in rules {
            let Some(date) = date else { continue };
            days.push((date, name.to_string()));
            if fixed_date {
                if let Some(obs) = observed(date) {
                    days.push((obs, format!("{} (observed)", name)));
                }
            }
        }
        days.sort();
        days
    }
}

impl HolidayCalendar for UsFederalHolidays {
    fn holiday_name(&self, date: NaiveDate) -> Result<Option<String>, CalculationError> {
        // Dec 31 can be the observed New Year's Day of the following year
        let found = [date.year(), date.year() + 1]
            .into_iter()
            .flat_map(Self::for_year)
            .find(|(d, _)| *d == date)
            .map(|(_, name)| name);
        Ok(found)
    }
}

/// Explicit list of holiday dates, e.g. a venue's own calendar
#[derive(Debug, Clone, Default)]
pub struct DateListCalendar {
    dates: HashMap<NaiveDate, String>,
}

impl DateListCalendar {
    pub fn new<I, S>(dates: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S)>,
        S: Into<String>,
    {
        Self {
            dates: dates.into_iter().map(|(d, n)| (d, n.into())).collect(),
        }
    }

    /// One `YYYY-MM-DD[,name]` per line. Blank lines and `#` comments are ignored.
    pub fn parse(contents: &str) -> Result<Self, DataError> {
        let mut dates = HashMap::new();
        for (i, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (date_str, name) = match line.split_once(',') {
                Some((d, n)) => (d.trim(), n.trim()),
                None => (line, "Holiday"),
            };
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                DataError::InvalidRow {
                    row: i + 1,
                    reason: format!("invalid holiday date '{}': {}", date_str, e),
                }
            })?;
            dates.insert(date, name.to_string());
        }
        Ok(Self { dates })
    }

    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        if !path.is_file() {
            return Err(DataError::FileNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl HolidayCalendar for DateListCalendar {
    fn holiday_name(&self, date: NaiveDate) -> Result<Option<String>, CalculationError> {
        Ok(self.dates.get(&date).cloned())
    }
}

/// Holiday file if given, otherwise the built-in US federal calendar
pub fn load_calendar(path: Option<&Path>) -> Result<Arc<dyn HolidayCalendar>, DataError> {
    match path {
        Some(path) => {
            let calendar = DateListCalendar::from_file(path)?;
            info!("Loaded {} holidays from {}", calendar.len(), path.display());
            Ok(Arc::new(calendar))
        }
        None => Ok(Arc::new(UsFederalHolidays)),
    }
}
