//! Weekday CSV loader
//!
//! Each show day lives in its own file named after the weekday
//! (`Monday.csv`, `Friday.csv`, ...). Bad rows are skipped and counted,
//! a missing file or a header without a required column fails the load.

use crate::error::{DataError, Result};
use crate::models::{CsvRecord, LoadSummary, TicketSale, TicketTable, Weekday, REQUIRED_COLUMNS};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rows logged individually per file before going quiet
const MAX_LOGGED_SKIPS: usize = 5;

/// Full weekday name, any case. Abbreviations are not file names.
fn weekday_for_stem(stem: &str) -> Option<Weekday> {
    Weekday::ALL
        .into_iter()
        .find(|day| day.as_str().eq_ignore_ascii_case(stem))
}

fn is_canonical(day: Weekday, path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(format!("{}.csv", day).as_str())
}

/// Find `<Weekday>.csv` files in `dir`, Monday first, at most one per day.
/// Exploratory exports (`*eda*`) are ignored.
pub fn discover_weekday_files(dir: &Path) -> Result<Vec<(Weekday, PathBuf)>> {
    if !dir.is_dir() {
        return Err(DataError::FileNotFound(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| DataError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| DataError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if !path.is_file() || path.extension().map_or(true, |e| e != "csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.to_ascii_lowercase().contains("eda") {
            debug!("Skipping exploratory file {:?}", path);
            continue;
        }
        match weekday_for_stem(stem) {
            Some(day) => candidates.push((day, path)),
            None => debug!("Ignoring {:?}: not named after a show day", path),
        }
    }

    // Exact `<Weekday>.csv` first, so it wins over a differently cased copy
    candidates.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| is_canonical(b.0, &b.1).cmp(&is_canonical(a.0, &a.1)))
            .then_with(|| a.1.cmp(&b.1))
    });

    let mut files: Vec<(Weekday, PathBuf)> = Vec::with_capacity(candidates.len());
    for (day, path) in candidates {
        if let Some((_, kept)) = files.last().filter(|(d, _)| *d == day) {
            warn!("Ignoring {:?}: {} is already loaded from {:?}", path, day, kept);
            continue;
        }
        files.push((day, path));
    }
    Ok(files)
}

/// Path of the file holding `weekday` in `dir`
pub fn weekday_path(dir: &Path, weekday: Weekday) -> PathBuf {
    dir.join(format!("{}.csv", weekday))
}

fn check_headers(path: &Path, headers: &csv::StringRecord) -> Result<()> {
    for (column, alias) in REQUIRED_COLUMNS {
        let present = headers
            .iter()
            .any(|h| h.trim() == *column || h.trim() == *alias);
        if !present {
            return Err(DataError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Load one weekday file
pub fn load_weekday(path: &Path, weekday: Weekday) -> Result<(Vec<TicketSale>, LoadSummary)> {
    if !path.is_file() {
        return Err(DataError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut summary = LoadSummary {
        weekday,
        path: path.to_path_buf(),
        loaded: 0,
        skipped: 0,
    };

    if headers.is_empty() {
        info!("{}: empty file {:?}", weekday, path);
        return Ok((Vec::new(), summary));
    }
    check_headers(path, &headers)?;

    let mut sales = Vec::new();
    for (i, result) in reader.deserialize::<CsvRecord>().enumerate() {
        // Header is line 1
        let row = i + 2;
        let outcome = result
            .map_err(|e| DataError::InvalidRow {
                row,
                reason: e.to_string(),
            })
            .and_then(|record| {
                record
                    .to_ticket_sale(weekday)
                    .map_err(|reason| DataError::InvalidRow { row, reason })
            });

        match outcome {
            Ok(sale) => sales.push(sale),
            Err(e) => {
                if summary.skipped < MAX_LOGGED_SKIPS {
                    warn!("{:?}: skipping {}", path, e);
                }
                summary.skipped += 1;
            }
        }
    }

    summary.loaded = sales.len();
    info!(
        "Loaded {} records from {} ({} skipped)",
        summary.loaded, weekday, summary.skipped
    );
    Ok((sales, summary))
}

/// Load the files of the given show days from `dir`
pub fn load_weekdays(dir: &Path, days: &[Weekday]) -> Result<TicketTable> {
    let files: Vec<(Weekday, PathBuf)> = days
        .iter()
        .map(|day| (*day, weekday_path(dir, *day)))
        .collect();
    load_files(&files)
}

/// Load every weekday file found in `dir`
pub fn load_all(dir: &Path) -> Result<TicketTable> {
    let files = discover_weekday_files(dir)?;
    if files.is_empty() {
        warn!("No weekday CSV files found in {:?}", dir);
    }
    load_files(&files)
}

fn load_files(files: &[(Weekday, PathBuf)]) -> Result<TicketTable> {
    let mut records = Vec::new();
    let mut summaries = Vec::with_capacity(files.len());

    for (day, path) in files {
        let (sales, summary) = load_weekday(path, *day)?;
        records.extend(sales);
        summaries.push(summary);
    }

    let table = TicketTable::new(records, summaries);
    info!(
        "Total records loaded: {} ({} rows skipped)",
        table.len(),
        table.skipped_rows()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Order ID,Order date,Event start date,Event name,Buyer email,Purchaser city,Purchaser state,Payment type,Ticket quantity,Gross sales";

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_skips_bad_rows() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "{HEADER}\n\
             1,2024-01-01 12:00:00,2024-01-10,Show,a@x.com,Arlington,VA,Card,2,30.00\n\
             2,not-a-date,2024-01-10,Show,b@x.com,Arlington,VA,Card,1,15.00\n\
             3,2024-01-05 09:00:00,2024-01-10,Show,c@x.com,Washington,DC,Free,1,\n\
             4,2024-01-05 09:00:00,2024-01-12,Show,d@x.com,Washington,DC,Card,1,15.00\n\
             5,2024-01-05 09:00:00,2024-01-10,Show,e@x.com,Washington,DC,Card,two,15.00\n"
        );
        let path = write(dir.path(), "Wednesday.csv", &body);

        let (sales, summary) = load_weekday(&path, Weekday::Wednesday).unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(summary.loaded, 2);
        // bad date, wrong weekday, bad quantity
        assert_eq!(summary.skipped, 3);
        assert!(sales.iter().all(|s| s.show_weekday == Weekday::Wednesday));
    }

    #[test]
    fn test_empty_file_yields_empty_table() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Monday.csv", "");
        let table = load_weekdays(dir.path(), &[Weekday::Monday]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.summaries().len(), 1);
        assert_eq!(table.summaries()[0].loaded, 0);
    }

    #[test]
    fn test_header_only_file_yields_empty_table() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Monday.csv", &format!("{HEADER}\n"));
        let table = load_weekdays(dir.path(), &[Weekday::Monday]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_column_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "Friday.csv",
            "Order date,Event start date\n2024-01-01 12:00:00,2024-01-12\n",
        );
        match load_weekday(&path, Weekday::Friday) {
            Err(DataError::MissingColumn { column, .. }) => assert_eq!(column, "Buyer email"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_snake_case_headers_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "Wednesday.csv",
            "purchase_date,show_date,customer_identifier,customer_location,payment_method,ticket_quantity,price\n\
             2024-01-01,2024-01-10,a@x.com,DC,Card,1,10\n",
        );
        let (sales, summary) = load_weekday(&path, Weekday::Wednesday).unwrap();
        assert_eq!(summary.skipped, 0);
        assert_eq!(sales[0].location.state, "DC");
        assert_eq!(sales[0].lead_days(), 9);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_weekdays(dir.path(), &[Weekday::Saturday]).unwrap_err();
        assert!(matches!(err, DataError::FileNotFound(_)));
    }

    #[test]
    fn test_discovery_ignores_eda_and_other_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Saturday.csv", "");
        write(dir.path(), "Monday.csv", "");
        write(dir.path(), "monday_eda.csv", "");
        write(dir.path(), "notes.csv", "");
        write(dir.path(), "Friday.txt", "");

        let files = discover_weekday_files(dir.path()).unwrap();
        let days: Vec<Weekday> = files.iter().map(|(d, _)| *d).collect();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Saturday]);
    }

    #[test]
    fn test_discovery_missing_dir() {
        let err = discover_weekday_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, DataError::FileNotFound(_)));
    }

    #[test]
    fn test_discovery_keeps_one_file_per_day() {
        let dir = TempDir::new().unwrap();
        let body = format!("{HEADER}\n1,2024-01-01 12:00:00,2024-01-10,Show,a@x.com,Arlington,VA,Card,1,15.00\n");
        write(dir.path(), "Wednesday.csv", &body);
        write(dir.path(), "Wed.csv", &body);
        write(dir.path(), "FRIDAY.csv", "");

        let files = discover_weekday_files(dir.path()).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|(_, p)| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Wednesday.csv", "FRIDAY.csv"]);

        let table = load_all(dir.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.summaries().len(), 2);
    }

    #[test]
    fn test_discovery_prefers_exact_name_over_other_case() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Monday.csv", "");
        write(dir.path(), "monday.csv", "");

        let files = discover_weekday_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, Weekday::Monday);
        assert_eq!(files[0].1.file_name().unwrap(), "Monday.csv");
    }

    #[test]
    fn test_loaded_file_feeds_lead_time_buckets() {
        use crate::holidays::UsFederalHolidays;
        use crate::metrics::{timing, AnalysisContext};

        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Wednesday.csv",
            &format!(
                "{HEADER}\n\
                 1,2024-01-01 10:00:00,2024-01-10,Show,a@x.com,Washington,DC,Card,1,15.00\n\
                 2,2024-01-05 18:30:00,2024-01-10,Show,b@x.com,Washington,DC,Card,2,30.00\n"
            ),
        );

        let table = load_all(dir.path()).unwrap();
        assert_eq!(table.len(), 2);
        let cal = UsFederalHolidays;
        let timing = timing::compute(&AnalysisContext::new(&table, &cal));

        assert_eq!(timing.bucket("8-14 days").unwrap().totals.orders, 1);
        assert_eq!(timing.bucket("4-7 days").unwrap().totals.orders, 1);
        assert_eq!(timing.avg_lead_days, Some(7.0));
        assert_eq!(timing.after_show, 0);
    }
}
