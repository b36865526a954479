//! Error types for loading and analysing ticket sales

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading weekday CSV files
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{column}' in {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("Invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Failures inside a single metric calculator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CalculationError {
    #[error("Holiday lookup failed for {date}: {reason}")]
    HolidayLookup { date: chrono::NaiveDate, reason: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
