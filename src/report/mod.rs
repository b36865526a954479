//! Report assembly
//!
//! Runs every calculator for one filter and collects the outputs keyed by
//! category. A failing calculator becomes an error marker in its own
//! section; the other sections are still produced.

pub mod console;

use crate::metrics::{AnalysisContext, MetricKind, MetricResult};
use crate::models::Weekday;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

pub use console::render_console;

/// Outcome of one calculator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionOutcome {
    Ok(MetricResult),
    Failed { error: String },
}

impl SectionOutcome {
    pub fn result(&self) -> Option<&MetricResult> {
        match self {
            SectionOutcome::Ok(result) => Some(result),
            SectionOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SectionOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub filter: Option<Weekday>,
    pub generated_at: NaiveDateTime,
    pub total_records: usize,
    pub skipped_rows: usize,
    #[serde(flatten)]
    pub sections: BTreeMap<MetricKind, SectionOutcome>,
}

impl InsightReport {
    pub fn section(&self, kind: MetricKind) -> Option<&SectionOutcome> {
        self.sections.get(&kind)
    }

    pub fn failed_sections(&self) -> Vec<MetricKind> {
        self.sections
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Pretty JSON at `path`, replacing any existing file
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        info!("Results saved to {}", path.display());
        Ok(())
    }
}

/// Run one calculator, turning a failure into an error marker
pub fn run_section(kind: MetricKind, ctx: &AnalysisContext<'_>) -> SectionOutcome {
    let started = Instant::now();
    let outcome = match kind.compute(ctx) {
        Ok(result) => SectionOutcome::Ok(result),
        Err(e) => {
            error!("{} calculation failed: {}", kind, e);
            SectionOutcome::Failed {
                error: e.to_string(),
            }
        }
    };
    debug!("{} computed in {:.2?}", kind, started.elapsed());
    outcome
}

/// Run every calculator for the context's filter
pub fn build_report(ctx: &AnalysisContext<'_>) -> InsightReport {
    info!("Building report for {}", ctx.filter_label());
    let sections = MetricKind::ALL
        .into_iter()
        .map(|kind| (kind, run_section(kind, ctx)))
        .collect();

    InsightReport {
        filter: ctx.filter,
        generated_at: Local::now().naive_local(),
        total_records: ctx.rows().count(),
        skipped_rows: ctx.table.skipped_rows(),
        sections,
    }
}
