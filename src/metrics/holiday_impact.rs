//! Do holiday shows sell differently?

use super::{mean, ratio, AnalysisContext, Totals};
use crate::error::CalculationError;
use crate::models::Weekday;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolidayShow {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub holiday: String,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolidayImpact {
    pub holiday_shows: usize,
    pub regular_shows: usize,
    pub holiday_mean_tickets: Option<f64>,
    pub regular_mean_tickets: Option<f64>,
    /// holiday mean / regular mean
    pub lift: Option<f64>,
    pub holidays: Vec<HolidayShow>,
}

pub fn compute(ctx: &AnalysisContext<'_>) -> Result<HolidayImpact, CalculationError> {
    let mut shows: BTreeMap<NaiveDate, (Weekday, Totals)> = BTreeMap::new();
    for sale in ctx.rows() {
        shows
            .entry(sale.show_date)
            .or_insert_with(|| (sale.show_weekday, Totals::default()))
            .1
            .add(sale);
    }

    let mut holiday_tickets = Vec::new();
    let mut regular_tickets = Vec::new();
    let mut holidays = Vec::new();

    for (date, (weekday, totals)) in shows {
        match ctx.calendar.holiday_name(date)? {
            Some(holiday) => {
                holiday_tickets.push(totals.tickets as f64);
                holidays.push(HolidayShow {
                    date,
                    weekday,
                    holiday,
                    totals,
                });
            }
            None => regular_tickets.push(totals.tickets as f64),
        }
    }

    let holiday_mean_tickets = mean(&holiday_tickets);
    let regular_mean_tickets = mean(&regular_tickets);
    let lift = match (holiday_mean_tickets, regular_mean_tickets) {
        (Some(h), Some(r)) => ratio(h, r),
        _ => None,
    };

    Ok(HolidayImpact {
        holiday_shows: holiday_tickets.len(),
        regular_shows: regular_tickets.len(),
        holiday_mean_tickets,
        regular_mean_tickets,
        lift,
        holidays,
    })
}
