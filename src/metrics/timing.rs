//! How far ahead of the show people buy

use super::{mean, AnalysisContext, Totals};
use serde::Serialize;

/// (label, min days, max days inclusive)
pub const LEAD_BUCKETS: [(&str, i64, Option<i64>); 6] = [
    ("0 days", 0, Some(0)),
    ("1-3 days", 1, Some(3)),
    ("4-7 days", 4, Some(7)),
    ("8-14 days", 8, Some(14)),
    ("15-30 days", 15, Some(30)),
    ("31+ days", 31, None),
];

/// Bucket for a lead time; `None` for purchases after the show date
pub fn bucket_index(lead_days: i64) -> Option<usize> {
    LEAD_BUCKETS
        .iter()
        .position(|(_, min, max)| lead_days >= *min && max.map_or(true, |m| lead_days <= m))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadBucket {
    pub label: String,
    pub min_days: i64,
    pub max_days: Option<i64>,
    #[serde(flatten)]
    pub totals: Totals,
    pub share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseTiming {
    pub total_orders: usize,
    pub buckets: Vec<LeadBucket>,
    /// Orders placed after the show date
    pub after_show: usize,
    pub avg_lead_days: Option<f64>,
    pub same_day: usize,
    pub last_minute: usize,
    pub advance: usize,
}

impl PurchaseTiming {
    pub fn bucket(&self, label: &str) -> Option<&LeadBucket> {
        self.buckets.iter().find(|b| b.label == label)
    }
}

pub fn compute(ctx: &AnalysisContext<'_>) -> PurchaseTiming {
    let mut bucket_totals = [Totals::default(); LEAD_BUCKETS.len()];
    let mut leads = Vec::new();
    let mut after_show = 0;

    for sale in ctx.rows() {
        let lead = sale.lead_days();
        leads.push(lead as f64);
        match bucket_index(lead) {
            Some(i) => bucket_totals[i].add(sale),
            None => after_show += 1,
        }
    }

    let total_orders = leads.len();
    let buckets = LEAD_BUCKETS
        .iter()
        .zip(bucket_totals)
        .map(|((label, min, max), totals)| LeadBucket {
            label: label.to_string(),
            min_days: *min,
            max_days: *max,
            totals,
            share: super::ratio(totals.orders as f64, total_orders as f64),
        })
        .collect();

    PurchaseTiming {
        total_orders,
        buckets,
        after_show,
        avg_lead_days: mean(&leads),
        same_day: leads.iter().filter(|d| **d == 0.0).count(),
        last_minute: leads.iter().filter(|d| (0.0..=1.0).contains(*d)).count(),
        advance: leads.iter().filter(|d| **d >= 7.0).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::UsFederalHolidays;
    use crate::metrics::test_support::sale;
    use crate::models::TicketTable;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(bucket_index(-1), None);
        assert_eq!(bucket_index(0), Some(0));
        assert_eq!(bucket_index(3), Some(1));
        assert_eq!(bucket_index(4), Some(2));
        assert_eq!(bucket_index(7), Some(2));
        assert_eq!(bucket_index(14), Some(3));
        assert_eq!(bucket_index(30), Some(4));
        assert_eq!(bucket_index(31), Some(5));
        assert_eq!(bucket_index(400), Some(5));
    }

    #[test]
    fn test_nine_and_five_day_leads() {
        let table = TicketTable::from_records(vec![
            sale("a@x.com", "2024-01-01", "2024-01-10", 1, 10.0),
            sale("b@x.com", "2024-01-05", "2024-01-10", 1, 10.0),
        ]);
        let cal = UsFederalHolidays;
        let timing = compute(&AnalysisContext::new(&table, &cal));

        assert_eq!(timing.bucket("8-14 days").unwrap().totals.orders, 1);
        assert_eq!(timing.bucket("4-7 days").unwrap().totals.orders, 1);
        assert_eq!(timing.bucket("0 days").unwrap().totals.orders, 0);
        assert_eq!(timing.avg_lead_days, Some(7.0));
        assert_eq!(timing.advance, 1);
        assert_eq!(timing.after_show, 0);
    }

    #[test]
    fn test_same_day_and_late_purchases() {
        let table = TicketTable::from_records(vec![
            sale("a@x.com", "2024-01-10", "2024-01-10", 1, 10.0),
            sale("b@x.com", "2024-01-09", "2024-01-10", 1, 10.0),
            sale("c@x.com", "2024-01-11", "2024-01-10", 1, 10.0),
        ]);
        let cal = UsFederalHolidays;
        let timing = compute(&AnalysisContext::new(&table, &cal));

        assert_eq!(timing.same_day, 1);
        assert_eq!(timing.last_minute, 2);
        assert_eq!(timing.after_show, 1);
        let bucketed: usize = timing.buckets.iter().map(|b| b.totals.orders).sum();
        assert_eq!(bucketed + timing.after_show, timing.total_orders);
    }

    #[test]
    fn test_empty_input_keeps_all_buckets() {
        let table = TicketTable::default();
        let cal = UsFederalHolidays;
        let timing = compute(&AnalysisContext::new(&table, &cal));
        assert_eq!(timing.buckets.len(), 6);
        assert!(timing.buckets.iter().all(|b| b.totals.orders == 0 && b.share.is_none()));
        assert_eq!(timing.avg_lead_days, None);
    }
}
