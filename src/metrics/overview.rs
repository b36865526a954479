//! Headline numbers

use super::{ratio, AnalysisContext, Totals};
use crate::models::Weekday;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_orders: usize,
    pub total_tickets: u64,
    pub total_revenue: f64,
    pub unique_customers: usize,
    pub avg_order_value: Option<f64>,
    pub avg_tickets_per_order: Option<f64>,
    pub orders_by_day: BTreeMap<Weekday, usize>,
}

pub fn compute(ctx: &AnalysisContext<'_>) -> Overview {
    let mut totals = Totals::default();
    let mut customers = HashSet::new();
    let mut orders_by_day = BTreeMap::new();

    for sale in ctx.rows() {
        totals.add(sale);
        if let Some(id) = sale.customer_id.as_deref() {
            customers.insert(id);
        }
        *orders_by_day.entry(sale.show_weekday).or_insert(0) += 1;
    }

    Overview {
        total_orders: totals.orders,
        total_tickets: totals.tickets,
        total_revenue: totals.revenue,
        unique_customers: customers.len(),
        avg_order_value: ratio(totals.revenue, totals.orders as f64),
        avg_tickets_per_order: ratio(totals.tickets as f64, totals.orders as f64),
        orders_by_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::UsFederalHolidays;
    use crate::metrics::test_support::sale;
    use crate::models::TicketTable;

    #[test]
    fn test_overview_totals() {
        let table = TicketTable::from_records(vec![
            sale("a@x.com", "2024-01-01", "2024-01-10", 2, 30.0),
            sale("b@x.com", "2024-01-02", "2024-01-10", 1, 15.0),
            sale("a@x.com", "2024-01-03", "2024-01-13", 3, 45.0),
            sale("", "2024-01-03", "2024-01-13", 1, 0.0),
        ]);
        let cal = UsFederalHolidays;
        let overview = compute(&AnalysisContext::new(&table, &cal));

        assert_eq!(overview.total_orders, 4);
        assert_eq!(overview.total_tickets, 7);
        assert!((overview.total_revenue - 90.0).abs() < 1e-9);
        assert_eq!(overview.unique_customers, 2);
        assert_eq!(overview.avg_order_value, Some(22.5));
        assert_eq!(overview.orders_by_day.get(&Weekday::Wednesday), Some(&2));
        assert_eq!(overview.orders_by_day.get(&Weekday::Saturday), Some(&2));
    }
}
