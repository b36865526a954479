//! Repeat customers and per-customer profiles

use super::{ratio, AnalysisContext};
use crate::models::{Location, Weekday};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Everything one buyer did within the filtered rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub orders: usize,
    pub tickets: u64,
    pub spent: f64,
    pub first_show: NaiveDate,
    pub last_show: NaiveDate,
    pub distinct_shows: usize,
    pub weekdays: Vec<Weekday>,
    /// Location of the earliest order
    pub location: Location,
}

impl CustomerProfile {
    pub fn is_repeat(&self) -> bool {
        self.distinct_shows > 1
    }

    pub fn lifetime_days(&self) -> i64 {
        (self.last_show - self.first_show).num_days()
    }

    pub fn avg_order_value(&self) -> Option<f64> {
        ratio(self.spent, self.orders as f64)
    }
}

/// Profiles for every identified customer, sorted by id. Anonymous rows are ignored.
pub fn customer_profiles(ctx: &AnalysisContext<'_>) -> Vec<CustomerProfile> {
    struct Acc {
        orders: usize,
        tickets: u64,
        spent: f64,
        shows: BTreeSet<NaiveDate>,
        weekdays: BTreeSet<Weekday>,
        first_seen: chrono::NaiveDateTime,
        location: Location,
    }

    let mut by_customer: HashMap<&str, Acc> = HashMap::new();
    for sale in ctx.rows() {
        let Some(id) = sale.customer_id.as_deref() else {
            continue;
        };
        let acc = by_customer.entry(id).or_insert_with(|| Acc {
            orders: 0,
            tickets: 0,
            spent: 0.0,
            shows: BTreeSet::new(),
            weekdays: BTreeSet::new(),
            first_seen: sale.purchased_at,
            location: sale.location.clone(),
        });
        acc.orders += 1;
        acc.tickets += u64::from(sale.ticket_quantity);
        acc.spent += sale.price;
        acc.shows.insert(sale.show_date);
        acc.weekdays.insert(sale.show_weekday);
        if sale.purchased_at < acc.first_seen {
            acc.first_seen = sale.purchased_at;
            acc.location = sale.location.clone();
        }
    }

    let mut profiles: Vec<CustomerProfile> = by_customer
        .into_iter()
        .filter_map(|(id, acc)| {
            Some(CustomerProfile {
                customer_id: id.to_string(),
                orders: acc.orders,
                tickets: acc.tickets,
                spent: acc.spent,
                first_show: *acc.shows.first()?,
                last_show: *acc.shows.last()?,
                distinct_shows: acc.shows.len(),
                weekdays: acc.weekdays.into_iter().collect(),
                location: acc.location,
            })
        })
        .collect();
    profiles.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
    profiles
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatCustomers {
    pub total_customers: usize,
    pub first_time_customers: usize,
    pub repeat_customers: usize,
    /// repeat / total, `None` without customers
    pub repeat_rate: Option<f64>,
    pub avg_orders_per_customer: Option<f64>,
    pub first_time_revenue: f64,
    pub repeat_revenue: f64,
    pub repeat_revenue_share: Option<f64>,
}

pub fn summarize(profiles: &[CustomerProfile]) -> RepeatCustomers {
    let total_customers = profiles.len();
    let repeat_customers = profiles.iter().filter(|p| p.is_repeat()).count();
    let total_orders: usize = profiles.iter().map(|p| p.orders).sum();

    let (repeat_revenue, first_time_revenue) =
        profiles.iter().fold((0.0, 0.0), |(repeat, first), p| {
            if p.is_repeat() {
                (repeat + p.spent, first)
            } else {
                (repeat, first + p.spent)
            }
        });

    RepeatCustomers {
        total_customers,
        first_time_customers: total_customers - repeat_customers,
        repeat_customers,
        repeat_rate: ratio(repeat_customers as f64, total_customers as f64),
        avg_orders_per_customer: ratio(total_orders as f64, total_customers as f64),
        first_time_revenue,
        repeat_revenue,
        repeat_revenue_share: ratio(repeat_revenue, repeat_revenue + first_time_revenue),
    }
}

pub fn compute(ctx: &AnalysisContext<'_>) -> RepeatCustomers {
    summarize(&customer_profiles(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::UsFederalHolidays;
    use crate::metrics::test_support::{at, sale};
    use crate::models::TicketTable;

    fn table() -> TicketTable {
        TicketTable::from_records(vec![
            // two orders, same show: still first-time
            sale("a@x.com", "2024-01-01", "2024-01-10", 1, 10.0),
            sale("a@x.com", "2024-01-02", "2024-01-10", 1, 10.0),
            // two different shows: repeat
            at(sale("b@x.com", "2024-01-03", "2024-01-12", 2, 30.0), "Arlington", "VA"),
            sale("b@x.com", "2024-01-01", "2024-01-17", 1, 15.0),
            sale("c@x.com", "2024-01-01", "2024-01-17", 4, 60.0),
            sale("", "2024-01-01", "2024-01-17", 4, 60.0),
        ])
    }

    #[test]
    fn test_repeat_rate() {
        let table = table();
        let cal = UsFederalHolidays;
        let summary = compute(&AnalysisContext::new(&table, &cal));

        assert_eq!(summary.total_customers, 3);
        assert_eq!(summary.repeat_customers, 1);
        assert_eq!(summary.first_time_customers, 2);
        let rate = summary.repeat_rate.unwrap();
        assert!((rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&rate));
        assert!((summary.repeat_revenue - 45.0).abs() < 1e-9);
        assert!((summary.first_time_revenue - 80.0).abs() < 1e-9);
        assert_eq!(summary.avg_orders_per_customer, Some(5.0 / 3.0));
    }

    #[test]
    fn test_profiles() {
        let table = table();
        let cal = UsFederalHolidays;
        let profiles = customer_profiles(&AnalysisContext::new(&table, &cal));
        let b = profiles.iter().find(|p| p.customer_id == "b@x.com").unwrap();

        assert_eq!(b.orders, 2);
        assert_eq!(b.distinct_shows, 2);
        assert_eq!(b.lifetime_days(), 5);
        assert_eq!(b.weekdays, vec![Weekday::Wednesday, Weekday::Friday]);
        // earliest purchase was the Wednesday order from DC
        assert_eq!(b.location.state, "DC");
    }

    #[test]
    fn test_no_customers_gives_null_rate() {
        let table = TicketTable::from_records(vec![sale("", "2024-01-01", "2024-01-10", 1, 10.0)]);
        let cal = UsFederalHolidays;
        let summary = compute(&AnalysisContext::new(&table, &cal));
        assert_eq!(summary.total_customers, 0);
        assert_eq!(summary.repeat_rate, None);
    }
}
