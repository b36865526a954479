//! Where buyers come from

use super::{ratio, AnalysisContext, Totals};
use crate::models::Location;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationStats {
    pub city: String,
    pub state: String,
    #[serde(flatten)]
    pub totals: Totals,
    pub ticket_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateStats {
    pub state: String,
    #[serde(flatten)]
    pub totals: Totals,
    pub ticket_share: Option<f64>,
}

/// Complete rankings; the ticket counts of `locations` sum to `total_tickets`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geography {
    pub total_tickets: u64,
    pub locations: Vec<LocationStats>,
    pub states: Vec<StateStats>,
}

fn by_tickets_desc(a: &Totals, b: &Totals) -> std::cmp::Ordering {
    b.tickets
        .cmp(&a.tickets)
        .then_with(|| b.orders.cmp(&a.orders))
}

pub fn compute(ctx: &AnalysisContext<'_>) -> Geography {
    let mut locations: HashMap<&Location, Totals> = HashMap::new();
    let mut states: HashMap<&str, Totals> = HashMap::new();
    let mut total = Totals::default();

    for sale in ctx.rows() {
        total.add(sale);
        locations.entry(&sale.location).or_default().add(sale);
        states.entry(sale.location.state.as_str()).or_default().add(sale);
    }

    let share = |tickets: u64| ratio(tickets as f64, total.tickets as f64);

    let mut locations: Vec<LocationStats> = locations
        .into_iter()
        .map(|(loc, totals)| LocationStats {
            city: loc.city.clone(),
            state: loc.state.clone(),
            totals,
            ticket_share: share(totals.tickets),
        })
        .collect();
    locations.sort_by(|a, b| {
        by_tickets_desc(&a.totals, &b.totals)
            .then_with(|| a.state.cmp(&b.state))
            .then_with(|| a.city.cmp(&b.city))
    });

    let mut states: Vec<StateStats> = states
        .into_iter()
        .map(|(state, totals)| StateStats {
            state: state.to_string(),
            totals,
            ticket_share: share(totals.tickets),
        })
        .collect();
    states.sort_by(|a, b| by_tickets_desc(&a.totals, &b.totals).then_with(|| a.state.cmp(&b.state)));

    Geography {
        total_tickets: total.tickets,
        locations,
        states,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::UsFederalHolidays;
    use crate::metrics::test_support::{at, sale};
    use crate::models::TicketTable;

    #[test]
    fn test_ranking_and_ticket_sum() {
        let table = TicketTable::from_records(vec![
            sale("a@x.com", "2024-01-01", "2024-01-10", 2, 30.0),
            at(sale("b@x.com", "2024-01-01", "2024-01-10", 3, 45.0), "Arlington", "VA"),
            at(sale("c@x.com", "2024-01-01", "2024-01-10", 3, 45.0), "Bethesda", "MD"),
            at(sale("d@x.com", "2024-01-01", "2024-01-10", 1, 15.0), "Alexandria", "VA"),
        ]);
        let cal = UsFederalHolidays;
        let geo = compute(&AnalysisContext::new(&table, &cal));

        let sum: u64 = geo.locations.iter().map(|l| l.totals.tickets).sum();
        assert_eq!(sum, geo.total_tickets);
        assert_eq!(geo.total_tickets, 9);

        // ties on tickets and orders fall back to state then city
        let order: Vec<&str> = geo.locations.iter().map(|l| l.city.as_str()).collect();
        assert_eq!(order, vec!["Bethesda", "Arlington", "Washington", "Alexandria"]);

        assert_eq!(geo.states[0].state, "VA");
        assert_eq!(geo.states[0].totals.tickets, 4);
        assert_eq!(geo.states[0].totals.orders, 2);
    }
}
