//! Payment methods and tickets per order

use super::{ratio, AnalysisContext, Totals};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodShare {
    pub method: String,
    #[serde(flatten)]
    pub totals: Totals,
    pub order_share: Option<f64>,
    pub revenue_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityShare {
    pub quantity: u32,
    #[serde(flatten)]
    pub totals: Totals,
    pub order_share: Option<f64>,
    pub revenue_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPatterns {
    pub total_orders: usize,
    pub total_revenue: f64,
    /// Most orders first
    pub by_method: Vec<MethodShare>,
    /// Ascending quantity
    pub by_quantity: Vec<QuantityShare>,
    pub free_order_rate: Option<f64>,
}

pub fn compute(ctx: &AnalysisContext<'_>) -> PaymentPatterns {
    let mut total = Totals::default();
    let mut methods: HashMap<&str, Totals> = HashMap::new();
    let mut quantities: BTreeMap<u32, Totals> = BTreeMap::new();
    let mut free_orders = 0usize;

    for sale in ctx.rows() {
        total.add(sale);
        methods.entry(sale.payment_method.as_str()).or_default().add(sale);
        quantities.entry(sale.ticket_quantity).or_default().add(sale);
        if sale.is_free() {
            free_orders += 1;
        }
    }

    let order_share = |t: &Totals| ratio(t.orders as f64, total.orders as f64);
    let revenue_share = |t: &Totals| ratio(t.revenue, total.revenue);

    let mut by_method: Vec<MethodShare> = methods
        .into_iter()
        .map(|(method, totals)| MethodShare {
            method: method.to_string(),
            order_share: order_share(&totals),
            revenue_share: revenue_share(&totals),
            totals,
        })
        .collect();
    by_method.sort_by(|a, b| {
        b.totals
            .orders
            .cmp(&a.totals.orders)
            .then_with(|| a.method.cmp(&b.method))
    });

    let by_quantity = quantities
        .into_iter()
        .map(|(quantity, totals)| QuantityShare {
            quantity,
            order_share: order_share(&totals),
            revenue_share: revenue_share(&totals),
            totals,
        })
        .collect();

    PaymentPatterns {
        total_orders: total.orders,
        total_revenue: total.revenue,
        by_method,
        by_quantity,
        free_order_rate: ratio(free_orders as f64, total.orders as f64),
    }
}
