//! Financial sanitizer
//!
//! Every stored order row passes through [`Sanitizer::sanitize`] on its way
//! out. Legacy rows may carry subtotals or totals that disagree with their
//! components; those are recomputed and overwritten before anyone sees them.
//!
//! 1. item subtotal: stored `subtotal`, else `price × quantity` (quantity
//!    defaults to 1), else 0 for unreadable items
//! 2. order subtotal = Σ item subtotals, corrected when absent or off by
//!    more than 0.01
//! 3. total = subtotal + tax + delivery_fee + tip − discount (missing
//!    components are 0), corrected the same way
//!
//! Corrections are planned first and applied together, so a row is either
//! fully corrected or untouched. Rows whose items cannot be read, or whose
//! amounts overflow `Decimal`, come back unmodified. Sanitization never fails.

pub mod metrics;

pub use metrics::{InMemoryMetrics, SanitizationCounters, SanitizationMetrics};

use rust_decimal::Decimal;
use serde_json::{Value, json};
use shared::order::money::{money_eq, round_money, to_decimal, to_f64};
use shared::parse;
use std::sync::Arc;

use crate::db::Row;

/// One overwritten amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub old: Option<f64>,
    pub new: f64,
}

/// Corrections to apply to a single row
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SanitizePlan {
    pub subtotal: Option<Correction>,
    pub total: Option<Correction>,
}

impl SanitizePlan {
    pub fn is_empty(&self) -> bool {
        self.subtotal.is_none() && self.total.is_none()
    }
}

const TOTAL_COMPONENTS: [(&str, bool); 4] = [
    ("tax_amount", false),
    ("delivery_fee", false),
    ("tip_amount", false),
    ("discount_amount", true),
];

fn amount(row: &Row, key: &str) -> Decimal {
    parse::number(row.get(key)).map(to_decimal).unwrap_or_default()
}

/// `None` when `price × quantity` does not fit in a `Decimal`
fn item_subtotal(item: &Value) -> Option<Decimal> {
    let Some(obj) = item.as_object() else {
        return Some(Decimal::ZERO);
    };
    if let Some(stored) = parse::number(obj.get("subtotal")) {
        return Some(to_decimal(stored));
    }
    match parse::number(obj.get("price")) {
        Some(price) => {
            let quantity = parse::number(obj.get("quantity")).unwrap_or(1.0);
            to_decimal(price).checked_mul(to_decimal(quantity))
        }
        None => Some(Decimal::ZERO),
    }
}

/// Work out which amounts of a row need correcting.
///
/// `None` when the row's items are present but not a list, or when the
/// amounts are too large to add up.
pub fn plan(row: &Row) -> Option<SanitizePlan> {
    let items: &[Value] = match row.get("order_items") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(_) => return None,
    };

    let computed_subtotal = round_money(
        items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item_subtotal(item)?))?,
    );
    let stored_subtotal = parse::number(row.get("subtotal"));
    let subtotal_ok = stored_subtotal.is_some_and(|s| money_eq(to_decimal(s), computed_subtotal));

    let (subtotal, effective_subtotal) = if subtotal_ok {
        (None, stored_subtotal.map(to_decimal).unwrap_or_default())
    } else {
        let correction = Correction {
            old: stored_subtotal,
            new: to_f64(computed_subtotal),
        };
        (Some(correction), computed_subtotal)
    };

    let computed_total = round_money(TOTAL_COMPONENTS.iter().try_fold(
        effective_subtotal,
        |acc, (key, subtracts)| {
            let value = amount(row, key);
            if *subtracts {
                acc.checked_sub(value)
            } else {
                acc.checked_add(value)
            }
        },
    )?);
    let stored_total = parse::number(row.get("total_amount"));
    let total_ok = stored_total.is_some_and(|t| money_eq(to_decimal(t), computed_total));
    let total = (!total_ok).then(|| Correction {
        old: stored_total,
        new: to_f64(computed_total),
    });

    Some(SanitizePlan { subtotal, total })
}

/// Applies [`plan`]s and reports them to the injected counters
#[derive(Clone)]
pub struct Sanitizer {
    metrics: Arc<dyn SanitizationMetrics>,
}

impl Sanitizer {
    pub fn new(metrics: Arc<dyn SanitizationMetrics>) -> Self {
        Self { metrics }
    }

    pub fn counters(&self) -> SanitizationCounters {
        self.metrics.snapshot()
    }

    pub fn sanitize(&self, mut row: Row) -> Row {
        let Some(plan) = plan(&row) else {
            tracing::debug!(
                order_id = ?row.get("order_id"),
                "Skipping sanitization of row with unreadable amounts"
            );
            return row;
        };
        if plan.is_empty() {
            return row;
        }

        if let Some(c) = plan.subtotal {
            row.insert("subtotal".into(), json!(c.new));
        }
        if let Some(c) = plan.total {
            row.insert("total_amount".into(), json!(c.new));
        }
        self.metrics
            .record(plan.subtotal.is_some(), plan.total.is_some());

        tracing::info!(
            order_id = %parse::text(row.get("order_id")).unwrap_or_default(),
            subtotal_old = ?plan.subtotal.and_then(|c| c.old),
            subtotal_new = ?plan.subtotal.map(|c| c.new),
            total_old = ?plan.total.and_then(|c| c.old),
            total_new = ?plan.total.map(|c| c.new),
            "Sanitized order"
        );
        row
    }

    pub fn sanitize_all(&self, rows: Vec<Row>) -> Vec<Row> {
        rows.into_iter().map(|row| self.sanitize(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn sanitizer() -> (Sanitizer, Arc<InMemoryMetrics>) {
        let metrics = Arc::new(InMemoryMetrics::new());
        (Sanitizer::new(metrics.clone()), metrics)
    }

    #[test]
    fn test_consistent_row_is_untouched() {
        let (sanitizer, metrics) = sanitizer();
        let original = row(json!({
            "order_id": "o-1",
            "order_items": [{"price": 12.5, "quantity": 2, "subtotal": 25.0}],
            "subtotal": 25.0,
            "tax_amount": 2.0,
            "delivery_fee": 3.5,
            "tip_amount": 1.0,
            "discount_amount": 0.0,
            "total_amount": 31.5,
        }));
        let out = sanitizer.sanitize(original.clone());
        assert_eq!(out, original);
        assert_eq!(metrics.snapshot(), SanitizationCounters::default());
    }

    #[test]
    fn test_wrong_total_is_corrected() {
        let (sanitizer, metrics) = sanitizer();
        let out = sanitizer.sanitize(row(json!({
            "order_items": [{"price": 12.5, "quantity": 2, "subtotal": 25.0}],
            "subtotal": 25.0,
            "tax_amount": 2.0,
            "delivery_fee": 3.5,
            "tip_amount": 1.0,
            "discount_amount": 0.0,
            "total_amount": 40.0,
        })));
        assert_eq!(out["total_amount"], json!(31.5));
        assert_eq!(out["subtotal"], json!(25.0));
        assert_eq!(
            metrics.snapshot(),
            SanitizationCounters {
                records_sanitized: 1,
                subtotal_corrections: 0,
                total_corrections: 1,
            }
        );
    }

    #[test]
    fn test_missing_subtotal_recomputed_from_items() {
        let (sanitizer, metrics) = sanitizer();
        let out = sanitizer.sanitize(row(json!({
            "order_items": [
                {"price": 4.5, "quantity": 2},
                {"price": "3.25"},
                "garbage",
                {"item_name": "no price"},
            ],
            "tax_amount": "",
            "total_amount": 12.25,
        })));
        assert_eq!(out["subtotal"], json!(12.25));
        assert_eq!(out["total_amount"], json!(12.25));

        let counters = metrics.snapshot();
        assert_eq!(counters.records_sanitized, 1);
        assert_eq!(counters.subtotal_corrections, 1);
        assert_eq!(counters.total_corrections, 0);
    }

    #[test]
    fn test_subtotal_correction_feeds_total() {
        let plan = plan(&row(json!({
            "order_items": [{"price": 10.0, "quantity": 1, "subtotal": 10.0}],
            "subtotal": 8.0,
            "delivery_fee": 2.0,
            "discount_amount": 1.0,
            "total_amount": 9.0,
        })))
        .unwrap();
        assert_eq!(
            plan.subtotal,
            Some(Correction {
                old: Some(8.0),
                new: 10.0
            })
        );
        assert_eq!(
            plan.total,
            Some(Correction {
                old: Some(9.0),
                new: 11.0
            })
        );
    }

    #[test]
    fn test_within_tolerance_is_not_corrected() {
        let plan = plan(&row(json!({
            "order_items": [{"subtotal": 10.0}],
            "subtotal": 10.01,
            "total_amount": 10.0,
        })))
        .unwrap();
        assert!(plan.subtotal.is_none());
        // total is computed from the stored (accepted) subtotal
        assert!(plan.total.is_none());
    }

    #[test]
    fn test_total_rounds_half_away_from_zero() {
        let plan = plan(&row(json!({
            "order_items": [{"subtotal": 10.0}],
            "subtotal": 10.0,
            "tax_amount": 0.825,
        })))
        .unwrap();
        assert_eq!(plan.total.map(|c| c.new), Some(10.83));
        assert_eq!(plan.total.and_then(|c| c.old), None);
    }

    #[test]
    fn test_unreadable_items_leave_row_unchanged() {
        let (sanitizer, metrics) = sanitizer();
        let original = row(json!({
            "order_items": "not a list",
            "subtotal": 1.0,
            "total_amount": 99.0,
        }));
        assert_eq!(sanitizer.sanitize(original.clone()), original);
        assert_eq!(metrics.snapshot().records_sanitized, 0);
    }

    #[test]
    fn test_overflowing_amounts_leave_row_unchanged() {
        let (sanitizer, metrics) = sanitizer();
        let huge_item = row(json!({
            "order_id": "o-big",
            "order_items": [{"price": 1e20, "quantity": 1e10}],
            "subtotal": 1.0,
            "total_amount": 1.0,
        }));
        assert_eq!(sanitizer.sanitize(huge_item.clone()), huge_item);

        let huge_sum = row(json!({
            "order_items": [{"subtotal": 7e28}, {"subtotal": 7e28}],
            "subtotal": 1.0,
            "total_amount": 1.0,
        }));
        assert!(plan(&huge_sum).is_none());
        assert_eq!(sanitizer.sanitize_all(vec![huge_sum.clone()]), vec![huge_sum]);

        let huge_total = row(json!({
            "order_items": [{"subtotal": 7e28}],
            "subtotal": 7e28,
            "tax_amount": 7e28,
        }));
        assert!(plan(&huge_total).is_none());

        assert_eq!(metrics.snapshot().records_sanitized, 0);
    }

    #[test]
    fn test_empty_order_collapses_to_components() {
        let plan = plan(&row(json!({
            "subtotal": 5.0,
            "delivery_fee": 2.0,
            "total_amount": 7.0,
        })))
        .unwrap();
        assert_eq!(plan.subtotal.map(|c| c.new), Some(0.0));
        assert_eq!(plan.total.map(|c| c.new), Some(2.0));
    }
}
