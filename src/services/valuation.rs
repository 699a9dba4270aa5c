//! Weighted-average valuation over the transaction log.
//!
//! Pure and synchronous: every query folds a fresh snapshot of the
//! ledger, there is no incremental stock-line state anywhere. Average
//! unit value moves only on inbound events (opening stock, purchase);
//! issues, returns and damage leave it untouched. This is
//! moving-average-on-receipt costing, not FIFO/LIFO.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::stock_transaction::{self, TransactionKind};

/// Derived view of one stock line. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockLine {
    pub branch_id: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub unit: String,
    /// Running on-hand quantity up to the end of the period. May be
    /// negative: issuing beyond available stock is recorded, not
    /// rejected, and surfaces here.
    pub quantity: Decimal,
    /// Weighted-average unit value across all inbound events.
    pub avg_value: Decimal,
    /// Inbound quantity dated within the period window.
    pub total_purchased: Decimal,
    /// Net issued quantity (issues minus returns) within the window.
    /// Damage never counts here.
    pub total_issued: Decimal,
}

impl StockLine {
    fn new(tx: &stock_transaction::Model) -> Self {
        Self {
            branch_id: tx.branch_id.clone(),
            category: tx.category.clone(),
            sub_category: tx.sub_category.clone(),
            item_name: tx.item_name.clone(),
            unit: tx.unit.clone(),
            quantity: Decimal::ZERO,
            avg_value: Decimal::ZERO,
            total_purchased: Decimal::ZERO,
            total_issued: Decimal::ZERO,
        }
    }

    /// Current value of the line at the weighted-average unit cost.
    pub fn total_value(&self) -> Decimal {
        self.quantity * self.avg_value
    }
}

/// Computes one [`StockLine`] per (branch, category, sub-category, item)
/// key with any activity up to `period_end`.
///
/// Transactions dated after `period_end` are excluded entirely; the
/// result is "stock as of end of period". `period_start` scopes only the
/// reporting totals (`total_purchased` / `total_issued`), never the
/// running quantity, which accumulates from the beginning of the ledger.
///
/// Lines with zero net activity (`quantity <= 0` and both period totals
/// zero) are suppressed from the output.
pub fn compute_stock(
    transactions: &[stock_transaction::Model],
    branch_id: Option<&str>,
    period_start: Option<NaiveDate>,
    period_end: Option<NaiveDate>,
) -> Vec<StockLine> {
    let mut ordered: Vec<&stock_transaction::Model> = transactions
        .iter()
        .filter(|tx| branch_id.map_or(true, |b| tx.branch_id == b))
        .filter(|tx| period_end.map_or(true, |end| tx.transaction_date <= end))
        .collect();
    ordered.sort_by(|a, b| {
        (a.transaction_date, a.created_at).cmp(&(b.transaction_date, b.created_at))
    });

    let mut lines: BTreeMap<(String, String, String, String), StockLine> = BTreeMap::new();

    for tx in ordered {
        let Some(kind) = tx.kind() else {
            // Unknown kinds in the log are skipped rather than corrupting totals
            continue;
        };

        let key = (
            tx.branch_id.clone(),
            tx.category.clone(),
            tx.sub_category.clone(),
            tx.item_name.clone(),
        );
        let line = lines.entry(key).or_insert_with(|| StockLine::new(tx));

        let in_period = period_start.map_or(true, |start| tx.transaction_date >= start)
            && period_end.map_or(true, |end| tx.transaction_date <= end);

        match kind {
            TransactionKind::OpeningStock | TransactionKind::Purchase => {
                let total_old_value = line.quantity * line.avg_value;
                let total_new_value = tx.quantity * tx.unit_price.unwrap_or(Decimal::ZERO);
                line.quantity += tx.quantity;
                if in_period {
                    line.total_purchased += tx.quantity;
                }
                // Guard the zero-quantity case; the average stays put
                if line.quantity > Decimal::ZERO {
                    line.avg_value = (total_old_value + total_new_value) / line.quantity;
                }
            }
            TransactionKind::Issue => {
                line.quantity -= tx.quantity;
                if in_period {
                    line.total_issued += tx.quantity;
                }
            }
            TransactionKind::Return => {
                line.quantity += tx.quantity;
                // Netting against the issue total keeps "net issued" honest
                if in_period {
                    line.total_issued -= tx.quantity;
                }
            }
            TransactionKind::Damage => {
                // A write-off: quantity drops, consumption metrics do not move
                line.quantity -= tx.quantity;
            }
        }
    }

    lines
        .into_values()
        .filter(|line| {
            line.quantity > Decimal::ZERO
                || line.total_issued != Decimal::ZERO
                || line.total_purchased != Decimal::ZERO
        })
        .collect()
}
