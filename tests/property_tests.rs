//! Property-based tests for the valuation fold.
//!
//! These exercise the pure stock computation over randomly generated
//! ledgers, checking invariants that hold for any event sequence.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use stockroom_api::entities::stock_transaction::{self, TransactionKind};
use stockroom_api::services::valuation::compute_stock;

#[derive(Debug, Clone)]
struct GenTx {
    day_offset: i64,
    kind: TransactionKind,
    quantity: Decimal,
    unit_price: Option<Decimal>,
}

fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::OpeningStock),
        Just(TransactionKind::Purchase),
        Just(TransactionKind::Issue),
        Just(TransactionKind::Return),
        Just(TransactionKind::Damage),
    ]
}

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1u32..10_000).prop_map(Decimal::from)
}

fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0u64..100_000, 0u8..100)
        .prop_map(|(units, cents)| Decimal::new((units * 100 + cents as u64) as i64, 2))
}

fn tx_strategy() -> impl Strategy<Value = GenTx> {
    (0i64..365, kind_strategy(), quantity_strategy(), price_strategy()).prop_map(
        |(day_offset, kind, quantity, price)| GenTx {
            day_offset,
            kind,
            quantity,
            unit_price: kind.is_inbound().then_some(price),
        },
    )
}

fn ledger_strategy() -> impl Strategy<Value = Vec<GenTx>> {
    prop::collection::vec(tx_strategy(), 1..60)
}

fn materialize(generated: &[GenTx]) -> Vec<stock_transaction::Model> {
    let epoch = NaiveDate::from_ymd_opt(2024, 4, 1).expect("epoch date");
    generated
        .iter()
        .enumerate()
        .map(|(seq, gen)| stock_transaction::Model {
            id: Uuid::new_v4(),
            transaction_date: epoch + chrono::Duration::days(gen.day_offset),
            created_at: Utc.timestamp_opt(1_700_000_000 + seq as i64, 0).unwrap(),
            branch_id: "branch-p".to_string(),
            kind: gen.kind.as_str().to_string(),
            category: "Stationery".to_string(),
            sub_category: "Pens".to_string(),
            item_name: "Ball Pen".to_string(),
            quantity: gen.quantity,
            unit: "pcs".to_string(),
            unit_price: gen.unit_price,
            total_value: gen.unit_price.map(|p| gen.quantity * p),
            issued_to: None,
            issued_to_id: None,
            source_issue_id: None,
            reason: None,
            bill_number: None,
            bill_attachment: None,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Quantity is pure conservation: inbound and returns add, issues
    // and damage subtract, regardless of interleaving or pricing.
    #[test]
    fn quantity_is_conserved(generated in ledger_strategy()) {
        let txs = materialize(&generated);
        let lines = compute_stock(&txs, None, None, None);

        let expected: Decimal = generated.iter().map(|gen| match gen.kind {
            TransactionKind::OpeningStock
            | TransactionKind::Purchase
            | TransactionKind::Return => gen.quantity,
            TransactionKind::Issue | TransactionKind::Damage => -gen.quantity,
        }).sum();

        let observed = lines.first().map(|l| l.quantity).unwrap_or(Decimal::ZERO);
        if lines.is_empty() {
            // Suppressed lines had no surviving activity
            prop_assert!(expected <= Decimal::ZERO);
        } else {
            prop_assert_eq!(observed, expected);
        }
    }

    // The average never turns negative and never exceeds the highest
    // inbound unit price seen so far.
    #[test]
    fn average_stays_within_inbound_price_range(generated in ledger_strategy()) {
        // Keep quantities non-negative throughout so the recurrence is
        // a true weighted average at every step.
        let mut running = Decimal::ZERO;
        let safe: Vec<GenTx> = generated.into_iter().filter(|gen| {
            let delta = match gen.kind {
                TransactionKind::OpeningStock
                | TransactionKind::Purchase
                | TransactionKind::Return => gen.quantity,
                TransactionKind::Issue | TransactionKind::Damage => -gen.quantity,
            };
            if running + delta < Decimal::ZERO {
                false
            } else {
                running += delta;
                true
            }
        }).collect();

        // Returns reuse inbound value, so exclude them from the bound;
        // only priced inbound events move the average.
        let txs = materialize(&safe);
        let lines = compute_stock(&txs, None, None, None);

        let max_price = safe
            .iter()
            .filter_map(|gen| gen.unit_price)
            .max()
            .unwrap_or(Decimal::ZERO);

        for line in &lines {
            prop_assert!(line.avg_value >= Decimal::ZERO);
            prop_assert!(
                line.avg_value <= max_price,
                "avg {} exceeded max inbound price {}",
                line.avg_value,
                max_price
            );
        }
    }

    // A hard cutoff at the final date is a no-op; cutting before the
    // first date yields nothing.
    #[test]
    fn period_end_cutoff_brackets(generated in ledger_strategy()) {
        let txs = materialize(&generated);
        let epoch = NaiveDate::from_ymd_opt(2024, 4, 1).expect("epoch date");
        let last = epoch + chrono::Duration::days(365);
        let before = epoch - chrono::Duration::days(1);

        let all = compute_stock(&txs, None, None, None);
        let with_cutoff = compute_stock(&txs, None, None, Some(last));
        prop_assert_eq!(all, with_cutoff);

        let none = compute_stock(&txs, None, None, Some(before));
        prop_assert!(none.is_empty());
    }

    // Folding a branch-filtered ledger equals filtering the full fold.
    #[test]
    fn branch_filter_commutes_with_the_fold(generated in ledger_strategy()) {
        let mut txs = materialize(&generated);
        for (i, tx) in txs.iter_mut().enumerate() {
            if i % 2 == 0 {
                tx.branch_id = "branch-q".to_string();
            }
        }

        let filtered_fold = compute_stock(&txs, Some("branch-q"), None, None);
        let only_branch: Vec<_> = txs
            .iter()
            .filter(|tx| tx.branch_id == "branch-q")
            .cloned()
            .collect();
        let fold_of_filtered = compute_stock(&only_branch, None, None, None);
        prop_assert_eq!(filtered_fold, fold_of_filtered);
    }
}
