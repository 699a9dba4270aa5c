// Pure computation
pub mod valuation;

// Ledger boundary and lifecycle tracking
pub mod issues;
pub mod ledger;

// Request workflows
pub mod adjustments;
pub mod return_requests;
pub mod stock_requests;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::{
    entities::stock_transaction::{self, Entity as StockTransaction, TransactionKind},
    errors::ServiceError,
};

/// On-hand quantity for one stock-line key, folded from the ledger.
/// Used by the workflow services for availability checks; callable on a
/// live transaction so the check and the write see the same snapshot.
pub(crate) async fn on_hand_quantity<C: ConnectionTrait>(
    conn: &C,
    branch_id: &str,
    category: &str,
    sub_category: &str,
    item_name: &str,
) -> Result<Decimal, ServiceError> {
    let transactions = StockTransaction::find()
        .filter(stock_transaction::Column::BranchId.eq(branch_id))
        .filter(stock_transaction::Column::Category.eq(category))
        .filter(stock_transaction::Column::SubCategory.eq(sub_category))
        .filter(stock_transaction::Column::ItemName.eq(item_name))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut on_hand = Decimal::ZERO;
    for tx in transactions {
        match tx.kind() {
            Some(TransactionKind::OpeningStock)
            | Some(TransactionKind::Purchase)
            | Some(TransactionKind::Return) => on_hand += tx.quantity,
            Some(TransactionKind::Issue) | Some(TransactionKind::Damage) => {
                on_hand -= tx.quantity
            }
            None => {}
        }
    }
    Ok(on_hand)
}
