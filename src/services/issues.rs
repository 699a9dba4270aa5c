//! Issue lifecycle tracking: how much of each issue has been returned
//! or consumed, and what remains in the recipient's hands.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        consumption_log::{self, Entity as ConsumptionLog},
        return_request::{self, Entity as ReturnRequest, ReturnRequestStatus},
        stock_transaction::{self, Entity as StockTransaction, TransactionKind},
    },
    errors::ServiceError,
};

/// Lifecycle numbers for one issue transaction.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueStatus {
    pub issue_transaction_id: Uuid,
    pub quantity: Decimal,
    pub returned: Decimal,
    pub consumed: Decimal,
    /// quantity - returned - consumed; the issue is active while positive
    pub remaining: Decimal,
    pub has_pending_return_request: bool,
    /// min(requested, remaining) for the pending return request, if any.
    /// A suggestion for the actor, not an enforced bound below remaining.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_return_quantity: Option<Decimal>,
}

/// An active issue with its lifecycle numbers, for listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActiveIssue {
    pub issue_transaction_id: Uuid,
    pub branch_id: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub unit: String,
    pub issued_to: Option<String>,
    pub issued_to_id: Option<String>,
    pub issued_on: chrono::NaiveDate,
    pub quantity: Decimal,
    pub returned: Decimal,
    pub consumed: Decimal,
    pub remaining: Decimal,
    pub has_pending_return_request: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_return_quantity: Option<Decimal>,
}

/// Sums returned and consumed quantities for an issue. Records linking
/// to ids that do not resolve to an issue contribute zero by
/// construction: the sums are keyed on the issue id itself.
pub(crate) async fn returned_and_consumed<C: ConnectionTrait>(
    conn: &C,
    issue_id: Uuid,
) -> Result<(Decimal, Decimal), ServiceError> {
    let returned = StockTransaction::find()
        .filter(stock_transaction::Column::Kind.eq(TransactionKind::Return.as_str()))
        .filter(stock_transaction::Column::SourceIssueId.eq(issue_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|tx| tx.quantity)
        .sum();

    let consumed = ConsumptionLog::find()
        .filter(consumption_log::Column::IssueTransactionId.eq(issue_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|log| log.quantity_consumed)
        .sum();

    Ok((returned, consumed))
}

pub struct IssueLifecycleService {
    db_pool: Arc<DbPool>,
}

impl IssueLifecycleService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Computes returned/consumed/remaining for one issue.
    pub async fn issue_status(&self, issue_id: Uuid) -> Result<IssueStatus, ServiceError> {
        let db = self.db_pool.as_ref();

        let issue = StockTransaction::find_by_id(issue_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {} not found", issue_id)))?;

        if issue.kind() != Some(TransactionKind::Issue) {
            return Err(ServiceError::InvalidOperation(format!(
                "Transaction {} is not an issue",
                issue_id
            )));
        }

        let (returned, consumed) = returned_and_consumed(db, issue_id).await?;
        let remaining = issue.quantity - returned - consumed;

        let pending_request = ReturnRequest::find()
            .filter(return_request::Column::IssueTransactionId.eq(issue_id))
            .filter(return_request::Column::Status.eq(ReturnRequestStatus::Pending.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        let suggested = pending_request.as_ref().map(|req| {
            req.requested_quantity
                .map_or(remaining, |wanted| wanted.min(remaining))
        });

        Ok(IssueStatus {
            issue_transaction_id: issue_id,
            quantity: issue.quantity,
            returned,
            consumed,
            remaining,
            has_pending_return_request: pending_request.is_some(),
            suggested_return_quantity: suggested,
        })
    }

    /// Lists issues with remaining quantity, optionally scoped to a
    /// branch and/or a recipient employee.
    pub async fn list_active_issues(
        &self,
        branch_id: Option<&str>,
        employee_id: Option<&str>,
    ) -> Result<Vec<ActiveIssue>, ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = StockTransaction::find()
            .filter(stock_transaction::Column::Kind.eq(TransactionKind::Issue.as_str()));
        if let Some(branch) = branch_id {
            query = query.filter(stock_transaction::Column::BranchId.eq(branch));
        }
        if let Some(employee) = employee_id {
            query = query.filter(stock_transaction::Column::IssuedToId.eq(employee));
        }
        let issues = query
            .order_by_desc(stock_transaction::Column::TransactionDate)
            .order_by_desc(stock_transaction::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut active = Vec::new();
        for issue in issues {
            let (returned, consumed) = returned_and_consumed(db, issue.id).await?;
            let remaining = issue.quantity - returned - consumed;
            if remaining <= Decimal::ZERO {
                continue;
            }

            let pending_request = ReturnRequest::find()
                .filter(return_request::Column::IssueTransactionId.eq(issue.id))
                .filter(return_request::Column::Status.eq(ReturnRequestStatus::Pending.as_str()))
                .one(db)
                .await
                .map_err(ServiceError::db_error)?;
            let suggested = pending_request.as_ref().map(|req| {
                req.requested_quantity
                    .map_or(remaining, |wanted| wanted.min(remaining))
            });

            active.push(ActiveIssue {
                issue_transaction_id: issue.id,
                branch_id: issue.branch_id,
                category: issue.category,
                sub_category: issue.sub_category,
                item_name: issue.item_name,
                unit: issue.unit,
                issued_to: issue.issued_to,
                issued_to_id: issue.issued_to_id,
                issued_on: issue.transaction_date,
                quantity: issue.quantity,
                returned,
                consumed,
                remaining,
                has_pending_return_request: pending_request.is_some(),
                suggested_return_quantity: suggested,
            });
        }

        Ok(active)
    }
}
