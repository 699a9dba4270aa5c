//! Stock request workflow: employees file demands, an accountant
//! resolves them. Approval appends the issue transaction and removes
//! the request in one database transaction; rejection just removes it.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        stock_request::{self, Entity as StockRequest, RequestStatus},
        stock_transaction::{self, TransactionKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{ledger::unwrap_txn_err, on_hand_quantity},
};

#[derive(Debug, Clone)]
pub struct NewStockRequest {
    pub branch_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
}

/// Fields the requester may change while the request is pending.
#[derive(Debug, Clone, Default)]
pub struct StockRequestEdit {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Approve,
    Reject,
}

/// Outcome of resolving a stock request. The request row is gone either
/// way; approval carries the issue transaction it produced.
#[derive(Debug)]
pub enum StockRequestOutcome {
    Approved(stock_transaction::Model),
    Rejected,
}

pub struct StockRequestService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl StockRequestService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn submit(
        &self,
        new: NewStockRequest,
    ) -> Result<stock_request::Model, ServiceError> {
        if new.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }
        if new.item_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Item name is required".to_string(),
            ));
        }

        let active = stock_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(new.branch_id),
            employee_id: Set(new.employee_id),
            employee_name: Set(new.employee_name),
            category: Set(new.category),
            sub_category: Set(new.sub_category),
            item_name: Set(new.item_name),
            quantity: Set(new.quantity),
            unit: Set(new.unit),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        let inserted = active
            .insert(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::StockRequestSubmitted(inserted.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(inserted)
    }

    pub async fn list(
        &self,
        branch_id: Option<&str>,
        employee_id: Option<&str>,
    ) -> Result<Vec<stock_request::Model>, ServiceError> {
        let mut query = StockRequest::find();
        if let Some(branch) = branch_id {
            query = query.filter(stock_request::Column::BranchId.eq(branch));
        }
        if let Some(employee) = employee_id {
            query = query.filter(stock_request::Column::EmployeeId.eq(employee));
        }
        query
            .order_by_desc(stock_request::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Edit a pending request. There is nothing else to edit: resolved
    /// rows no longer exist.
    pub async fn edit(
        &self,
        id: Uuid,
        edit: StockRequestEdit,
    ) -> Result<stock_request::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let existing = StockRequest::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock request {} not found", id)))?;

        if let Some(quantity) = edit.quantity {
            if quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Quantity must be positive".to_string(),
                ));
            }
        }

        let mut active: stock_request::ActiveModel = existing.into();
        if let Some(category) = edit.category {
            active.category = Set(category);
        }
        if let Some(sub_category) = edit.sub_category {
            active.sub_category = Set(sub_category);
        }
        if let Some(item_name) = edit.item_name {
            active.item_name = Set(item_name);
        }
        if let Some(quantity) = edit.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(unit) = edit.unit {
            active.unit = Set(unit);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::StockRequestUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Withdraw a pending request.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = StockRequest::delete_by_id(id)
            .exec(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Stock request {} not found",
                id
            )));
        }

        self.event_sender
            .send(Event::StockRequestDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    /// Resolves a pending request. The delete of the pending row is a
    /// compare-and-swap: a second concurrent resolution finds zero rows
    /// and fails with a conflict instead of issuing twice. On approval,
    /// availability is re-checked at resolution time; `force` lets the
    /// actor issue into negative stock anyway.
    pub async fn resolve(
        &self,
        id: Uuid,
        resolution: Resolution,
        issue_date: NaiveDate,
        override_item: Option<String>,
        override_quantity: Option<Decimal>,
        force: bool,
    ) -> Result<StockRequestOutcome, ServiceError> {
        if let Some(quantity) = override_quantity {
            if quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Override quantity must be positive".to_string(),
                ));
            }
        }

        let outcome = self
            .db_pool
            .transaction::<_, StockRequestOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = StockRequest::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Stock request {} not found", id))
                        })?;

                    // CAS on status: the loser of a double-resolve race
                    // deletes nothing and gets a conflict.
                    let deleted = StockRequest::delete_many()
                        .filter(stock_request::Column::Id.eq(id))
                        .filter(
                            stock_request::Column::Status.eq(RequestStatus::Pending.as_str()),
                        )
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if deleted.rows_affected == 0 {
                        return Err(ServiceError::ConcurrentModification(id));
                    }

                    if resolution == Resolution::Reject {
                        return Ok(StockRequestOutcome::Rejected);
                    }

                    let item_name = override_item.unwrap_or_else(|| request.item_name.clone());
                    let quantity = override_quantity.unwrap_or(request.quantity);

                    let on_hand = on_hand_quantity(
                        txn,
                        &request.branch_id,
                        &request.category,
                        &request.sub_category,
                        &item_name,
                    )
                    .await?;
                    if on_hand < quantity {
                        if !force {
                            return Err(ServiceError::InsufficientStock(format!(
                                "Requested {} but only {} on hand; resubmit with force to issue anyway",
                                quantity, on_hand
                            )));
                        }
                        warn!(
                            request_id = %id,
                            %on_hand,
                            %quantity,
                            "Force-approving stock request beyond available stock"
                        );
                    }

                    let issue = stock_transaction::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        transaction_date: Set(issue_date),
                        created_at: Set(Utc::now()),
                        branch_id: Set(request.branch_id.clone()),
                        kind: Set(TransactionKind::Issue.as_str().to_string()),
                        category: Set(request.category.clone()),
                        sub_category: Set(request.sub_category.clone()),
                        item_name: Set(item_name),
                        quantity: Set(quantity),
                        unit: Set(request.unit.clone()),
                        unit_price: Set(None),
                        total_value: Set(None),
                        issued_to: Set(Some(request.employee_name.clone())),
                        issued_to_id: Set(Some(request.employee_id.clone())),
                        source_issue_id: Set(None),
                        reason: Set(None),
                        bill_number: Set(None),
                        bill_attachment: Set(None),
                    };
                    let inserted = issue.insert(txn).await.map_err(ServiceError::db_error)?;

                    Ok(StockRequestOutcome::Approved(inserted))
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        match &outcome {
            StockRequestOutcome::Approved(issue) => {
                info!(request_id = %id, issue_transaction_id = %issue.id, "Stock request approved");
                self.event_sender
                    .send(Event::StockRequestApproved {
                        request_id: id,
                        issue_transaction_id: issue.id,
                        forced: force,
                    })
                    .await
                    .map_err(ServiceError::EventError)?;
            }
            StockRequestOutcome::Rejected => {
                info!(request_id = %id, "Stock request rejected");
                self.event_sender
                    .send(Event::StockRequestRejected(id))
                    .await
                    .map_err(ServiceError::EventError)?;
            }
        }

        Ok(outcome)
    }
}
