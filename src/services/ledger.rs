//! The ledger store boundary: validated appends, privileged corrections,
//! and the lifecycle-aware return/consumption flows.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        consumption_log,
        return_request::{self, Entity as ReturnRequest, ReturnRequestStatus},
        stock_transaction::{self, Entity as StockTransaction, TransactionKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::issues,
};

/// Input for appending a ledger event.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub transaction_date: NaiveDate,
    pub branch_id: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Option<Decimal>,
    pub issued_to: Option<String>,
    pub issued_to_id: Option<String>,
    pub source_issue_id: Option<Uuid>,
    pub reason: Option<String>,
    pub bill_number: Option<String>,
    pub bill_attachment: Option<String>,
}

impl NewTransaction {
    /// Validation rejects malformed input before anything touches the
    /// store. Referential integrity of `source_issue_id` is deliberately
    /// not checked here (linkage tolerance).
    fn validate(&self) -> Result<(), ServiceError> {
        if self.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }
        if self.branch_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Branch id is required".to_string(),
            ));
        }
        if self.item_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Item name is required".to_string(),
            ));
        }

        match self.kind {
            TransactionKind::OpeningStock => {
                if self.unit_price.is_none() {
                    return Err(ServiceError::ValidationError(
                        "Opening stock requires a unit price".to_string(),
                    ));
                }
            }
            TransactionKind::Purchase => {
                if self.unit_price.is_none() {
                    return Err(ServiceError::ValidationError(
                        "Purchase requires a unit price".to_string(),
                    ));
                }
                if self
                    .bill_number
                    .as_deref()
                    .map_or(true, |b| b.trim().is_empty())
                {
                    return Err(ServiceError::ValidationError(
                        "Purchase requires a bill number".to_string(),
                    ));
                }
            }
            TransactionKind::Issue => {
                if self.issued_to.is_none() || self.issued_to_id.is_none() {
                    return Err(ServiceError::ValidationError(
                        "Issue requires a recipient name and employee id".to_string(),
                    ));
                }
            }
            TransactionKind::Return => {
                if self.source_issue_id.is_none() {
                    return Err(ServiceError::ValidationError(
                        "Return requires the source issue id".to_string(),
                    ));
                }
            }
            TransactionKind::Damage => {
                if self.reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
                    return Err(ServiceError::ValidationError(
                        "Damage requires a reason".to_string(),
                    ));
                }
            }
        }
        if let Some(price) = self.unit_price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Unit price must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn into_active_model(self) -> stock_transaction::ActiveModel {
        // total_value is fixed at insertion time and never recomputed
        let total_value = self
            .unit_price
            .filter(|_| self.kind.is_inbound())
            .map(|price| self.quantity * price);
        stock_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_date: Set(self.transaction_date),
            created_at: Set(Utc::now()),
            branch_id: Set(self.branch_id),
            kind: Set(self.kind.as_str().to_string()),
            category: Set(self.category),
            sub_category: Set(self.sub_category),
            item_name: Set(self.item_name),
            quantity: Set(self.quantity),
            unit: Set(self.unit),
            unit_price: Set(self.unit_price.filter(|_| self.kind.is_inbound())),
            total_value: Set(total_value),
            issued_to: Set(self.issued_to),
            issued_to_id: Set(self.issued_to_id),
            source_issue_id: Set(self.source_issue_id),
            reason: Set(self.reason),
            bill_number: Set(self.bill_number),
            bill_attachment: Set(self.bill_attachment),
        }
    }
}

/// Partial update for the privileged correction flow.
#[derive(Debug, Clone, Default)]
pub struct TransactionCorrection {
    pub transaction_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub bill_number: Option<String>,
    pub bill_attachment: Option<String>,
}

pub struct LedgerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LedgerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Appends a ledger event. For returns, any pending return request
    /// linked to the same issue is completed inside the same database
    /// transaction.
    pub async fn append(
        &self,
        new: NewTransaction,
    ) -> Result<stock_transaction::Model, ServiceError> {
        new.validate()?;

        let kind = new.kind;
        let source_issue_id = new.source_issue_id;
        let active = new.into_active_model();

        let (inserted, completed_request) = self
            .db_pool
            .transaction::<_, (stock_transaction::Model, Option<Uuid>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let inserted = active.insert(txn).await.map_err(ServiceError::db_error)?;

                        let mut completed_request = None;
                        if kind == TransactionKind::Return {
                            if let Some(issue_id) = source_issue_id {
                                completed_request =
                                    complete_pending_return_request(txn, issue_id, inserted.id)
                                        .await?;
                            }
                        }

                        Ok((inserted, completed_request))
                    })
                },
            )
            .await
            .map_err(unwrap_txn_err)?;

        info!(
            transaction_id = %inserted.id,
            kind = inserted.kind,
            branch_id = inserted.branch_id,
            "Appended ledger transaction"
        );

        self.event_sender
            .send(Event::TransactionAppended {
                transaction_id: inserted.id,
                kind: inserted.kind.clone(),
                branch_id: inserted.branch_id.clone(),
                quantity: inserted.quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;
        if let Some(request_id) = completed_request {
            self.event_sender
                .send(Event::ReturnRequestCompleted {
                    request_id,
                    return_transaction_id: inserted.id,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(inserted)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<stock_transaction::Model>, ServiceError> {
        StockTransaction::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Lists transactions ordered by `(date, created_at)`, paginated.
    pub async fn list(
        &self,
        branch_id: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_transaction::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = StockTransaction::find();
        if let Some(branch) = branch_id {
            query = query.filter(stock_transaction::Column::BranchId.eq(branch));
        }
        if let Some(from) = from {
            query = query.filter(stock_transaction::Column::TransactionDate.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(stock_transaction::Column::TransactionDate.lte(to));
        }
        let query = query
            .order_by_asc(stock_transaction::Column::TransactionDate)
            .order_by_asc(stock_transaction::Column::CreatedAt);

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let records = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((records, total))
    }

    /// Full snapshot for the valuation fold, optionally branch-scoped.
    pub async fn snapshot(
        &self,
        branch_id: Option<&str>,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        let mut query = StockTransaction::find();
        if let Some(branch) = branch_id {
            query = query.filter(stock_transaction::Column::BranchId.eq(branch));
        }
        query
            .order_by_asc(stock_transaction::Column::TransactionDate)
            .order_by_asc(stock_transaction::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Privileged correction of a recorded transaction. `total_value` is
    /// recomputed only when quantity or unit price change.
    pub async fn correct(
        &self,
        id: Uuid,
        correction: TransactionCorrection,
    ) -> Result<stock_transaction::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let existing = StockTransaction::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {} not found", id)))?;

        if let Some(quantity) = correction.quantity {
            if quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Quantity must be positive".to_string(),
                ));
            }
        }

        let inbound = existing
            .kind()
            .map_or(false, |k| k.is_inbound());
        let quantity = correction.quantity.unwrap_or(existing.quantity);
        let unit_price = correction.unit_price.or(existing.unit_price);

        let mut active: stock_transaction::ActiveModel = existing.into();
        if let Some(date) = correction.transaction_date {
            active.transaction_date = Set(date);
        }
        if let Some(category) = correction.category {
            active.category = Set(category);
        }
        if let Some(sub_category) = correction.sub_category {
            active.sub_category = Set(sub_category);
        }
        if let Some(item_name) = correction.item_name {
            active.item_name = Set(item_name);
        }
        if let Some(q) = correction.quantity {
            active.quantity = Set(q);
        }
        if let Some(unit) = correction.unit {
            active.unit = Set(unit);
        }
        if inbound {
            if let Some(price) = correction.unit_price {
                active.unit_price = Set(Some(price));
            }
            if correction.quantity.is_some() || correction.unit_price.is_some() {
                active.total_value = Set(unit_price.map(|p| quantity * p));
            }
        }
        if let Some(bill_number) = correction.bill_number {
            active.bill_number = Set(Some(bill_number));
        }
        if let Some(bill_attachment) = correction.bill_attachment {
            active.bill_attachment = Set(Some(bill_attachment));
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::TransactionUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Privileged deletion. Ordinary branch operations never call this.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();

        let result = StockTransaction::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Transaction {} not found",
                id
            )));
        }

        self.event_sender
            .send(Event::TransactionDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    /// Records a return against an outstanding issue. Unlike the raw
    /// append path this validates the issue exists and caps the quantity
    /// at the remaining amount; the linked pending return request (if
    /// any) completes in the same database transaction.
    pub async fn record_return(
        &self,
        issue_id: Uuid,
        quantity: Decimal,
        return_date: NaiveDate,
    ) -> Result<stock_transaction::Model, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Return quantity must be positive".to_string(),
            ));
        }

        let (returned, completed_request) = self
            .db_pool
            .transaction::<_, (stock_transaction::Model, Option<Uuid>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let issue = StockTransaction::find_by_id(issue_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!("Issue {} not found", issue_id))
                            })?;
                        if issue.kind() != Some(TransactionKind::Issue) {
                            return Err(ServiceError::InvalidOperation(format!(
                                "Transaction {} is not an issue",
                                issue_id
                            )));
                        }

                        let (already_returned, consumed) =
                            issues::returned_and_consumed(txn, issue_id).await?;
                        let remaining = issue.quantity - already_returned - consumed;
                        if quantity > remaining {
                            return Err(ServiceError::ValidationError(format!(
                                "Return of {} exceeds remaining quantity {}",
                                quantity, remaining
                            )));
                        }

                        let active = stock_transaction::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            transaction_date: Set(return_date),
                            created_at: Set(Utc::now()),
                            branch_id: Set(issue.branch_id.clone()),
                            kind: Set(TransactionKind::Return.as_str().to_string()),
                            category: Set(issue.category.clone()),
                            sub_category: Set(issue.sub_category.clone()),
                            item_name: Set(issue.item_name.clone()),
                            quantity: Set(quantity),
                            unit: Set(issue.unit.clone()),
                            unit_price: Set(None),
                            total_value: Set(None),
                            issued_to: Set(None),
                            issued_to_id: Set(None),
                            source_issue_id: Set(Some(issue_id)),
                            reason: Set(None),
                            bill_number: Set(None),
                            bill_attachment: Set(None),
                        };
                        let inserted =
                            active.insert(txn).await.map_err(ServiceError::db_error)?;

                        let completed_request =
                            complete_pending_return_request(txn, issue_id, inserted.id).await?;

                        Ok((inserted, completed_request))
                    })
                },
            )
            .await
            .map_err(unwrap_txn_err)?;

        info!(
            issue_transaction_id = %issue_id,
            return_transaction_id = %returned.id,
            %quantity,
            "Recorded return"
        );

        self.event_sender
            .send(Event::ReturnRecorded {
                issue_transaction_id: issue_id,
                return_transaction_id: returned.id,
                quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;
        if let Some(request_id) = completed_request {
            self.event_sender
                .send(Event::ReturnRequestCompleted {
                    request_id,
                    return_transaction_id: returned.id,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(returned)
    }

    /// Records partial consumption of an issue by the recipient.
    /// Rejected when it would push consumed + returned past the issued
    /// quantity.
    pub async fn record_consumption(
        &self,
        issue_id: Uuid,
        quantity: Decimal,
        consumed_on: NaiveDate,
        remarks: Option<String>,
    ) -> Result<consumption_log::Model, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Consumed quantity must be positive".to_string(),
            ));
        }

        let log = self
            .db_pool
            .transaction::<_, consumption_log::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let issue = StockTransaction::find_by_id(issue_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Issue {} not found", issue_id))
                        })?;
                    if issue.kind() != Some(TransactionKind::Issue) {
                        return Err(ServiceError::InvalidOperation(format!(
                            "Transaction {} is not an issue",
                            issue_id
                        )));
                    }

                    let (returned, consumed) =
                        issues::returned_and_consumed(txn, issue_id).await?;
                    let remaining = issue.quantity - returned - consumed;
                    if quantity > remaining {
                        return Err(ServiceError::ValidationError(format!(
                            "Consumption of {} exceeds remaining quantity {}",
                            quantity, remaining
                        )));
                    }

                    let active = consumption_log::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        issue_transaction_id: Set(issue_id),
                        branch_id: Set(issue.branch_id.clone()),
                        item_name: Set(issue.item_name.clone()),
                        quantity_consumed: Set(quantity),
                        consumed_on: Set(consumed_on),
                        remarks: Set(remarks),
                        created_at: Set(Utc::now()),
                    };
                    active.insert(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        self.event_sender
            .send(Event::ConsumptionRecorded {
                issue_transaction_id: issue_id,
                consumption_log_id: log.id,
                quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(log)
    }

    /// Lists consumption logs for a branch or a single issue.
    pub async fn list_consumptions(
        &self,
        branch_id: Option<&str>,
        issue_id: Option<Uuid>,
    ) -> Result<Vec<consumption_log::Model>, ServiceError> {
        let mut query = consumption_log::Entity::find();
        if let Some(branch) = branch_id {
            query = query.filter(consumption_log::Column::BranchId.eq(branch));
        }
        if let Some(issue) = issue_id {
            query = query.filter(consumption_log::Column::IssueTransactionId.eq(issue));
        }
        query
            .order_by_desc(consumption_log::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Compare-and-swap completion of a pending return request linked to
/// the issue. Returns the completed request id, if one was pending.
async fn complete_pending_return_request<C: sea_orm::ConnectionTrait>(
    conn: &C,
    issue_id: Uuid,
    _return_transaction_id: Uuid,
) -> Result<Option<Uuid>, ServiceError> {
    let pending = ReturnRequest::find()
        .filter(return_request::Column::IssueTransactionId.eq(issue_id))
        .filter(return_request::Column::Status.eq(ReturnRequestStatus::Pending.as_str()))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let Some(request) = pending else {
        return Ok(None);
    };

    let result = ReturnRequest::update_many()
        .col_expr(
            return_request::Column::Status,
            sea_orm::sea_query::Expr::value(ReturnRequestStatus::Completed.as_str()),
        )
        .col_expr(
            return_request::Column::CompletedAt,
            sea_orm::sea_query::Expr::value(Utc::now()),
        )
        .filter(return_request::Column::Id.eq(request.id))
        .filter(return_request::Column::Status.eq(ReturnRequestStatus::Pending.as_str()))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok((result.rows_affected > 0).then_some(request.id))
}

/// Unwraps sea-orm's closure-transaction error back into ServiceError.
pub(crate) fn unwrap_txn_err(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
