//! Damage/adjustment workflow: an accountant reports damaged stock,
//! head office approves or rejects. Resolved rows are retained for
//! audit; approval appends the damage write-off in the same database
//! transaction as the status flip.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        adjustment_request::{self, Entity as AdjustmentRequest},
        stock_request::RequestStatus,
        stock_transaction::{self, TransactionKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{ledger::unwrap_txn_err, on_hand_quantity, stock_requests::Resolution},
};

#[derive(Debug, Clone)]
pub struct NewAdjustmentRequest {
    pub branch_id: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub reason: String,
}

/// Outcome of resolving an adjustment request; the request row survives
/// with its terminal status either way.
#[derive(Debug)]
pub enum AdjustmentOutcome {
    Approved {
        request: adjustment_request::Model,
        damage_transaction: stock_transaction::Model,
    },
    Rejected(adjustment_request::Model),
}

pub struct AdjustmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl AdjustmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Files a damage report. Reports exceeding what is currently on
    /// hand are rejected at submission; approval later re-checks
    /// nothing, so stock may still legitimately go negative if it moved
    /// in between.
    pub async fn submit(
        &self,
        new: NewAdjustmentRequest,
    ) -> Result<adjustment_request::Model, ServiceError> {
        if new.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }
        if new.reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A damage reason is required".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let on_hand = on_hand_quantity(
            db,
            &new.branch_id,
            &new.category,
            &new.sub_category,
            &new.item_name,
        )
        .await?;
        if new.quantity > on_hand {
            return Err(ServiceError::InsufficientStock(format!(
                "Cannot report {} damaged; only {} on hand",
                new.quantity, on_hand
            )));
        }

        let active = adjustment_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(new.branch_id),
            category: Set(new.category),
            sub_category: Set(new.sub_category),
            item_name: Set(new.item_name),
            quantity: Set(new.quantity),
            unit: Set(new.unit),
            reason: Set(new.reason),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            created_at: Set(Utc::now()),
            resolved_at: Set(None),
        };
        let inserted = active.insert(db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::AdjustmentRequestSubmitted(inserted.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(inserted)
    }

    pub async fn list(
        &self,
        branch_id: Option<&str>,
        status: Option<RequestStatus>,
    ) -> Result<Vec<adjustment_request::Model>, ServiceError> {
        let mut query = AdjustmentRequest::find();
        if let Some(branch) = branch_id {
            query = query.filter(adjustment_request::Column::BranchId.eq(branch));
        }
        if let Some(status) = status {
            query = query.filter(adjustment_request::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(adjustment_request::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Resolves a pending report. The status flip is a compare-and-swap
    /// on `pending`, so double resolution conflicts instead of writing
    /// off twice. On approval the damage transaction commits with the
    /// flip or not at all.
    pub async fn resolve(
        &self,
        id: Uuid,
        resolution: Resolution,
        damage_date: NaiveDate,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        let outcome = self
            .db_pool
            .transaction::<_, AdjustmentOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = AdjustmentRequest::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Adjustment request {} not found",
                                id
                            ))
                        })?;

                    let terminal = match resolution {
                        Resolution::Approve => RequestStatus::Approved,
                        Resolution::Reject => RequestStatus::Rejected,
                    };

                    let updated = AdjustmentRequest::update_many()
                        .col_expr(
                            adjustment_request::Column::Status,
                            Expr::value(terminal.as_str()),
                        )
                        .col_expr(
                            adjustment_request::Column::ResolvedAt,
                            Expr::value(Utc::now()),
                        )
                        .filter(adjustment_request::Column::Id.eq(id))
                        .filter(
                            adjustment_request::Column::Status
                                .eq(RequestStatus::Pending.as_str()),
                        )
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if updated.rows_affected == 0 {
                        return Err(ServiceError::ConcurrentModification(id));
                    }

                    let resolved = AdjustmentRequest::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::InternalError(format!(
                                "Adjustment request {} vanished mid-resolution",
                                id
                            ))
                        })?;

                    if resolution == Resolution::Reject {
                        return Ok(AdjustmentOutcome::Rejected(resolved));
                    }

                    let damage = stock_transaction::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        transaction_date: Set(damage_date),
                        created_at: Set(Utc::now()),
                        branch_id: Set(request.branch_id.clone()),
                        kind: Set(TransactionKind::Damage.as_str().to_string()),
                        category: Set(request.category.clone()),
                        sub_category: Set(request.sub_category.clone()),
                        item_name: Set(request.item_name.clone()),
                        quantity: Set(request.quantity),
                        unit: Set(request.unit.clone()),
                        unit_price: Set(None),
                        total_value: Set(None),
                        issued_to: Set(None),
                        issued_to_id: Set(None),
                        source_issue_id: Set(None),
                        reason: Set(Some(request.reason.clone())),
                        bill_number: Set(None),
                        bill_attachment: Set(None),
                    };
                    let inserted = damage.insert(txn).await.map_err(ServiceError::db_error)?;

                    Ok(AdjustmentOutcome::Approved {
                        request: resolved,
                        damage_transaction: inserted,
                    })
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        match &outcome {
            AdjustmentOutcome::Approved {
                damage_transaction, ..
            } => {
                info!(
                    request_id = %id,
                    damage_transaction_id = %damage_transaction.id,
                    "Adjustment request approved"
                );
                self.event_sender
                    .send(Event::AdjustmentRequestApproved {
                        request_id: id,
                        damage_transaction_id: damage_transaction.id,
                    })
                    .await
                    .map_err(ServiceError::EventError)?;
            }
            AdjustmentOutcome::Rejected(_) => {
                info!(request_id = %id, "Adjustment request rejected");
                self.event_sender
                    .send(Event::AdjustmentRequestRejected(id))
                    .await
                    .map_err(ServiceError::EventError)?;
            }
        }

        Ok(outcome)
    }
}
