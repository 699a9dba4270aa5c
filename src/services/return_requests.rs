//! Return request workflow. Submission guards against duplicates and
//! dead issues; completion happens only as a side effect of a return
//! transaction landing on the linked issue (see the ledger service).

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        return_request::{self, Entity as ReturnRequest, ReturnRequestStatus},
        stock_transaction::{Entity as StockTransaction, TransactionKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::issues,
};

#[derive(Debug, Clone)]
pub struct NewReturnRequest {
    pub issue_transaction_id: Uuid,
    /// Defaults to the issue's recipient when omitted.
    pub employee_id: Option<String>,
    pub requested_quantity: Option<Decimal>,
}

pub struct ReturnRequestService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ReturnRequestService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn submit(
        &self,
        new: NewReturnRequest,
    ) -> Result<return_request::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let issue = StockTransaction::find_by_id(new.issue_transaction_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Issue {} not found",
                    new.issue_transaction_id
                ))
            })?;
        if issue.kind() != Some(TransactionKind::Issue) {
            return Err(ServiceError::InvalidOperation(format!(
                "Transaction {} is not an issue",
                new.issue_transaction_id
            )));
        }

        let (returned, consumed) = issues::returned_and_consumed(db, issue.id).await?;
        let remaining = issue.quantity - returned - consumed;
        if remaining <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Issue {} has no remaining quantity to return",
                issue.id
            )));
        }

        if let Some(wanted) = new.requested_quantity {
            if wanted <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Requested quantity must be positive".to_string(),
                ));
            }
        }

        let duplicate = ReturnRequest::find()
            .filter(return_request::Column::IssueTransactionId.eq(issue.id))
            .filter(return_request::Column::Status.eq(ReturnRequestStatus::Pending.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A return request for issue {} is already pending",
                issue.id
            )));
        }

        let employee_id = new
            .employee_id
            .or_else(|| issue.issued_to_id.clone())
            .ok_or_else(|| {
                ServiceError::ValidationError("Employee id is required".to_string())
            })?;

        let active = return_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            issue_transaction_id: Set(issue.id),
            branch_id: Set(issue.branch_id.clone()),
            employee_id: Set(employee_id),
            item_name: Set(issue.item_name.clone()),
            requested_quantity: Set(new.requested_quantity),
            status: Set(ReturnRequestStatus::Pending.as_str().to_string()),
            created_at: Set(chrono::Utc::now()),
            completed_at: Set(None),
        };
        let inserted = active.insert(db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::ReturnRequestSubmitted(inserted.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(inserted)
    }

    pub async fn list(
        &self,
        branch_id: Option<&str>,
        employee_id: Option<&str>,
        status: Option<ReturnRequestStatus>,
    ) -> Result<Vec<return_request::Model>, ServiceError> {
        let mut query = ReturnRequest::find();
        if let Some(branch) = branch_id {
            query = query.filter(return_request::Column::BranchId.eq(branch));
        }
        if let Some(employee) = employee_id {
            query = query.filter(return_request::Column::EmployeeId.eq(employee));
        }
        if let Some(status) = status {
            query = query.filter(return_request::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(return_request::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
