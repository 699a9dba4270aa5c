use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReturnRequestStatus {
    Pending,
    Completed,
}

impl ReturnRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnRequestStatus::Pending => "pending",
            ReturnRequestStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReturnRequestStatus::Pending),
            "completed" => Some(ReturnRequestStatus::Completed),
            _ => None,
        }
    }
}

/// An accountant's demand that an employee return part of an outstanding
/// issue. There is no rejection path: the request completes exclusively
/// when a return transaction is recorded against the linked issue.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "return_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub issue_transaction_id: Uuid,
    pub branch_id: String,
    pub employee_id: String,
    pub item_name: String,
    /// Optional asked-for quantity; fulfillment suggests
    /// min(requested, remaining) but the actor decides.
    pub requested_quantity: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.id {
            active_model.id = Set(Uuid::new_v4());
        }
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
