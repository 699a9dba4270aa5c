use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of ledger events. Stored as strings in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    OpeningStock,
    Purchase,
    Issue,
    Return,
    Damage,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::OpeningStock => "opening_stock",
            TransactionKind::Purchase => "purchase",
            TransactionKind::Issue => "issue",
            TransactionKind::Return => "return",
            TransactionKind::Damage => "damage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "opening_stock" => Some(TransactionKind::OpeningStock),
            "purchase" => Some(TransactionKind::Purchase),
            "issue" => Some(TransactionKind::Issue),
            "return" => Some(TransactionKind::Return),
            "damage" => Some(TransactionKind::Damage),
            _ => None,
        }
    }

    /// Inbound events are the only ones that move the weighted average.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            TransactionKind::OpeningStock | TransactionKind::Purchase
        )
    }
}

/// An immutable ledger event. Deletion and amendment happen only through
/// the privileged correction flows on the ledger service.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub branch_id: String,
    /// Stored as string; convert via `TransactionKind`
    pub kind: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Opening stock / purchase only
    pub unit_price: Option<Decimal>,
    /// quantity x unit_price, fixed at insertion, never recomputed
    pub total_value: Option<Decimal>,
    /// Issue only: recipient display name
    pub issued_to: Option<String>,
    /// Issue only: recipient employee id
    pub issued_to_id: Option<String>,
    /// Return only: id of the original issue being reduced
    pub source_issue_id: Option<Uuid>,
    /// Damage only: write-off reason
    pub reason: Option<String>,
    pub bill_number: Option<String>,
    pub bill_attachment: Option<String>,
}

impl Model {
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::parse(&self.kind)
    }
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
