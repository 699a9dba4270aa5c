use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Domain events emitted after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Ledger events
    TransactionAppended {
        transaction_id: Uuid,
        kind: String,
        branch_id: String,
        quantity: Decimal,
    },
    TransactionUpdated(Uuid),
    TransactionDeleted(Uuid),

    // Issue lifecycle events
    ReturnRecorded {
        issue_transaction_id: Uuid,
        return_transaction_id: Uuid,
        quantity: Decimal,
    },
    ConsumptionRecorded {
        issue_transaction_id: Uuid,
        consumption_log_id: Uuid,
        quantity: Decimal,
    },

    // Stock request workflow events
    StockRequestSubmitted(Uuid),
    StockRequestUpdated(Uuid),
    StockRequestDeleted(Uuid),
    StockRequestApproved {
        request_id: Uuid,
        issue_transaction_id: Uuid,
        forced: bool,
    },
    StockRequestRejected(Uuid),

    // Adjustment (damage) workflow events
    AdjustmentRequestSubmitted(Uuid),
    AdjustmentRequestApproved {
        request_id: Uuid,
        damage_transaction_id: Uuid,
    },
    AdjustmentRequestRejected(Uuid),

    // Return request workflow events
    ReturnRequestSubmitted(Uuid),
    ReturnRequestCompleted {
        request_id: Uuid,
        return_transaction_id: Uuid,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

// Trait for handling events. Handlers implementing this trait process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

// Consumes the event channel and logs each event with structured fields.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::TransactionAppended {
                transaction_id,
                kind,
                branch_id,
                quantity,
            } => {
                info!(
                    %transaction_id,
                    kind,
                    branch_id,
                    %quantity,
                    "Ledger transaction appended"
                );
            }
            Event::TransactionUpdated(id) => {
                info!(transaction_id = %id, "Ledger transaction corrected");
            }
            Event::TransactionDeleted(id) => {
                info!(transaction_id = %id, "Ledger transaction deleted");
            }
            Event::ReturnRecorded {
                issue_transaction_id,
                return_transaction_id,
                quantity,
            } => {
                info!(
                    %issue_transaction_id,
                    %return_transaction_id,
                    %quantity,
                    "Return recorded against issue"
                );
            }
            Event::ConsumptionRecorded {
                issue_transaction_id,
                consumption_log_id,
                quantity,
            } => {
                info!(
                    %issue_transaction_id,
                    %consumption_log_id,
                    %quantity,
                    "Consumption recorded against issue"
                );
            }
            Event::StockRequestApproved {
                request_id,
                issue_transaction_id,
                forced,
            } => {
                info!(
                    %request_id,
                    %issue_transaction_id,
                    forced,
                    "Stock request approved"
                );
            }
            Event::AdjustmentRequestApproved {
                request_id,
                damage_transaction_id,
            } => {
                info!(
                    %request_id,
                    %damage_transaction_id,
                    "Adjustment request approved"
                );
            }
            Event::ReturnRequestCompleted {
                request_id,
                return_transaction_id,
            } => {
                info!(
                    %request_id,
                    %return_transaction_id,
                    "Return request completed"
                );
            }
            other => {
                info!(event = ?other, "Event received");
            }
        }
    }

    info!("Event processing loop stopped");
}
