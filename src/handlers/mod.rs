pub mod adjustment_requests;
pub mod issues;
pub mod return_requests;
pub mod stock;
pub mod stock_requests;
pub mod transactions;

use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        adjustments::AdjustmentService, issues::IssueLifecycleService, ledger::LedgerService,
        return_requests::ReturnRequestService, stock_requests::StockRequestService,
    },
};

/// Aggregates the services used by HTTP handlers. Constructed once at
/// startup with injected storage access; no globals.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: Arc<LedgerService>,
    pub issues: Arc<IssueLifecycleService>,
    pub stock_requests: Arc<StockRequestService>,
    pub adjustments: Arc<AdjustmentService>,
    pub return_requests: Arc<ReturnRequestService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            ledger: Arc::new(LedgerService::new(db_pool.clone(), event_sender.clone())),
            issues: Arc::new(IssueLifecycleService::new(db_pool.clone())),
            stock_requests: Arc::new(StockRequestService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            adjustments: Arc::new(AdjustmentService::new(db_pool.clone(), event_sender.clone())),
            return_requests: Arc::new(ReturnRequestService::new(db_pool, event_sender)),
        }
    }
}
