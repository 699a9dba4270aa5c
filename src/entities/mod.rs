pub mod adjustment_request;
pub mod consumption_log;
pub mod return_request;
pub mod stock_request;
pub mod stock_transaction;
