//! Metrics collection.
//!
//! # Metrics
//! - `lending_operations_total` (counter): operations by name and outcome
//! - `lending_transactions_total` (counter): submitted transactions by step and status
//! - `lending_rpc_failures_total` (counter): failed RPC attempts by method
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! these calls are no-ops.

use metrics::counter;

/// Record the outcome of a lending operation (`ok` or a failure kind label).
pub fn record_operation(operation: &'static str, outcome: &'static str) {
    counter!("lending_operations_total", "operation" => operation, "outcome" => outcome).increment(1);
}

/// Record a transaction reaching a terminal status.
pub fn record_transaction(step: &'static str, status: &'static str) {
    counter!("lending_transactions_total", "step" => step, "status" => status).increment(1);
}

/// Record a failed RPC attempt against one provider.
pub fn record_rpc_failure(method: &'static str) {
    counter!("lending_rpc_failures_total", "method" => method).increment(1);
}
