//! Key names for the shared space
//!
//! Prices are partitioned by node id, alerts by alert id. These names are
//! shared with every other instance talking to the same store, so they must
//! not change.

const PREFIX: &str = "energy:";

/// Latest price per node: `energy:price:{nodeId}` -> plain decimal string
pub fn latest_price(node_id: &str) -> String {
    format!("{PREFIX}price:{node_id}")
}

/// Rolling window per node (sorted set, score = timestamp ms)
pub fn price_window(node_id: &str) -> String {
    format!("{PREFIX}window:{node_id}")
}

/// Active alert payload with TTL
pub fn alert(alert_id: &str) -> String {
    format!("{PREFIX}alert:{alert_id}")
}

/// Alert ids raised for one node
pub fn node_alerts(node_id: &str) -> String {
    format!("{PREFIX}node_alerts:{node_id}")
}

/// Global set of candidate active alert ids
pub fn active_alert_ids() -> String {
    format!("{PREFIX}alerts:active")
}

/// Queue drained by the persistence worker
pub fn alert_history_queue() -> String {
    format!("{PREFIX}alert_history:queue")
}
