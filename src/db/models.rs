use serde::{Deserialize, Serialize};

/// One resource snapshot, keyed by its second-granularity timestamp.
/// Immutable once written; only the retention sweep deletes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: String,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    /// Megabytes sent since the previous successful sample. Never negative.
    pub net_sent_mb: f64,
    /// Megabytes received since the previous successful sample. Never negative.
    pub net_recv_mb: f64,
}

/// One detected block action. Identity key is (timestamp, ip, ip_version);
/// repeated log scans suppress duplicates rather than merging them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanEvent {
    pub timestamp: String,
    pub ip: String,
    pub ip_version: u8,
    pub occurrence_count: u32,
}

/// One per-minute aggregation bucket from the metrics table.
#[derive(Debug, Clone, PartialEq)]
pub struct MinutePoint {
    pub minute: String,
    pub avg_cpu: f64,
    pub avg_ram: f64,
    pub avg_sent: f64,
    pub avg_recv: f64,
}

/// Window-wide totals backing the history summary. Zeroed when the window
/// holds no rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowTotals {
    pub sum_sent: f64,
    pub sum_recv: f64,
    pub avg_cpu: f64,
    pub avg_ram: f64,
}

/// One ban row truncated to its minute bucket, as returned by range queries.
#[derive(Debug, Clone, PartialEq)]
pub struct BanRow {
    pub minute: String,
    pub ip: String,
    pub ip_version: u8,
}

/// Every published numeric value carries two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
