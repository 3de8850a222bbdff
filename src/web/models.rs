use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::models::{round2, BanRow, MinutePoint, WindowTotals};

// --- /api/history ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub labels: Vec<String>,
    pub datasets: HistoryDatasets,
    pub summary: HistorySummary,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct HistoryDatasets {
    pub cpu_usage: Vec<f64>,
    pub ram_usage: Vec<f64>,
    pub net_sent: Vec<f64>,
    pub net_recv: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistorySummary {
    pub hours: i64,
    pub avg_cpu: f64,
    pub avg_ram: f64,
    #[serde(rename = "total_net_sent_MB")]
    pub total_net_sent_mb: f64,
    #[serde(rename = "total_net_recv_MB")]
    pub total_net_recv_mb: f64,
}

impl HistoryResponse {
    /// Reshapes per-minute buckets and window totals into the chart payload.
    /// An empty window yields empty arrays and a zero summary, never an error.
    pub fn from_rows(hours: i64, points: Vec<MinutePoint>, totals: WindowTotals) -> Self {
        let mut labels = Vec::with_capacity(points.len());
        let mut datasets = HistoryDatasets::default();
        for point in points {
            labels.push(point.minute);
            datasets.cpu_usage.push(round2(point.avg_cpu));
            datasets.ram_usage.push(round2(point.avg_ram));
            datasets.net_sent.push(round2(point.avg_sent));
            datasets.net_recv.push(round2(point.avg_recv));
        }
        Self {
            labels,
            datasets,
            summary: HistorySummary {
                hours,
                avg_cpu: round2(totals.avg_cpu),
                avg_ram: round2(totals.avg_ram),
                total_net_sent_mb: round2(totals.sum_sent),
                total_net_recv_mb: round2(totals.sum_recv),
            },
        }
    }
}

// --- /api/bans-details ---

#[derive(Debug, Serialize, Deserialize)]
pub struct BansDetailsResponse {
    pub summary: BansSummary,
    /// Minute bucket -> addresses banned within it. Buckets exist only when
    /// at least one ban occurred in that minute; BTreeMap keeps them sorted.
    pub data: BTreeMap<String, MinuteBans>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BansSummary {
    pub hours: i64,
    pub total_ipv4: usize,
    pub total_ipv6: usize,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct MinuteBans {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

impl BansDetailsResponse {
    pub fn from_rows(hours: i64, rows: Vec<BanRow>) -> Self {
        let mut data: BTreeMap<String, MinuteBans> = BTreeMap::new();
        let mut total_ipv4 = 0;
        let mut total_ipv6 = 0;
        for row in rows {
            let entry = data.entry(row.minute).or_default();
            if row.ip_version == 4 {
                entry.ipv4.push(row.ip);
                total_ipv4 += 1;
            } else {
                entry.ipv6.push(row.ip);
                total_ipv6 += 1;
            }
        }
        Self {
            summary: BansSummary {
                hours,
                total_ipv4,
                total_ipv6,
            },
            data,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_window_serializes_to_zeroed_shape() {
        let response = HistoryResponse::from_rows(1, Vec::new(), WindowTotals::default());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "labels": [],
                "datasets": {
                    "cpu_usage": [],
                    "ram_usage": [],
                    "net_sent": [],
                    "net_recv": []
                },
                "summary": {
                    "hours": 1,
                    "avg_cpu": 0.0,
                    "avg_ram": 0.0,
                    "total_net_sent_MB": 0.0,
                    "total_net_recv_MB": 0.0
                }
            })
        );
    }

    #[test]
    fn history_values_are_rounded_to_two_decimals() {
        let points = vec![MinutePoint {
            minute: "2099-01-01 00:00:00".to_string(),
            avg_cpu: 12.3456,
            avg_ram: 40.0,
            avg_sent: 1.234,
            avg_recv: 0.999,
        }];
        let totals = WindowTotals {
            sum_sent: 3.14159,
            sum_recv: 2.71828,
            avg_cpu: 12.3456,
            avg_ram: 40.0,
        };
        let response = HistoryResponse::from_rows(24, points, totals);
        assert_eq!(response.datasets.cpu_usage, vec![12.35]);
        assert_eq!(response.datasets.net_sent, vec![1.23]);
        assert_eq!(response.datasets.net_recv, vec![1.0]);
        assert_eq!(response.summary.total_net_sent_mb, 3.14);
        assert_eq!(response.summary.total_net_recv_mb, 2.72);
    }

    #[test]
    fn bans_are_grouped_per_minute_and_counted_per_family() {
        let rows = vec![
            BanRow {
                minute: "2099-01-01 00:10:00".to_string(),
                ip: "69.231.138.115".to_string(),
                ip_version: 4,
            },
            BanRow {
                minute: "2099-01-01 00:10:00".to_string(),
                ip: "2a00:1450:4003:80c::200e".to_string(),
                ip_version: 6,
            },
            BanRow {
                minute: "2099-01-01 09:41:00".to_string(),
                ip: "10.0.0.1".to_string(),
                ip_version: 4,
            },
        ];
        let response = BansDetailsResponse::from_rows(24, rows);
        assert_eq!(response.summary.total_ipv4, 2);
        assert_eq!(response.summary.total_ipv6, 1);
        assert_eq!(response.data.len(), 2);
        let first = &response.data["2099-01-01 00:10:00"];
        assert_eq!(first.ipv4, vec!["69.231.138.115"]);
        assert_eq!(first.ipv6, vec!["2a00:1450:4003:80c::200e"]);
        let second = &response.data["2099-01-01 09:41:00"];
        assert!(second.ipv6.is_empty());
    }
}
