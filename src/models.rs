// Wire models for the backend contract

use serde::{Deserialize, Serialize};

/// Host identity sent at registration. Resolved fresh from live OS/network
/// state; not cached beyond the registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub hostname: String,
    pub ip_address: String,
    pub os_type: String,
}

/// Backend-assigned identifier, required on every metric submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub i64);

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One point-in-time metric record. Fractional fields are rounded to 2
/// decimals at construction; network counters are cumulative since boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub server_id: ServerId,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub ram_used_mb: f64,
    pub ram_total_mb: f64,
    pub disk_percent: f64,
    pub disk_used_gb: f64,
    pub disk_total_gb: f64,
    pub network_sent_mb: f64,
    pub network_recv_mb: f64,
}

/// Response envelope shared by the registration and metrics endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Registration id from the `data` payload, when present.
    pub fn server_id(&self) -> Option<ServerId> {
        self.data.as_ref()?.get("id")?.as_i64().map(ServerId)
    }
}

/// Round to 2 decimal places, matching the wire precision of every
/// fractional metric field.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
