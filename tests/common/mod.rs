// Shared test helpers

use collector::config::AppConfig;
use collector::models::{MetricSample, ServerId};

/// Config pointing at a simulated backend, with test-friendly tuning.
pub fn agent_config(base_url: &str, interval_secs: u64, attempts: u32, delay_secs: u64) -> AppConfig {
    let toml = format!(
        r#"
[backend]
url = "{base_url}"
register_endpoint = "/api/servers/register"
metrics_endpoint = "/api/metrics"

[server]
name = "test-host"
hostname = "test-host"
ip_address = "192.0.2.10"
os_type = "Linux"

[collection]
interval_seconds = {interval_secs}
retry_attempts = {attempts}
retry_delay_seconds = {delay_secs}
"#
    );
    AppConfig::load_from_str(&toml).expect("valid test config")
}

pub fn sample_fixture(server_id: i64) -> MetricSample {
    MetricSample {
        server_id: ServerId(server_id),
        cpu_percent: 12.34,
        ram_percent: 55.5,
        ram_used_mb: 4444.44,
        ram_total_mb: 8000.0,
        disk_percent: 70.0,
        disk_used_gb: 70.0,
        disk_total_gb: 100.0,
        network_sent_mb: 123.45,
        network_recv_mb: 678.9,
    }
}
