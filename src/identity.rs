// Host identity resolution; "auto" fields are substituted with live-detected
// values. Always produces a complete Identity, never errors.

use std::net::UdpSocket;

use sysinfo::System;
use tracing::debug;

use crate::config::ServerConfig;
use crate::models::Identity;

/// Sentinel marking a field for live detection.
pub const AUTO: &str = "auto";

/// Well-known public address used only to force OS route selection; never
/// actually contacted (connected UDP sends nothing).
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

const LOOPBACK: &str = "127.0.0.1";

pub fn resolve(server: &ServerConfig) -> Identity {
    let hostname = if server.hostname == AUTO {
        detect_hostname()
    } else {
        server.hostname.clone()
    };
    let ip_address = if server.ip_address == AUTO {
        detect_ip()
    } else {
        server.ip_address.clone()
    };
    let os_type = if server.os_type == AUTO {
        detect_os()
    } else {
        server.os_type.clone()
    };
    let name = match &server.name {
        Some(n) if !n.is_empty() => n.clone(),
        _ => format!("Server-{hostname}"),
    };

    Identity {
        name,
        hostname,
        ip_address,
        os_type,
    }
}

fn detect_hostname() -> String {
    System::host_name().unwrap_or_else(|| "localhost".into())
}

/// Outbound-routed local address, read back from a connected UDP socket.
/// Degrades silently to loopback when no route is available.
fn detect_ip() -> String {
    let detected = UdpSocket::bind("0.0.0.0:0").and_then(|socket| {
        socket.connect(ROUTE_PROBE_ADDR)?;
        socket.local_addr()
    });
    match detected {
        Ok(addr) => addr.ip().to_string(),
        Err(e) => {
            debug!(error = %e, "IP auto-detection failed, falling back to loopback");
            LOOPBACK.into()
        }
    }
}

fn detect_os() -> String {
    System::name().unwrap_or_else(|| std::env::consts::OS.into())
}
