use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;
use serde_json::json;

/// Request context stored next to each submitted application.
pub fn extract(headers: &HeaderMap, client_ip: IpAddr) -> serde_json::Value {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };

    json!({
        "ip": client_ip.to_string(),
        "user_agent": header("user-agent"),
        "referer": header("referer"),
    })
}

/// The submitting client's address.
///
/// `X-Forwarded-For` is honoured only when the direct peer is a trusted
/// proxy; the leftmost untrusted hop wins.
pub fn client_ip(headers: &HeaderMap, peer_addr: Option<IpAddr>, trusted_proxies: &[IpNet]) -> IpAddr {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    if trusted_proxies.iter().any(|net| net.contains(&peer)) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            let forwarded = xff
                .split(',')
                .filter_map(|s| s.trim().parse::<IpAddr>().ok())
                .find(|ip| !trusted_proxies.iter().any(|net| net.contains(ip)));
            if let Some(ip) = forwarded {
                return ip;
            }
        }
    }

    peer
}
