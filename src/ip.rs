use crate::config::ResolverConfig;
use http::HeaderMap;
use log::debug;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

static X_FORWARDED_FOR: &str = "x-forwarded-for";
static X_REAL_IP: &str = "x-real-ip";
static CF_CONNECTING_IP: &str = "cf-connecting-ip";

static LOOPBACK: &str = "127.0.0.1";

fn header_value<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    let raw = headers.get(name)?.to_str().ok()?.trim();
    if raw.is_empty() { None } else { Some(raw) }
}

/// Resolve the originating client address, preferring proxy-supplied headers
/// over the transport peer. The value is passed through unvalidated.
pub fn resolve_client_ip(headers: &HeaderMap, remote_addr: &str) -> String {
    if let Some(forwarded) = header_value(headers, X_FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').next() {
            return first.trim().to_string();
        }
    }

    if let Some(real_ip) = header_value(headers, X_REAL_IP) {
        return real_ip.to_string();
    }

    if let Some(cf_ip) = header_value(headers, CF_CONNECTING_IP) {
        return cf_ip.to_string();
    }

    remote_addr.to_string()
}

fn peer_ip(remote_addr: &str) -> Option<IpAddr> {
    IpAddr::from_str(remote_addr)
        .or_else(|_| SocketAddr::from_str(remote_addr).map(|sa| sa.ip()))
        .ok()
}

fn headers_trusted(remote_addr: &str, config: &ResolverConfig) -> bool {
    if config.trusted_proxies.is_empty() {
        return true;
    }

    peer_ip(remote_addr).is_some_and(|ip| config.trusted_proxies.contains(&ip))
}

/// Session hook: resolve the client address and decide whether it may be
/// applied to device state. `None` leaves the stored address unchanged.
pub fn device_address(
    headers: &HeaderMap,
    remote_addr: &str,
    config: &ResolverConfig,
) -> Option<String> {
    let ip = if headers_trusted(remote_addr, config) {
        resolve_client_ip(headers, remote_addr)
    } else {
        remote_addr.to_string()
    };

    if ip.is_empty() || ip == LOOPBACK {
        return None;
    }

    if config
        .excluded_prefixes
        .iter()
        .any(|prefix| ip.starts_with(prefix.as_str()))
    {
        return None;
    }

    debug!("device address resolved to {}", ip);
    Some(ip)
}
