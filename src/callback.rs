use crate::config::CallbackConfig;
use get_if_addrs::{IfAddr, get_if_addrs};
use log::debug;
use std::net::Ipv4Addr;

/// First candidate that is not loopback and matches no excluded prefix;
/// loopback when nothing qualifies.
pub fn select_host_ip(candidates: &[Ipv4Addr], excluded_prefixes: &[String]) -> Ipv4Addr {
    candidates
        .iter()
        .copied()
        .find(|ip| {
            if ip.is_loopback() {
                return false;
            }
            let text = ip.to_string();
            !excluded_prefixes
                .iter()
                .any(|prefix| text.starts_with(prefix.as_str()))
        })
        .unwrap_or(Ipv4Addr::LOCALHOST)
}

fn host_candidates() -> Vec<Ipv4Addr> {
    match get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .filter(|interface| !interface.is_loopback())
            .filter_map(|interface| match interface.addr {
                IfAddr::V4(v4) => Some(v4.ip),
                IfAddr::V6(_) => None,
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Build the URL the ACS hands out for devices to reach back on.
pub fn callback_url(config: &CallbackConfig) -> String {
    let ip = select_host_ip(&host_candidates(), &config.excluded_prefixes);
    debug!("callback url host {}", ip);
    format!("http://{}:{}/", ip, config.port)
}
