use envconfig::Envconfig;
use log::warn;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

fn default_user_agent() -> String {
    format!("cwmp-hooks/{}", version())
}

/// Knobs for the session-hook address filter.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Address prefixes never written to device state (container bridges).
    pub excluded_prefixes: Vec<String>,
    /// When non-empty, forwarded headers are honored only for these peers.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec!["172.".to_string()],
            trusted_proxies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallbackConfig {
    /// CWMP connection-request port the devices listen on.
    pub port: u16,
    pub excluded_prefixes: Vec<String>,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            port: 7547,
            excluded_prefixes: vec!["172.".to_string(), "100.".to_string()],
        }
    }
}

#[derive(Envconfig)]
pub struct Env {
    #[envconfig(from = "CONNECTION_REQUEST_TIMEOUT_MS", default = "5000")]
    pub connection_request_timeout_ms: u64,

    #[envconfig(from = "CONNECTION_REQUEST_USER_AGENT")]
    pub connection_request_user_agent: Option<String>,

    #[envconfig(from = "CONNECTION_REQUEST_PORT", default = "7547")]
    pub connection_request_port: u16,

    #[envconfig(from = "CALLBACK_EXCLUDED_PREFIXES", default = "172.,100.")]
    pub callback_excluded_prefixes: String,

    #[envconfig(from = "DEVICE_ADDRESS_EXCLUDED_PREFIXES", default = "172.")]
    pub device_address_excluded_prefixes: String,

    #[envconfig(from = "TRUSTED_PROXIES", default = "")]
    pub trusted_proxies: String,
}

pub fn init() -> anyhow::Result<Env> {
    let config = Env::init_from_env()?;
    Ok(config)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Env {
    pub fn resolver(&self) -> ResolverConfig {
        let trusted_proxies = split_list(&self.trusted_proxies)
            .into_iter()
            .filter_map(|raw| match IpAddr::from_str(&raw) {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!("ignoring unparsable trusted proxy {}", raw);
                    None
                }
            })
            .collect();

        ResolverConfig {
            excluded_prefixes: split_list(&self.device_address_excluded_prefixes),
            trusted_proxies,
        }
    }

    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            timeout: Duration::from_millis(self.connection_request_timeout_ms),
            user_agent: self
                .connection_request_user_agent
                .clone()
                .unwrap_or_else(default_user_agent),
        }
    }

    pub fn callback(&self) -> CallbackConfig {
        CallbackConfig {
            port: self.connection_request_port,
            excluded_prefixes: split_list(&self.callback_excluded_prefixes),
        }
    }
}
