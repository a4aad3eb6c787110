//! Extension hooks for a TR-069/CWMP Auto Configuration Server: client-IP
//! resolution behind proxies, out-of-band Connection Request dispatch, and
//! callback URL construction. The hosting ACS adapts these to its own
//! calling convention; nothing here owns state between calls.

pub mod callback;
pub mod config;
pub mod connreq;
pub mod error;
pub mod ip;
pub mod logger;

pub use callback::callback_url;
pub use config::{CallbackConfig, DispatchConfig, ResolverConfig};
pub use connreq::{Credentials, Dispatcher};
pub use error::DispatchError;
pub use ip::{device_address, resolve_client_ip};
