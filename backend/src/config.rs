//! Form host configuration.
//!
//! Read from the environment (after loading `.env` if present). The
//! processing pipeline itself takes no configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::api::logs::log_warning;

pub const ENV_HOST: &str = "PERCEPCIONES_HOST";
pub const ENV_PORT: &str = "PERCEPCIONES_PORT";
pub const ENV_MAX_UPLOAD_MB: &str = "PERCEPCIONES_MAX_UPLOAD_MB";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_UPLOAD_MB: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. Invalid values fall back to
    /// defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = parse_var(&lookup, ENV_HOST).unwrap_or(defaults.host);
        let port = parse_var(&lookup, ENV_PORT).unwrap_or(defaults.port);
        let max_upload_bytes = parse_var::<usize, _>(&lookup, ENV_MAX_UPLOAD_MB)
            .filter(|mb| *mb > 0)
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(defaults.max_upload_bytes);

        Self {
            host,
            port,
            max_upload_bytes,
        }
    }

    /// Override the port (CLI flag wins over the environment).
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log_warning(format!("Ignoring invalid {}={:?}, using default", key, raw));
            None
        }
    }
}
