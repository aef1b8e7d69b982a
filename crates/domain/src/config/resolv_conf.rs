//! Line-oriented nameserver list loader in the `/etc/resolv.conf` format.
//!
//! Only two options matter to the resolver: `nameserver <address>` and
//! `domain <suffix>`. Everything else in the file is ignored.

use super::errors::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use tracing::{debug, error};

/// Upper bound on configured nameservers; extra entries are dropped.
pub const MAX_NAMESERVERS: usize = 10;

/// Port nameserver entries without an explicit port are contacted on.
pub const DNS_PORT: u16 = 53;

/// Used when no nameserver could be configured at all.
pub const DEFAULT_NAMESERVER: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DNS_PORT);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvConf {
    pub nameservers: Vec<SocketAddr>,
    pub domain: Option<String>,
}

impl ResolvConf {
    pub fn parse(contents: &str) -> Self {
        let mut conf = Self::default();

        for line in contents.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let mut words = line.split_whitespace();
            let (Some(opt), Some(arg)) = (words.next(), words.next()) else {
                continue;
            };

            match opt {
                "domain" => conf.domain = Some(arg.to_string()),
                "nameserver" => {
                    conf.add_nameserver(arg);
                }
                _ => {}
            }
        }

        conf
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Ok(Self::parse(&contents))
    }

    /// Reads `path`, treating an unreadable file as an empty configuration.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::from_file(path.as_ref()) {
            Ok(conf) => conf,
            Err(e) => {
                debug!(error = %e, "No usable resolv.conf, starting with no nameservers");
                Self::default()
            }
        }
    }

    /// Adds a numeric nameserver address, returning whether it was accepted.
    pub fn add_nameserver(&mut self, arg: &str) -> bool {
        debug!(nameserver = %arg, "Adding nameserver");

        if self.nameservers.len() >= MAX_NAMESERVERS {
            error!(nameserver = %arg, "Too many nameservers, ignoring");
            return false;
        }

        match parse_nameserver(arg) {
            Some(addr) => {
                self.nameservers.push(addr);
                true
            }
            None => {
                debug!(nameserver = %arg, "Ignoring non-numeric nameserver address");
                false
            }
        }
    }

    /// Falls back to the loopback nameserver when nothing was configured.
    pub fn with_default_nameserver(mut self) -> Self {
        if self.nameservers.is_empty() {
            self.nameservers.push(DEFAULT_NAMESERVER);
        }
        self
    }
}

/// Accepts `1.2.3.4`, `::1`, `1.2.3.4:5353` and `[::1]:5353`.
pub fn parse_nameserver(arg: &str) -> Option<SocketAddr> {
    if let Ok(ip) = arg.parse::<IpAddr>() {
        return Some(SocketAddr::new(ip, DNS_PORT));
    }
    arg.parse::<SocketAddr>().ok()
}
