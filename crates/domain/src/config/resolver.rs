use serde::{Deserialize, Serialize};

use super::resolv_conf::ResolvConf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Explicit nameservers; when empty the `resolv_conf` file is consulted.
    #[serde(default)]
    pub nameservers: Vec<String>,

    /// Suffix appended to unqualified forward lookups. Overrides the
    /// `domain` line of the resolv.conf file.
    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: String,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            domain: None,
            resolv_conf: default_resolv_conf(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl ResolverConfig {
    /// Builds the effective nameserver list and default domain.
    ///
    /// Configured nameservers win over the resolv.conf file; the loopback
    /// nameserver is used when neither yields an address.
    pub fn load_nameservers(&self) -> ResolvConf {
        let mut conf = if self.nameservers.is_empty() {
            ResolvConf::load_or_empty(&self.resolv_conf)
        } else {
            let mut conf = ResolvConf::default();
            for server in &self.nameservers {
                conf.add_nameserver(server);
            }
            conf
        };

        if let Some(domain) = self.domain.as_ref().filter(|d| !d.is_empty()) {
            conf.domain = Some(domain.clone());
        }

        conf.with_default_nameserver()
    }
}

fn default_resolv_conf() -> String {
    "/etc/resolv.conf".to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}
