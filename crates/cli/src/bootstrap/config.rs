use stubres_domain::{CliOverrides, Config};
use tracing::debug;

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    debug!(
        nameservers = config.resolver.nameservers.len(),
        resolv_conf = %config.resolver.resolv_conf,
        tick_interval_ms = config.resolver.tick_interval_ms,
        "Configuration loaded"
    );
    Ok(config)
}
