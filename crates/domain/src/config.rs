pub mod errors;
pub mod logging;
pub mod resolv_conf;
pub mod resolver;
pub mod root;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use resolv_conf::{ResolvConf, DEFAULT_NAMESERVER, DNS_PORT, MAX_NAMESERVERS};
pub use resolver::ResolverConfig;
pub use root::{CliOverrides, Config};
