use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::ResolverConfig;

/// Main configuration structure for stubres
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Nameserver list, default domain and tick cadence
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. stubres.toml in current directory
    /// 3. /etc/stubres/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("stubres.toml").exists() {
            Self::from_file("stubres.toml")?
        } else if std::path::Path::new("/etc/stubres/config.toml").exists() {
            Self::from_file("/etc/stubres/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if !overrides.nameservers.is_empty() {
            self.resolver.nameservers = overrides.nameservers;
        }
        if let Some(domain) = overrides.domain {
            self.resolver.domain = Some(domain);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.tick_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "tick_interval_ms cannot be 0".to_string(),
            ));
        }

        if let Some(domain) = &self.resolver.domain {
            if domain.len() > 253 {
                return Err(ConfigError::Validation(format!(
                    "Default domain '{}' is too long",
                    domain
                )));
            }
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub nameservers: Vec<String>,
    pub domain: Option<String>,
    pub log_level: Option<String>,
}
