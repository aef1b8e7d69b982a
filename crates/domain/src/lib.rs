//! stubres domain layer: record types, replies, errors and configuration
//! shared by the wire codec, the transaction engine and the binary.
pub mod config;
pub mod dns_record;
pub mod dns_reply;
pub mod errors;

pub use config::{CliOverrides, Config, ConfigError, LoggingConfig, ResolvConf, ResolverConfig};
pub use dns_record::{DnsClass, RecordType, ResponseCode};
pub use dns_reply::{DnsReply, QueryToken};
pub use errors::{DomainError, WireError};
