pub mod record_type;

pub use record_type::{DnsClass, RecordType, ResponseCode};
