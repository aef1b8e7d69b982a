use std::fmt;
use std::net::IpAddr;

/// Successful outcome of a lookup: the resolved name and the address
/// confirming it.
///
/// For forward lookups `hostname` is the (possibly domain-qualified) name that
/// was queried; for reverse lookups it is the name found in the PTR record,
/// confirmed by a forward lookup that returned `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsReply {
    pub hostname: String,
    pub address: IpAddr,
}

impl DnsReply {
    pub fn new(hostname: impl Into<String>, address: IpAddr) -> Self {
        Self {
            hostname: hostname.into(),
            address,
        }
    }
}

impl fmt::Display for DnsReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.hostname, self.address)
    }
}

/// Opaque caller handle attached to every submitted lookup.
///
/// The engine never interprets it; it only compares tokens when the caller
/// cancels its outstanding lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryToken(pub u64);

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
