//! stubres infrastructure: the DNS wire codec, the transaction engine that
//! tracks outstanding lookups, and the UDP transport that drives it.
pub mod dns;
