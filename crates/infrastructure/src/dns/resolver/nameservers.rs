//! Configured nameservers with per-server health and the rotation used to
//! pick a destination for each datagram.

use crate::dns::transport::DatagramSink;
use std::net::SocketAddr;
use stubres_domain::config::MAX_NAMESERVERS;
use tracing::{debug, error, warn};

/// How often (in sends) a server with `timeouts` consecutive timeouts is
/// still tried.
pub fn retry_frequency(timeouts: u32) -> u64 {
    match timeouts {
        1 => 3,
        2 => 9,
        3 => 27,
        4 => 81,
        _ => 243,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameServerStats {
    pub address: SocketAddr,
    pub consecutive_timeouts: u32,
}

#[derive(Debug, Clone)]
struct NameServer {
    address: SocketAddr,
    consecutive_timeouts: u32,
}

#[derive(Debug, Clone, Default)]
pub struct NameServerSet {
    servers: Vec<NameServer>,
    /// Incremented on every send, shared by all transactions.
    send_counter: u64,
}

impl NameServerSet {
    pub fn new(addresses: impl IntoIterator<Item = SocketAddr>) -> Self {
        let mut servers = Vec::new();
        for address in addresses {
            if servers.len() >= MAX_NAMESERVERS {
                error!(nameserver = %address, "Too many nameservers, ignoring");
                continue;
            }
            servers.push(NameServer {
                address,
                consecutive_timeouts: 0,
            });
        }
        Self {
            servers,
            send_counter: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn stats(&self) -> Vec<NameServerStats> {
        self.servers
            .iter()
            .map(|s| NameServerStats {
                address: s.address,
                consecutive_timeouts: s.consecutive_timeouts,
            })
            .collect()
    }

    /// Index of the configured server a datagram from `source` may have
    /// come from. A server configured with an unspecified address matches
    /// any source of its family and port.
    pub fn find_source(&self, source: SocketAddr) -> Option<usize> {
        self.servers.iter().position(|s| {
            s.address.is_ipv4() == source.is_ipv4()
                && s.address.port() == source.port()
                && (s.address.ip() == source.ip() || s.address.ip().is_unspecified())
        })
    }

    pub fn mark_healthy(&mut self, index: usize) {
        if let Some(server) = self.servers.get_mut(index) {
            server.consecutive_timeouts = 0;
        }
    }

    pub fn mark_timeout(&mut self, index: usize) {
        if let Some(server) = self.servers.get_mut(index) {
            server.consecutive_timeouts = server.consecutive_timeouts.saturating_add(1);
            debug!(
                nameserver = %server.address,
                timeouts = server.consecutive_timeouts,
                "Nameserver timed out"
            );
        }
    }

    /// Sends `packet` for the `sends`-th time (1-based) and returns the index
    /// of the server that accepted it.
    ///
    /// Rotation starts at server `sends - 1`. Servers with recent timeouts
    /// are only tried every [`retry_frequency`] sends; if every healthy
    /// server refuses the datagram the unhealthy ones are tried anyway.
    pub fn send(
        &mut self,
        packet: &[u8],
        sends: u32,
        sink: &mut dyn DatagramSink,
    ) -> Option<usize> {
        let n = self.servers.len();
        if n == 0 {
            return None;
        }
        self.send_counter = self.send_counter.wrapping_add(1);
        let offset = (sends as usize).saturating_sub(1);

        for i in 0..n {
            let index = (i + offset) % n;
            let timeouts = self.servers[index].consecutive_timeouts;
            if timeouts > 0 && self.send_counter % retry_frequency(timeouts) != 0 {
                continue;
            }
            if self.try_send(index, packet, sink) {
                return Some(index);
            }
        }

        for i in 0..n {
            let index = (i + offset) % n;
            if self.servers[index].consecutive_timeouts == 0 {
                continue;
            }
            if self.try_send(index, packet, sink) {
                return Some(index);
            }
        }

        warn!(servers = n, "No nameserver accepted the query");
        None
    }

    fn try_send(&self, index: usize, packet: &[u8], sink: &mut dyn DatagramSink) -> bool {
        let address = self.servers[index].address;
        match sink.send_to(packet, address) {
            Ok(sent) if sent == packet.len() => true,
            Ok(sent) => {
                debug!(nameserver = %address, sent, len = packet.len(), "Short send");
                false
            }
            Err(e) => {
                debug!(nameserver = %address, error = %e, "Send failed");
                false
            }
        }
    }
}
