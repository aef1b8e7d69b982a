use super::udp::UdpResolverSocket;
use crate::dns::resolver::StubResolver;
use crate::dns::wire::MAX_DATAGRAM_SIZE;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use stubres_domain::DomainError;
use tracing::{debug, error};

/// Consecutive receive errors tolerated in one drain before waiting for
/// the next readiness notification.
const MAX_RECV_ERRORS: usize = 8;

/// Runs a [`StubResolver`] on a tokio runtime: datagrams are fed in as the
/// socket becomes readable and the resolver is ticked on a fixed interval.
pub struct ResolverDriver {
    resolver: StubResolver<UdpResolverSocket>,
    socket: UdpResolverSocket,
    tick_interval: Duration,
}

impl ResolverDriver {
    pub fn new(resolver: StubResolver<UdpResolverSocket>, tick_interval: Duration) -> Self {
        let socket = resolver.sink().clone();
        Self {
            resolver,
            socket,
            tick_interval,
        }
    }

    pub fn resolver(&self) -> &StubResolver<UdpResolverSocket> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut StubResolver<UdpResolverSocket> {
        &mut self.resolver
    }

    /// Drives the resolver until `done` holds, checked before every wait.
    pub async fn run_until<F>(&mut self, mut done: F) -> Result<(), DomainError>
    where
        F: FnMut(&StubResolver<UdpResolverSocket>) -> bool,
    {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut recv_buf = [0u8; MAX_DATAGRAM_SIZE];

        while !done(&self.resolver) {
            tokio::select! {
                ready = self.socket.readable() => {
                    let mut guard = ready
                        .map_err(|e| DomainError::IoError(format!("resolver socket: {}", e)))?;

                    let resolver = &mut self.resolver;
                    drain(
                        |buf| self.socket.try_recv_from(buf),
                        &mut recv_buf,
                        |from, packet| resolver.on_datagram(from, packet),
                    );
                    guard.clear_ready();
                }
                _ = interval.tick() => {
                    let now = Instant::now();
                    let next = self.resolver.on_tick(now);
                    debug!(
                        live = self.resolver.live_count(),
                        next_in_ms = next.saturating_duration_since(now).as_millis() as u64,
                        "Resolver tick"
                    );
                }
            }
        }

        Ok(())
    }

    /// Drives the resolver until every outstanding query has completed.
    pub async fn run_to_completion(&mut self) -> Result<(), DomainError> {
        self.run_until(|resolver| resolver.live_count() == 0).await.inspect_err(|e| {
            error!(error = %e, "Resolver driver stopped");
        })
    }
}

/// Reads datagrams until the socket reports `WouldBlock`, handing each one
/// to `deliver`. Failed reads are skipped; after [`MAX_RECV_ERRORS`] of
/// them in a row the drain gives up until the next readiness event.
/// Returns the number of datagrams delivered.
fn drain<R, D>(mut recv: R, buf: &mut [u8], mut deliver: D) -> usize
where
    R: FnMut(&mut [u8]) -> io::Result<(usize, SocketAddr)>,
    D: FnMut(SocketAddr, &[u8]),
{
    let mut delivered = 0;
    let mut recv_errors = 0;

    loop {
        match recv(buf) {
            Ok((n, from)) => {
                recv_errors = 0;
                delivered += 1;
                deliver(from, &buf[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return delivered,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // ICMP errors from unreachable nameservers surface here and
                // are consumed by the failed read
                recv_errors += 1;
                debug!(error = %e, recv_errors, "Resolver recv error");
                if recv_errors >= MAX_RECV_ERRORS {
                    return delivered;
                }
            }
        }
    }
}
