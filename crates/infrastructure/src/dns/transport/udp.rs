use super::DatagramSink;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use stubres_domain::DomainError;
use tokio::io::unix::{AsyncFd, AsyncFdReadyGuard};
use tokio::io::Interest;
use tracing::info;

/// Non-blocking UDP socket shared by every outstanding query.
///
/// Clones refer to the same socket: the resolver sends through one handle
/// while the driver waits for readability on another.
#[derive(Clone)]
pub struct UdpResolverSocket {
    inner: Arc<AsyncFd<std::net::UdpSocket>>,
}

impl UdpResolverSocket {
    /// Opens an ephemeral-port socket of the same family as `nameserver`.
    /// Must be called from within a tokio runtime.
    pub fn open_for(nameserver: SocketAddr) -> Result<Self, DomainError> {
        let bind_addr = match nameserver.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        Self::bind(bind_addr)
    }

    pub fn bind(addr: SocketAddr) -> Result<Self, DomainError> {
        let fd = create_udp_socket(addr)
            .map_err(|e| DomainError::IoError(format!("resolver socket on {}: {}", addr, e)))?;
        let socket = Self {
            inner: Arc::new(fd),
        };
        info!(local = ?socket.local_addr().ok(), "Resolver socket opened");
        Ok(socket)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.get_ref().local_addr()
    }

    pub async fn readable(&self) -> io::Result<AsyncFdReadyGuard<'_, std::net::UdpSocket>> {
        self.inner.readable().await
    }

    pub fn try_recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.get_ref().recv_from(buf)
    }
}

impl DatagramSink for UdpResolverSocket {
    fn send_to(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.inner.get_ref().send_to(packet, target)
    }
}

fn create_udp_socket(addr: SocketAddr) -> io::Result<AsyncFd<std::net::UdpSocket>> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_recv_buffer_size(256 * 1024)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    AsyncFd::with_interest(std_socket, Interest::READABLE)
}
