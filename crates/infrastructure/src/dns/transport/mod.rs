pub mod driver;
pub mod udp;

use std::io;
use std::net::SocketAddr;

pub use driver::ResolverDriver;
pub use udp::UdpResolverSocket;

/// Outbound half of the resolver socket.
///
/// A send counts as accepted only when the full datagram was written.
pub trait DatagramSink {
    fn send_to(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize>;
}

impl<S: DatagramSink + ?Sized> DatagramSink for &mut S {
    fn send_to(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize> {
        (**self).send_to(packet, target)
    }
}

impl<S: DatagramSink + ?Sized> DatagramSink for Box<S> {
    fn send_to(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize> {
        (**self).send_to(packet, target)
    }
}
