pub mod resolver;
pub mod transport;
pub mod wire;

pub use resolver::{
    Clock, ManualClock, NameServerStats, QueryCallback, StubResolver, StubResolverBuilder,
    SystemClock,
};
pub use transport::{DatagramSink, ResolverDriver, UdpResolverSocket};
