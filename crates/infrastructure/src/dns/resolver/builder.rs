use super::clock::{Clock, SystemClock};
use super::core::StubResolver;
use crate::dns::transport::DatagramSink;
use stubres_domain::ResolvConf;
use tracing::info;

pub struct StubResolverBuilder {
    conf: ResolvConf,
    clock: Box<dyn Clock>,
}

impl StubResolverBuilder {
    pub fn new(conf: ResolvConf) -> Self {
        Self {
            conf,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn build<S: DatagramSink>(self, sink: S) -> StubResolver<S> {
        info!(
            nameservers = self.conf.nameservers.len(),
            domain = self.conf.domain.as_deref().unwrap_or(""),
            "Building stub resolver"
        );

        StubResolver::from_parts(self.conf, sink, self.clock)
    }
}
