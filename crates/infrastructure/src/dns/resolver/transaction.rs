use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use stubres_domain::{DnsReply, QueryToken, RecordType};

/// Invoked exactly once per successful submission: with the reply, or with
/// `None` on failure. Never invoked after the owner cancels.
pub type QueryCallback = Box<dyn FnOnce(Option<DnsReply>) + Send + 'static>;

/// Datagrams sent per transaction before it fails.
pub const INITIAL_RETRIES: u8 = 3;

/// Wait before the first resend; doubled on every resend.
pub const INITIAL_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A or AAAA lookup reporting the queried name.
    Forward(RecordType),
    /// PTR lookup for an address; chains into a forward lookup.
    Reverse(IpAddr),
}

impl QueryKind {
    pub fn record_type(&self) -> RecordType {
        match self {
            QueryKind::Forward(record_type) => *record_type,
            QueryKind::Reverse(_) => RecordType::PTR,
        }
    }
}

/// One outstanding query, keyed by its id in the transaction table.
pub(crate) struct Transaction {
    pub id: u16,
    pub kind: QueryKind,
    /// Name exactly as it went into the question section.
    pub query_name: String,
    pub token: QueryToken,
    pub callback: QueryCallback,
    pub packet: Vec<u8>,
    pub retries: u8,
    pub timeout: Duration,
    pub sent_at: Instant,
    pub sends: u32,
    /// Index of the nameserver that took the most recent datagram.
    pub last_server: Option<usize>,
}

impl Transaction {
    pub fn new(
        id: u16,
        kind: QueryKind,
        query_name: String,
        packet: Vec<u8>,
        token: QueryToken,
        callback: QueryCallback,
        now: Instant,
    ) -> Self {
        Self {
            id,
            kind,
            query_name,
            token,
            callback,
            packet,
            retries: INITIAL_RETRIES,
            timeout: INITIAL_TIMEOUT,
            sent_at: now,
            sends: 0,
            last_server: None,
        }
    }

    #[inline]
    pub fn deadline(&self) -> Instant {
        self.sent_at + self.timeout
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("query_name", &self.query_name)
            .field("token", &self.token)
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .field("sends", &self.sends)
            .field("last_server", &self.last_server)
            .finish_non_exhaustive()
    }
}
