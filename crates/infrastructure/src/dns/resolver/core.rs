use super::answer::{first_answer, question_matches, Answer};
use super::clock::Clock;
use super::nameservers::{NameServerSet, NameServerStats};
use super::reverse::reverse_name;
use super::transaction::{QueryCallback, QueryKind, Transaction};
use crate::dns::transport::DatagramSink;
use crate::dns::wire::{canonicalize, encode_query, Header, HEADER_LEN, MAX_NAME_LEN};
use rustc_hash::FxHashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use stubres_domain::{
    DnsClass, DnsReply, DomainError, QueryToken, RecordType, ResolvConf, ResponseCode,
};
use tracing::{debug, info, warn};

/// Upper bound on outstanding transactions.
pub const MAX_LIVE_TRANSACTIONS: usize = 4096;

/// Next deadline reported when nothing is outstanding.
pub const IDLE_TICK: Duration = Duration::from_secs(600);

/// Asynchronous stub resolver state: the nameserver set, the default
/// domain and every outstanding transaction.
///
/// The engine does no I/O of its own beyond handing datagrams to its sink.
/// The owner feeds it received datagrams through
/// [`on_datagram`](Self::on_datagram) and calls [`on_tick`](Self::on_tick)
/// no later than the deadline the previous tick returned.
pub struct StubResolver<S> {
    nameservers: NameServerSet,
    domain: Option<String>,
    transactions: FxHashMap<u16, Transaction>,
    sink: S,
    clock: Box<dyn Clock>,
}

impl<S: DatagramSink> StubResolver<S> {
    pub(crate) fn from_parts(conf: ResolvConf, sink: S, clock: Box<dyn Clock>) -> Self {
        let conf = conf.with_default_nameserver();
        Self {
            nameservers: NameServerSet::new(conf.nameservers),
            domain: conf.domain.filter(|d| !d.is_empty()),
            transactions: FxHashMap::default(),
            sink,
            clock,
        }
    }

    /// Starts an `A` or `AAAA` lookup for `name`.
    ///
    /// A name without any dot gets the default domain appended. Returns
    /// the query id; on error nothing was queued and `callback` is dropped
    /// without being invoked.
    pub fn submit_forward(
        &mut self,
        name: &str,
        record_type: RecordType,
        token: QueryToken,
        callback: QueryCallback,
    ) -> Result<u16, DomainError> {
        if !record_type.is_address() {
            return Err(DomainError::UnsupportedRecordType(record_type.to_string()));
        }
        let query_name = self.qualify(name)?;
        self.start(QueryKind::Forward(record_type), query_name, token, callback)
    }

    /// Starts a PTR lookup for `address`. A PTR answer is confirmed with a
    /// forward lookup of the same family, and the reply of that lookup is
    /// what `callback` receives.
    pub fn submit_reverse(
        &mut self,
        address: IpAddr,
        token: QueryToken,
        callback: QueryCallback,
    ) -> Result<u16, DomainError> {
        self.start(QueryKind::Reverse(address), reverse_name(address), token, callback)
    }

    /// Drops every transaction submitted with `token` without invoking its
    /// callback, returning how many were dropped.
    pub fn cancel_all(&mut self, token: QueryToken) -> usize {
        let before = self.transactions.len();
        self.transactions.retain(|_, txn| txn.token != token);
        let cancelled = before - self.transactions.len();
        if cancelled > 0 {
            debug!(token = %token, cancelled, "Cancelled outstanding queries");
        }
        cancelled
    }

    /// Resends or fails every transaction whose deadline has passed and
    /// returns when the next one falls due.
    pub fn on_tick(&mut self, now: Instant) -> Instant {
        let mut ids: Vec<u16> = self.transactions.keys().copied().collect();
        ids.sort_unstable();

        let mut failed = Vec::new();
        let mut next: Option<Instant> = None;

        for id in ids {
            let Some(txn) = self.transactions.get_mut(&id) else {
                continue;
            };

            if now >= txn.deadline() {
                txn.retries = txn.retries.saturating_sub(1);
                if txn.retries == 0 {
                    if let Some(txn) = self.transactions.remove(&id) {
                        warn!(
                            id,
                            name = %txn.query_name,
                            record_type = %txn.kind.record_type(),
                            "Query timed out"
                        );
                        failed.push(txn.callback);
                    }
                    continue;
                }

                if let Some(server) = txn.last_server {
                    self.nameservers.mark_timeout(server);
                }
                txn.sent_at = now;
                txn.timeout *= 2;
                transmit(&mut self.nameservers, &mut self.sink, txn);
                debug!(
                    id,
                    name = %txn.query_name,
                    sends = txn.sends,
                    retries_left = txn.retries,
                    "Resent query"
                );
            }

            let deadline = txn.deadline();
            next = Some(next.map_or(deadline, |n| n.min(deadline)));
        }

        for callback in failed {
            callback(None);
        }

        match next {
            Some(deadline) if deadline > now => deadline,
            _ => now + IDLE_TICK,
        }
    }

    /// Processes one datagram received on the resolver socket.
    ///
    /// Datagrams that cannot be tied to an outstanding query from one of
    /// the configured nameservers are dropped without touching any
    /// transaction.
    pub fn on_datagram(&mut self, source: SocketAddr, packet: &[u8]) {
        if packet.len() <= HEADER_LEN {
            debug!(source = %source, len = packet.len(), "Dropping short datagram");
            return;
        }
        let header = match Header::decode(packet) {
            Ok(header) => header,
            Err(e) => {
                debug!(source = %source, error = %e, "Dropping undecodable datagram");
                return;
            }
        };

        let Some(txn) = self.transactions.get(&header.id) else {
            debug!(source = %source, id = header.id, "Reply for unknown query id");
            return;
        };
        let Some(server) = self.nameservers.find_source(source) else {
            debug!(source = %source, id = header.id, "Reply from unexpected source");
            return;
        };
        self.nameservers.mark_healthy(server);

        if !question_matches(&header, packet, &txn.query_name) {
            debug!(
                source = %source,
                id = header.id,
                expected = %txn.query_name,
                "Reply does not echo our question"
            );
            return;
        }

        let Some(txn) = self.transactions.remove(&header.id) else {
            return;
        };

        if header.rcode != ResponseCode::NoError || header.ancount == 0 {
            debug!(
                id = txn.id,
                name = %txn.query_name,
                rcode = %header.rcode,
                answers = header.ancount,
                "Lookup failed"
            );
            (txn.callback)(None);
            return;
        }

        match (txn.kind, first_answer(&header, packet, txn.kind.record_type())) {
            (_, Ok(Answer::Address(address))) => {
                debug!(id = txn.id, name = %txn.query_name, address = %address, "Lookup succeeded");
                (txn.callback)(Some(DnsReply::new(txn.query_name, address)));
            }
            (QueryKind::Reverse(address), Ok(Answer::Pointer(hostname))) => {
                self.follow_pointer(txn, address, hostname);
            }
            (QueryKind::Forward(_), Ok(Answer::Pointer(_))) => (txn.callback)(None),
            (_, Err(e)) => {
                debug!(id = txn.id, name = %txn.query_name, error = %e, "Unusable answer");
                (txn.callback)(None);
            }
        }
    }

    /// Replaces the nameserver set and default domain. Outstanding
    /// transactions keep running against the new set.
    pub fn reload(&mut self, conf: ResolvConf) {
        let conf = conf.with_default_nameserver();
        info!(
            nameservers = conf.nameservers.len(),
            domain = conf.domain.as_deref().unwrap_or(""),
            live = self.transactions.len(),
            "Reloading resolver configuration"
        );
        self.nameservers = NameServerSet::new(conf.nameservers);
        self.domain = conf.domain.filter(|d| !d.is_empty());
    }

    pub fn nameserver_stats(&self) -> Vec<NameServerStats> {
        self.nameservers.stats()
    }

    pub fn live_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn contains(&self, id: u16) -> bool {
        self.transactions.contains_key(&id)
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    fn follow_pointer(&mut self, txn: Transaction, address: IpAddr, hostname: String) {
        let record_type = match address {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::AAAA,
        };

        let prepared = self
            .qualify(&hostname)
            .and_then(|name| self.prepare(&name, record_type).map(|p| (name, p)));

        match prepared {
            Ok((name, (packet, id))) => {
                debug!(
                    ptr_id = txn.id,
                    id,
                    hostname = %name,
                    record_type = %record_type,
                    "Confirming PTR answer"
                );
                let follow_up = Transaction::new(
                    id,
                    QueryKind::Forward(record_type),
                    name,
                    packet,
                    txn.token,
                    txn.callback,
                    self.clock.now(),
                );
                self.launch(follow_up);
            }
            Err(e) => {
                debug!(id = txn.id, hostname = %hostname, error = %e, "Cannot confirm PTR answer");
                (txn.callback)(None);
            }
        }
    }

    /// Canonical form of `name`, with the default domain appended to a
    /// dot-less name when the result stays within the name limit.
    fn qualify(&self, name: &str) -> Result<String, DomainError> {
        let canonical = canonicalize(name)
            .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", name, e)))?;
        if canonical == "." {
            return Err(DomainError::InvalidDomainName(name.to_string()));
        }

        let Some(domain) = self.domain.as_deref() else {
            return Ok(canonical);
        };
        if canonical.contains('.') || canonical.len() + domain.len() + 2 >= MAX_NAME_LEN {
            return Ok(canonical);
        }

        let qualified = format!("{}.{}", canonical, domain);
        match canonicalize(&qualified) {
            Ok(qualified) => Ok(qualified),
            Err(e) => {
                debug!(
                    name = %canonical,
                    domain = %domain,
                    error = %e,
                    "Not appending default domain"
                );
                Ok(canonical)
            }
        }
    }

    fn start(
        &mut self,
        kind: QueryKind,
        query_name: String,
        token: QueryToken,
        callback: QueryCallback,
    ) -> Result<u16, DomainError> {
        let (packet, id) = self.prepare(&query_name, kind.record_type())?;
        let txn = Transaction::new(id, kind, query_name, packet, token, callback, self.clock.now());
        Ok(self.launch(txn))
    }

    /// Fallible half of starting a query: capacity check, id choice and
    /// encoding. Nothing is recorded.
    fn prepare(&self, name: &str, record_type: RecordType) -> Result<(Vec<u8>, u16), DomainError> {
        if self.transactions.len() >= MAX_LIVE_TRANSACTIONS {
            warn!(live = self.transactions.len(), "Transaction table full");
            return Err(DomainError::TransactionTableFull(self.transactions.len()));
        }
        let transactions = &self.transactions;
        encode_query(name, record_type, DnsClass::IN, |id| {
            transactions.contains_key(&id)
        })
    }

    fn launch(&mut self, mut txn: Transaction) -> u16 {
        transmit(&mut self.nameservers, &mut self.sink, &mut txn);
        debug!(
            id = txn.id,
            name = %txn.query_name,
            record_type = %txn.kind.record_type(),
            token = %txn.token,
            "Query submitted"
        );
        let id = txn.id;
        self.transactions.insert(id, txn);
        id
    }
}

fn transmit<S: DatagramSink>(nameservers: &mut NameServerSet, sink: &mut S, txn: &mut Transaction) {
    txn.sends += 1;
    if let Some(server) = nameservers.send(&txn.packet, txn.sends, sink) {
        txn.last_server = Some(server);
    }
}
