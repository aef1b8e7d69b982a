#![allow(dead_code)]
use std::collections::HashMap;
use std::net::SocketAddr;
use stubres_domain::{RecordType, ResponseCode};
use stubres_infrastructure::dns::wire::{
    decode_name, Header, MessageBuilder, HEADER_LEN, MAX_DATAGRAM_SIZE,
};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// Answers queries on loopback from a fixed zone; names it does not know
/// get NXDOMAIN.
pub struct MockNameServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

#[derive(Debug, Clone, Default)]
pub struct MockZone {
    records: HashMap<(String, u16), MockAnswer>,
}

#[derive(Debug, Clone)]
pub enum MockAnswer {
    Address(Vec<u8>),
    Name(String),
}

impl MockZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn a(mut self, name: &str, address: [u8; 4]) -> Self {
        self.records.insert(
            (name.to_ascii_lowercase(), RecordType::A.to_u16()),
            MockAnswer::Address(address.to_vec()),
        );
        self
    }

    pub fn ptr(mut self, name: &str, target: &str) -> Self {
        self.records.insert(
            (name.to_ascii_lowercase(), RecordType::PTR.to_u16()),
            MockAnswer::Name(target.to_string()),
        );
        self
    }

    fn answer(&self, query: &[u8]) -> Option<Vec<u8>> {
        let header = Header::decode(query).ok()?;
        let (name, used) = decode_name(query, HEADER_LEN).ok()?;
        let at = HEADER_LEN + used;
        let rtype = u16::from_be_bytes([*query.get(at)?, *query.get(at + 1)?]);

        let found = self.records.get(&(name.to_ascii_lowercase(), rtype));
        let rcode = if found.is_some() {
            ResponseCode::NoError
        } else {
            ResponseCode::NXDomain
        };

        let mut builder = MessageBuilder::new(Header::response_to(&header, rcode))
            .question(&name, rtype, 1)
            .ok()?;
        builder = match found {
            Some(MockAnswer::Address(octets)) => {
                builder.answer(&name, rtype, 1, 60, octets).ok()?
            }
            Some(MockAnswer::Name(target)) => {
                builder.answer_name(&name, rtype, 1, 60, target).ok()?
            }
            None => builder,
        };
        Some(builder.finish())
    }
}

impl MockNameServer {
    pub async fn start(zone: MockZone) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = socket.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            if let Some(response) = zone.answer(&buf[..len]) {
                                let _ = socket.send_to(&response, peer).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockNameServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
