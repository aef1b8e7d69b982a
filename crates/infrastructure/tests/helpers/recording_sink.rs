#![allow(dead_code)]
use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use stubres_infrastructure::dns::DatagramSink;

#[derive(Debug, Clone)]
pub struct SentDatagram {
    pub target: SocketAddr,
    pub packet: Vec<u8>,
}

impl SentDatagram {
    pub fn id(&self) -> u16 {
        u16::from_be_bytes([self.packet[0], self.packet[1]])
    }
}

/// Sink that keeps every datagram instead of sending it. Clones share the
/// same log, so tests keep one handle while the resolver owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<SentDatagram>>>,
    refused: Arc<Mutex<HashSet<SocketAddr>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sends to `target` fail from now on.
    pub fn refuse(&self, target: SocketAddr) {
        self.refused.lock().unwrap().insert(target);
    }

    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> SentDatagram {
        self.sent
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("nothing was sent")
    }

    pub fn targets(&self) -> Vec<SocketAddr> {
        self.sent().into_iter().map(|d| d.target).collect()
    }
}

impl DatagramSink for RecordingSink {
    fn send_to(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize> {
        if self.refused.lock().unwrap().contains(&target) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "refused by test",
            ));
        }
        self.sent.lock().unwrap().push(SentDatagram {
            target,
            packet: packet.to_vec(),
        });
        Ok(packet.len())
    }
}
