#![allow(dead_code)]
use super::recording_sink::RecordingSink;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use stubres_domain::{DnsReply, RecordType, ResolvConf, ResponseCode};
use stubres_infrastructure::dns::wire::{decode_name, Header, MessageBuilder, HEADER_LEN};
use stubres_infrastructure::dns::{ManualClock, QueryCallback, StubResolver, StubResolverBuilder};

pub const NS1: &str = "192.0.2.53:53";
pub const NS2: &str = "198.51.100.53:53";

pub fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub struct TestResolver {
    pub resolver: StubResolver<RecordingSink>,
    pub sink: RecordingSink,
    pub clock: ManualClock,
}

pub fn test_resolver(nameservers: &[&str], domain: Option<&str>) -> TestResolver {
    let conf = ResolvConf {
        nameservers: nameservers.iter().map(|s| addr(s)).collect(),
        domain: domain.map(str::to_string),
    };
    let sink = RecordingSink::new();
    let clock = ManualClock::new();
    let resolver = StubResolverBuilder::new(conf)
        .with_clock(clock.clone())
        .build(sink.clone());
    TestResolver {
        resolver,
        sink,
        clock,
    }
}

/// Collects what callbacks were invoked with.
#[derive(Debug, Clone, Default)]
pub struct CallbackProbe {
    results: Arc<Mutex<Vec<Option<DnsReply>>>>,
}

impl CallbackProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> QueryCallback {
        let results = self.results.clone();
        Box::new(move |reply| results.lock().unwrap().push(reply))
    }

    pub fn results(&self) -> Vec<Option<DnsReply>> {
        self.results.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

/// Question name and type of a query packet.
pub fn question_of(packet: &[u8]) -> (String, u16) {
    let (name, used) = decode_name(packet, HEADER_LEN).unwrap();
    let at = HEADER_LEN + used;
    (name, u16::from_be_bytes([packet[at], packet[at + 1]]))
}

/// Builds a response to a query packet captured from the resolver.
pub struct ReplyBuilder {
    header: Header,
    question: Option<(String, u16)>,
    rcode: ResponseCode,
    answers: Vec<ReplyRecord>,
}

enum ReplyRecord {
    Raw(u16, Vec<u8>),
    Name(u16, String),
}

impl ReplyBuilder {
    pub fn to(query: &[u8]) -> Self {
        Self {
            header: Header::decode(query).unwrap(),
            question: Some(question_of(query)),
            rcode: ResponseCode::NoError,
            answers: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: u16) -> Self {
        self.header.id = id;
        self
    }

    pub fn question_name(mut self, name: &str) -> Self {
        if let Some((_, rtype)) = self.question.take() {
            self.question = Some((name.to_string(), rtype));
        }
        self
    }

    pub fn no_question(mut self) -> Self {
        self.question = None;
        self
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn a(self, address: &str) -> Self {
        let octets = address.parse::<std::net::Ipv4Addr>().unwrap().octets();
        self.raw(RecordType::A.to_u16(), &octets)
    }

    pub fn aaaa(self, address: &str) -> Self {
        let octets = address.parse::<std::net::Ipv6Addr>().unwrap().octets();
        self.raw(RecordType::AAAA.to_u16(), &octets)
    }

    pub fn ptr(mut self, target: &str) -> Self {
        self.answers
            .push(ReplyRecord::Name(RecordType::PTR.to_u16(), target.to_string()));
        self
    }

    pub fn cname(mut self, target: &str) -> Self {
        self.answers
            .push(ReplyRecord::Name(RecordType::CNAME.to_u16(), target.to_string()));
        self
    }

    pub fn raw(mut self, rtype: u16, rdata: &[u8]) -> Self {
        self.answers.push(ReplyRecord::Raw(rtype, rdata.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let owner = self
            .question
            .as_ref()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "owner.test".to_string());

        let mut builder = MessageBuilder::new(Header::response_to(&self.header, self.rcode));
        if let Some((name, rtype)) = &self.question {
            builder = builder.question(name, *rtype, 1).unwrap();
        }
        for answer in &self.answers {
            builder = match answer {
                ReplyRecord::Raw(rtype, rdata) => {
                    builder.answer(&owner, *rtype, 1, 300, rdata).unwrap()
                }
                ReplyRecord::Name(rtype, target) => {
                    builder.answer_name(&owner, *rtype, 1, 300, target).unwrap()
                }
            };
        }
        builder.finish()
    }
}
