//! DNS Message Builder
//!
//! Writes a message section by section, compressing every name against the
//! names already written. Counts are patched into the header by
//! [`MessageBuilder::finish`].

use super::bytes::put16;
use super::header::{Header, HEADER_LEN};
use super::name::{name_to_wire, CompressionTable};
use stubres_domain::WireError;

pub struct MessageBuilder {
    header: Header,
    buf: Vec<u8>,
    table: CompressionTable,
}

impl MessageBuilder {
    pub fn new(header: Header) -> Self {
        let mut buf = Vec::with_capacity(512);
        buf.extend_from_slice(&header.encode());
        Self {
            header: Header {
                qdcount: 0,
                ancount: 0,
                nscount: 0,
                arcount: 0,
                ..header
            },
            buf,
            table: CompressionTable::new(),
        }
    }

    pub fn question(mut self, name: &str, rtype: u16, class: u16) -> Result<Self, WireError> {
        self.write_name(name)?;
        self.buf.extend_from_slice(&rtype.to_be_bytes());
        self.buf.extend_from_slice(&class.to_be_bytes());
        self.header.qdcount += 1;
        Ok(self)
    }

    /// Answer record with opaque rdata.
    pub fn answer(
        mut self,
        name: &str,
        rtype: u16,
        class: u16,
        ttl: u32,
        rdata: &[u8],
    ) -> Result<Self, WireError> {
        if rdata.len() > u16::MAX as usize {
            return Err(WireError::BufferTooSmall);
        }
        self.write_rr_fixed(name, rtype, class, ttl, rdata.len() as u16)?;
        self.buf.extend_from_slice(rdata);
        self.header.ancount += 1;
        Ok(self)
    }

    /// Answer record whose rdata is a single (compressed) name, as in PTR
    /// and CNAME records.
    pub fn answer_name(
        mut self,
        name: &str,
        rtype: u16,
        class: u16,
        ttl: u32,
        target: &str,
    ) -> Result<Self, WireError> {
        self.write_rr_fixed(name, rtype, class, ttl, 0)?;
        let rdlength_at = self.buf.len() - 2;
        let start = self.buf.len();
        self.write_name(target)?;
        let rdlength = (self.buf.len() - start) as u16;
        put16(&mut self.buf, rdlength_at, rdlength)?;
        self.header.ancount += 1;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() <= HEADER_LEN
    }

    pub fn finish(mut self) -> Vec<u8> {
        let header = self.header.encode();
        self.buf[..HEADER_LEN].copy_from_slice(&header);
        self.buf
    }

    fn write_name(&mut self, name: &str) -> Result<(), WireError> {
        let wire = name_to_wire(name)?;
        self.table.pack(&wire, &mut self.buf)
    }

    fn write_rr_fixed(
        &mut self,
        name: &str,
        rtype: u16,
        class: u16,
        ttl: u32,
        rdlength: u16,
    ) -> Result<(), WireError> {
        self.write_name(name)?;
        self.buf.extend_from_slice(&rtype.to_be_bytes());
        self.buf.extend_from_slice(&class.to_be_bytes());
        self.buf.extend_from_slice(&ttl.to_be_bytes());
        self.buf.extend_from_slice(&rdlength.to_be_bytes());
        Ok(())
    }
}
