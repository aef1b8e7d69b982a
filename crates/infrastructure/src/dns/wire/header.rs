use super::bytes::{get16, put16};
use stubres_domain::{ResponseCode, WireError};

pub const HEADER_LEN: usize = 12;

const QR_MASK: u16 = 0x8000;
const OPCODE_SHIFT: u16 = 11;
const OPCODE_MASK: u16 = 0x7800;
const AA_MASK: u16 = 0x0400;
const TC_MASK: u16 = 0x0200;
const RD_MASK: u16 = 0x0100;
const RA_MASK: u16 = 0x0080;
const AD_MASK: u16 = 0x0020;
const CD_MASK: u16 = 0x0010;
const RCODE_MASK: u16 = 0x000F;

/// The fixed 12-byte message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub response: bool,
    pub opcode: u8,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
    pub rcode: ResponseCode,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// Standard recursive query header with one question.
    pub fn query(id: u16) -> Self {
        Self {
            id,
            response: false,
            opcode: 0,
            authoritative: false,
            truncated: false,
            recursion_desired: true,
            recursion_available: false,
            authentic_data: false,
            checking_disabled: false,
            rcode: ResponseCode::NoError,
            qdcount: 1,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }

    /// Response header answering `query`, echoing its id and RD bit.
    pub fn response_to(query: &Header, rcode: ResponseCode) -> Self {
        Self {
            response: true,
            recursion_available: true,
            rcode,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            ..*query
        }
    }

    pub fn flags(&self) -> u16 {
        let mut flags = ((self.opcode as u16) << OPCODE_SHIFT) & OPCODE_MASK;
        flags |= self.rcode.to_u8() as u16 & RCODE_MASK;
        if self.response {
            flags |= QR_MASK;
        }
        if self.authoritative {
            flags |= AA_MASK;
        }
        if self.truncated {
            flags |= TC_MASK;
        }
        if self.recursion_desired {
            flags |= RD_MASK;
        }
        if self.recursion_available {
            flags |= RA_MASK;
        }
        if self.authentic_data {
            flags |= AD_MASK;
        }
        if self.checking_disabled {
            flags |= CD_MASK;
        }
        flags
    }

    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < HEADER_LEN {
            return Err(WireError::Truncated(buf.len()));
        }

        let flags = get16(buf, 2)?;
        Ok(Self {
            id: get16(buf, 0)?,
            response: flags & QR_MASK != 0,
            opcode: ((flags & OPCODE_MASK) >> OPCODE_SHIFT) as u8,
            authoritative: flags & AA_MASK != 0,
            truncated: flags & TC_MASK != 0,
            recursion_desired: flags & RD_MASK != 0,
            recursion_available: flags & RA_MASK != 0,
            authentic_data: flags & AD_MASK != 0,
            checking_disabled: flags & CD_MASK != 0,
            rcode: ResponseCode::from_u8((flags & RCODE_MASK) as u8),
            qdcount: get16(buf, 4)?,
            ancount: get16(buf, 6)?,
            nscount: get16(buf, 8)?,
            arcount: get16(buf, 10)?,
        })
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        let fields = [
            self.id,
            self.flags(),
            self.qdcount,
            self.ancount,
            self.nscount,
            self.arcount,
        ];
        for (i, value) in fields.into_iter().enumerate() {
            // the array is exactly HEADER_LEN bytes
            let _ = put16(&mut buf, i * 2, value);
        }
        buf
    }
}
