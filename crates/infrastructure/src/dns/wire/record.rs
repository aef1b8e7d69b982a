use super::bytes::{get16, get32};
use stubres_domain::{RecordType, WireError};

/// Type and class following a question name.
pub const QUESTION_FIXED_LEN: usize = 4;

/// Type, class, TTL and rdlength following a record owner name.
pub const RR_FIXED_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdlength: u16,
}

impl RecordHeader {
    /// Reads the fixed part of a record starting at `pos`, just after the
    /// owner name.
    pub fn parse(msg: &[u8], pos: usize) -> Result<Self, WireError> {
        if pos + RR_FIXED_LEN > msg.len() {
            return Err(WireError::Truncated(pos));
        }
        Ok(Self {
            rtype: get16(msg, pos)?,
            class: get16(msg, pos + 2)?,
            ttl: get32(msg, pos + 4)?,
            rdlength: get16(msg, pos + 8)?,
        })
    }

    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_u16(self.rtype)
    }

    /// Offset one past the rdata of a record whose fixed part starts at
    /// `pos`, provided the rdata lies inside the message.
    pub fn rdata_end(&self, msg: &[u8], pos: usize) -> Result<usize, WireError> {
        let end = pos + RR_FIXED_LEN + self.rdlength as usize;
        if end > msg.len() {
            return Err(WireError::Truncated(pos + RR_FIXED_LEN));
        }
        Ok(end)
    }
}
