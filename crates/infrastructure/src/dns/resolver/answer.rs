//! Response validation and answer extraction.

use crate::dns::wire::{
    decode_name, skip_name, Header, RecordHeader, HEADER_LEN, QUESTION_FIXED_LEN, RR_FIXED_LEN,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use stubres_domain::{RecordType, WireError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Address(IpAddr),
    Pointer(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("{found} answer to a {wanted} query")]
    TypeMismatch { wanted: RecordType, found: RecordType },

    #[error("{record_type} record with rdlength {rdlength}")]
    BadRdLength { record_type: RecordType, rdlength: u16 },

    #[error("no usable answer record")]
    NoAnswer,
}

/// Whether the response echoes exactly one question naming `query_name`.
pub fn question_matches(header: &Header, msg: &[u8], query_name: &str) -> bool {
    if header.qdcount != 1 {
        return false;
    }
    match decode_name(msg, HEADER_LEN) {
        Ok((name, _)) => name.eq_ignore_ascii_case(query_name),
        Err(e) => {
            debug!(error = %e, "Undecodable question name");
            false
        }
    }
}

/// Walks the answer section and returns the first record answering a
/// `wanted` query. CNAMEs and unrelated record types are stepped over.
pub fn first_answer(
    header: &Header,
    msg: &[u8],
    wanted: RecordType,
) -> Result<Answer, AnswerError> {
    let mut pos = HEADER_LEN;
    for _ in 0..header.qdcount {
        pos += skip_name(msg, pos)? + QUESTION_FIXED_LEN;
    }

    for _ in 0..header.ancount {
        if pos >= msg.len() {
            break;
        }
        pos += skip_name(msg, pos)?;
        let rr = RecordHeader::parse(msg, pos)?;
        let rdata_end = rr.rdata_end(msg, pos)?;
        let rdata_at = pos + RR_FIXED_LEN;
        let rdata = &msg[rdata_at..rdata_end];

        match rr.record_type() {
            Some(found @ (RecordType::A | RecordType::AAAA | RecordType::PTR)) => {
                if found != wanted {
                    return Err(AnswerError::TypeMismatch { wanted, found });
                }
                return match found {
                    RecordType::A => <[u8; 4]>::try_from(rdata)
                        .map(|octets| Answer::Address(IpAddr::V4(Ipv4Addr::from(octets))))
                        .map_err(|_| AnswerError::BadRdLength {
                            record_type: found,
                            rdlength: rr.rdlength,
                        }),
                    RecordType::AAAA => <[u8; 16]>::try_from(rdata)
                        .map(|octets| Answer::Address(IpAddr::V6(Ipv6Addr::from(octets))))
                        .map_err(|_| AnswerError::BadRdLength {
                            record_type: found,
                            rdlength: rr.rdlength,
                        }),
                    _ => {
                        let (name, _) = decode_name(msg, rdata_at)?;
                        Ok(Answer::Pointer(name))
                    }
                };
            }
            Some(RecordType::CNAME) => {}
            other => {
                debug!(
                    rtype = rr.rtype,
                    known = ?other,
                    "Skipping unexpected answer record"
                );
            }
        }
        pos = rdata_end;
    }

    Err(AnswerError::NoAnswer)
}
