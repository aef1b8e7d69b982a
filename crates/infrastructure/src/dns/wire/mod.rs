//! RFC 1035 message encoding and decoding.
//!
//! Only the parts a stub resolver needs: the fixed header, domain names in
//! wire and presentation form (with compression in both directions), query
//! construction and the fixed part of resource records.

pub mod bytes;
pub mod header;
pub mod message_builder;
pub mod name;
pub mod query;
pub mod record;

pub use header::{Header, HEADER_LEN};
pub use message_builder::MessageBuilder;
pub use name::{canonicalize, decode_name, name_to_wire, skip_name, wire_to_text, CompressionTable};
pub use query::{encode_query, MAX_ID_ATTEMPTS};
pub use record::{RecordHeader, QUESTION_FIXED_LEN, RR_FIXED_LEN};

/// Largest response the resolver reads from the socket.
pub const MAX_DATAGRAM_SIZE: usize = HEADER_LEN + 1024;

/// Upper bound on an encoded domain name, terminator included.
pub const MAX_NAME_LEN: usize = 255;

pub const MAX_LABEL_LEN: usize = 63;

/// Compression targets must fit in the 14 offset bits of a pointer.
pub const MAX_POINTER_OFFSET: usize = 0x3FFF;
