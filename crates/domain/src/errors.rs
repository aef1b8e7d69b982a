use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Unsupported record type for this lookup: {0}")]
    UnsupportedRecordType(String),

    #[error("Too many outstanding queries ({0} live)")]
    TransactionTableFull(usize),

    #[error("Could not pick an unused query id after {0} attempts")]
    IdSpaceExhausted(u32),

    #[error("Malformed DNS message: {0}")]
    Wire(#[from] WireError),

    #[error("I/O error: {0}")]
    IoError(String),
}

/// Structural failures of the wire codec.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("message truncated at offset {0}")]
    Truncated(usize),

    #[error("compression pointer to offset {0} is outside the message")]
    PointerOutOfRange(usize),

    #[error("compression loop detected")]
    CompressionLoop,

    #[error("label at offset {0} runs past the end of the message")]
    LabelOverrun(usize),

    #[error("unknown label type 0x{0:02x}")]
    UnknownLabelType(u8),

    #[error("label longer than 63 octets")]
    LabelTooLong,

    #[error("name longer than 255 octets")]
    NameTooLong,

    #[error("empty label in name")]
    EmptyLabel,

    #[error("invalid escape sequence in name")]
    BadEscape,

    #[error("output buffer too small")]
    BufferTooSmall,
}
