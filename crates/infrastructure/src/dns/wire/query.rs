use super::header::Header;
use super::message_builder::MessageBuilder;
use super::name::name_to_wire;
use stubres_domain::{DnsClass, DomainError, RecordType};

/// Random ids tried before giving up on finding one not already in use.
pub const MAX_ID_ATTEMPTS: u32 = 64;

/// Builds a recursive query for `name` and returns it with its id.
///
/// The id is drawn at random and redrawn while `id_in_use` reports a
/// collision with an outstanding query.
pub fn encode_query(
    name: &str,
    record_type: RecordType,
    class: DnsClass,
    id_in_use: impl Fn(u16) -> bool,
) -> Result<(Vec<u8>, u16), DomainError> {
    name_to_wire(name)
        .map_err(|e| DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", name, e)))?;

    let id = (0..MAX_ID_ATTEMPTS)
        .map(|_| fastrand::u16(..))
        .find(|id| !id_in_use(*id))
        .ok_or(DomainError::IdSpaceExhausted(MAX_ID_ATTEMPTS))?;

    let bytes = MessageBuilder::new(Header::query(id))
        .question(name, record_type.to_u16(), class.to_u16())?
        .finish();

    Ok((bytes, id))
}
