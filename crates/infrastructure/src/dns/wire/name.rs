//! Domain names: presentation text <-> uncompressed wire labels, message
//! decompression and suffix compression on encode.
//!
//! The uncompressed wire form (`len label ... 0`) is the pivot between the
//! two directions. Decoding never trusts the message: every pointer must
//! land inside the message at an earlier offset, every label must end
//! before the message does, and the number of bytes examined is bounded
//! by the message length so a crafted pointer chain cannot spin forever.

use super::{MAX_LABEL_LEN, MAX_NAME_LEN, MAX_POINTER_OFFSET};
use smallvec::SmallVec;
use stubres_domain::WireError;

const POINTER_TAG: u8 = 0xC0;
const EXTENDED_TAG: u8 = 0x40;
const BITSTRING_LABEL: u8 = 0x41;

/// Bytes that must be backslash-escaped in presentation form.
const SPECIAL: &[u8] = b"\".;\\()@$";

/// Offsets tracked by a single message's compression table.
pub const MAX_COMPRESSION_ENTRIES: usize = 20;

/// A name in uncompressed wire form, terminator included.
pub type WireName = SmallVec<[u8; 64]>;

/// Parses presentation text into uncompressed wire form.
///
/// Accepts `\X` for any literal byte and `\DDD` for a decimal byte value.
/// A single trailing dot is optional; `"."` and `""` both denote the root.
pub fn name_to_wire(text: &str) -> Result<WireName, WireError> {
    let src = text.as_bytes();
    let mut out = WireName::new();
    let mut label = SmallVec::<[u8; 64]>::new();
    let mut i = 0;

    while i < src.len() {
        let c = src[i];
        i += 1;

        match c {
            b'\\' => {
                let next = *src.get(i).ok_or(WireError::BadEscape)?;
                if next == b'[' {
                    // bitstring labels are decoded but never produced
                    return Err(WireError::BadEscape);
                }
                if next.is_ascii_digit() {
                    let digits = src.get(i..i + 3).ok_or(WireError::BadEscape)?;
                    if !digits.iter().all(u8::is_ascii_digit) {
                        return Err(WireError::BadEscape);
                    }
                    let value = digits
                        .iter()
                        .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
                    if value > 255 {
                        return Err(WireError::BadEscape);
                    }
                    label.push(value as u8);
                    i += 3;
                } else {
                    label.push(next);
                    i += 1;
                }
            }
            b'.' => {
                if label.is_empty() {
                    // a lone "." is the root; anything else is ".." or ".x"
                    if i == 1 && src.len() == 1 {
                        break;
                    }
                    return Err(WireError::EmptyLabel);
                }
                push_label(&mut out, &label)?;
                label.clear();
            }
            _ => label.push(c),
        }

        if label.len() > MAX_LABEL_LEN {
            return Err(WireError::LabelTooLong);
        }
    }

    if !label.is_empty() {
        push_label(&mut out, &label)?;
    }
    if out.len() + 1 > MAX_NAME_LEN {
        return Err(WireError::NameTooLong);
    }
    out.push(0);
    Ok(out)
}

fn push_label(out: &mut WireName, label: &[u8]) -> Result<(), WireError> {
    if out.len() + label.len() + 1 >= MAX_NAME_LEN {
        return Err(WireError::NameTooLong);
    }
    out.push(label.len() as u8);
    out.extend_from_slice(label);
    Ok(())
}

/// Renders uncompressed wire form as presentation text without a trailing
/// dot. The root renders as `"."`.
pub fn wire_to_text(wire: &[u8]) -> Result<String, WireError> {
    let mut out = String::new();
    let mut pos = 0;

    loop {
        let n = *wire.get(pos).ok_or(WireError::Truncated(pos))?;
        if n == 0 {
            break;
        }
        if !out.is_empty() {
            out.push('.');
        }

        let len = label_len(wire, pos)?;
        let body = wire
            .get(pos + 1..pos + 1 + len)
            .ok_or(WireError::LabelOverrun(pos))?;

        if n == BITSTRING_LABEL {
            push_bitstring(&mut out, body);
        } else {
            for &b in body {
                push_escaped(&mut out, b);
            }
        }
        pos += 1 + len;
    }

    if out.is_empty() {
        out.push('.');
    }
    Ok(out)
}

fn push_escaped(out: &mut String, b: u8) {
    if SPECIAL.contains(&b) {
        out.push('\\');
        out.push(b as char);
    } else if (0x21..=0x7E).contains(&b) {
        out.push(b as char);
    } else {
        out.push_str(&format!("\\{:03}", b));
    }
}

/// `body` is the bit count byte followed by the packed bits.
fn push_bitstring(out: &mut String, body: &[u8]) {
    let Some((&count, bits)) = body.split_first() else {
        return;
    };
    let bit_len: usize = if count == 0 { 256 } else { count as usize };

    out.push_str("\\[x");
    let mut remaining = bit_len;
    let mut bytes = bits.iter();
    while remaining > 7 {
        if let Some(b) = bytes.next() {
            out.push_str(&format!("{:02x}", b));
        }
        remaining -= 8;
    }
    if let Some(&b) = bytes.next() {
        if remaining > 4 {
            out.push_str(&format!("{:02x}", b & (0xffu8 << (8 - remaining))));
        } else if remaining > 0 {
            out.push_str(&format!("{:x}", (b >> 4) & (0x0fu8 << (4 - remaining)) & 0x0f));
        }
    }
    out.push_str(&format!("/{}]", bit_len));
}

/// Length of the label body at `pos`, excluding the length/type byte.
fn label_len(buf: &[u8], pos: usize) -> Result<usize, WireError> {
    let n = *buf.get(pos).ok_or(WireError::Truncated(pos))?;
    match n & POINTER_TAG {
        0 => Ok(n as usize),
        EXTENDED_TAG if n == BITSTRING_LABEL => {
            let count = *buf.get(pos + 1).ok_or(WireError::Truncated(pos + 1))?;
            let bits = if count == 0 { 256 } else { count as usize };
            Ok(bits.div_ceil(8) + 1)
        }
        _ => Err(WireError::UnknownLabelType(n)),
    }
}

/// Walks the name at `start`, following compression pointers. Labels are
/// appended to `out` when given. Returns the bytes the name occupies at
/// `start` in the message.
fn walk(msg: &[u8], start: usize, mut out: Option<&mut WireName>) -> Result<usize, WireError> {
    let mut pos = start;
    let mut consumed: Option<usize> = None;
    let mut checked = 0usize;
    let mut written = 0usize;

    loop {
        let n = *msg.get(pos).ok_or(WireError::Truncated(pos))?;

        match n & POINTER_TAG {
            0 | EXTENDED_TAG => {
                if n == 0 {
                    pos += 1;
                    break;
                }
                let len = label_len(msg, pos)?;
                if written + len + 1 >= MAX_NAME_LEN {
                    return Err(WireError::NameTooLong);
                }
                // the terminator or next label must still follow
                if pos + 1 + len >= msg.len() {
                    return Err(WireError::LabelOverrun(pos));
                }
                if let Some(out) = out.as_deref_mut() {
                    out.extend_from_slice(&msg[pos..pos + 1 + len]);
                }
                written += len + 1;
                checked += len + 1;
                pos += len + 1;
            }
            POINTER_TAG => {
                let low = *msg.get(pos + 1).ok_or(WireError::Truncated(pos + 1))?;
                if consumed.is_none() {
                    consumed = Some(pos + 2 - start);
                }
                let target = (((n & 0x3F) as usize) << 8) | low as usize;
                if target >= msg.len() || target >= pos {
                    return Err(WireError::PointerOutOfRange(target));
                }
                checked += 2;
                if checked >= msg.len() {
                    return Err(WireError::CompressionLoop);
                }
                pos = target;
            }
            _ => return Err(WireError::UnknownLabelType(n)),
        }
    }

    if let Some(out) = out {
        out.push(0);
    }
    Ok(consumed.unwrap_or_else(|| pos - start))
}

/// Decodes the (possibly compressed) name at `pos` into presentation text.
///
/// Returns the text and the number of bytes the name occupies at `pos`,
/// which for a compressed name ends just after the first pointer.
pub fn decode_name(msg: &[u8], pos: usize) -> Result<(String, usize), WireError> {
    let mut wire = WireName::new();
    let consumed = walk(msg, pos, Some(&mut wire))?;
    Ok((wire_to_text(&wire)?, consumed))
}

/// Bytes occupied by the name at `pos`, validated the same way
/// [`decode_name`] validates it.
pub fn skip_name(msg: &[u8], pos: usize) -> Result<usize, WireError> {
    walk(msg, pos, None)
}

/// Normalizes presentation text: escapes are resolved and re-applied and
/// a trailing dot is dropped.
pub fn canonicalize(text: &str) -> Result<String, WireError> {
    wire_to_text(&name_to_wire(text)?)
}

/// Offsets of names already written to a message, used as compression
/// targets by later names.
#[derive(Debug, Default, Clone)]
pub struct CompressionTable {
    offsets: SmallVec<[usize; MAX_COMPRESSION_ENTRIES]>,
}

impl CompressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Appends `wire` to `msg`, replacing the longest suffix already present
    /// in the table with a pointer. The first label written is remembered
    /// while the table has room and its offset fits in a pointer.
    pub fn pack(&mut self, wire: &[u8], msg: &mut Vec<u8>) -> Result<(), WireError> {
        let mut pos = 0;
        let mut first = true;

        loop {
            let n = *wire.get(pos).ok_or(WireError::Truncated(pos))?;
            if n == 0 {
                msg.push(0);
                return Ok(());
            }
            if n & POINTER_TAG != 0 {
                return Err(WireError::UnknownLabelType(n));
            }

            let suffix = &wire[pos..];
            if let Some(target) = self.find(suffix, msg) {
                msg.extend_from_slice(&(0xC000 | target as u16).to_be_bytes());
                return Ok(());
            }

            if first
                && self.offsets.len() < MAX_COMPRESSION_ENTRIES
                && msg.len() <= MAX_POINTER_OFFSET
            {
                self.offsets.push(msg.len());
            }
            first = false;

            let len = n as usize;
            let label = wire
                .get(pos..pos + 1 + len)
                .ok_or(WireError::LabelOverrun(pos))?;
            msg.extend_from_slice(label);
            pos += 1 + len;
        }
    }

    /// Offset of a name in `msg` spelling exactly `suffix`, checking every
    /// suffix of every remembered name.
    fn find(&self, suffix: &[u8], msg: &[u8]) -> Option<usize> {
        for &start in &self.offsets {
            let mut sp = start;
            while let Some(&n) = msg.get(sp) {
                if n == 0 || n & POINTER_TAG != 0 || sp > MAX_POINTER_OFFSET {
                    break;
                }
                if matches_at(suffix, msg, sp) {
                    return Some(sp);
                }
                sp += n as usize + 1;
            }
        }
        None
    }
}

/// Case-insensitive comparison of `name` (uncompressed) with the name
/// stored at `pos`, following pointers.
fn matches_at(name: &[u8], msg: &[u8], mut pos: usize) -> bool {
    let mut np = 0;
    let mut hops = 0;

    loop {
        let Some(&n) = msg.get(pos) else {
            return false;
        };

        match n & POINTER_TAG {
            0 => {
                if n == 0 {
                    return name.get(np) == Some(&0);
                }
                let len = n as usize;
                if name.get(np) != Some(&n) {
                    return false;
                }
                let (Some(ours), Some(theirs)) = (
                    name.get(np + 1..np + 1 + len),
                    msg.get(pos + 1..pos + 1 + len),
                ) else {
                    return false;
                };
                if !ours.eq_ignore_ascii_case(theirs) {
                    return false;
                }
                np += 1 + len;
                pos += 1 + len;
            }
            POINTER_TAG => {
                let Some(&low) = msg.get(pos + 1) else {
                    return false;
                };
                hops += 1;
                if hops > MAX_NAME_LEN {
                    return false;
                }
                pos = (((n & 0x3F) as usize) << 8) | low as usize;
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_to_wire_basic() {
        assert_eq!(
            name_to_wire("www.example.com").unwrap().as_slice(),
            b"\x03www\x07example\x03com\x00"
        );
        assert_eq!(
            name_to_wire("www.example.com.").unwrap(),
            name_to_wire("www.example.com").unwrap()
        );
    }

    #[test]
    fn test_root_forms() {
        assert_eq!(name_to_wire(".").unwrap().as_slice(), b"\x00");
        assert_eq!(name_to_wire("").unwrap().as_slice(), b"\x00");
        assert_eq!(wire_to_text(b"\x00").unwrap(), ".");
    }

    #[test]
    fn test_empty_labels_are_rejected() {
        assert_eq!(name_to_wire("a..b"), Err(WireError::EmptyLabel));
        assert_eq!(name_to_wire(".a"), Err(WireError::EmptyLabel));
        assert_eq!(name_to_wire(".."), Err(WireError::EmptyLabel));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(name_to_wire("a\\.b").unwrap().as_slice(), b"\x03a.b\x00");
        assert_eq!(name_to_wire("\\065").unwrap().as_slice(), b"\x01A\x00");
        assert_eq!(name_to_wire("\\256"), Err(WireError::BadEscape));
        assert_eq!(name_to_wire("\\06"), Err(WireError::BadEscape));
        assert_eq!(name_to_wire("abc\\"), Err(WireError::BadEscape));
        assert_eq!(name_to_wire("\\[x01/8]"), Err(WireError::BadEscape));
    }

    #[test]
    fn test_label_and_name_limits() {
        let label = "a".repeat(63);
        assert!(name_to_wire(&label).is_ok());
        assert_eq!(name_to_wire(&"a".repeat(64)), Err(WireError::LabelTooLong));

        // 4 * (1 + 63) = 256 octets before the terminator
        let long = [label.as_str(); 4].join(".");
        assert_eq!(name_to_wire(&long), Err(WireError::NameTooLong));
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(wire_to_text(b"\x03a.b\x00").unwrap(), "a\\.b");
        assert_eq!(wire_to_text(b"\x02a\"\x00").unwrap(), "a\\\"");
        assert_eq!(wire_to_text(b"\x02\x00\x7f\x00").unwrap(), "\\000\\127");
        assert_eq!(wire_to_text(b"\x01 \x00").unwrap(), "\\032");
    }

    #[test]
    fn test_bitstring_rendering() {
        assert_eq!(wire_to_text(b"\x41\x08\xab\x00").unwrap(), "\\[xab/8]");
        assert_eq!(wire_to_text(b"\x41\x0c\xab\xc0\x00").unwrap(), "\\[xabc/12]");
        assert_eq!(wire_to_text(b"\x41\x06\xfc\x00").unwrap(), "\\[xfc/6]");
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("Example.COM.").unwrap(), "Example.COM");
        assert_eq!(canonicalize("\\065bc").unwrap(), "Abc");
    }

    #[test]
    fn test_pack_reuses_suffix() {
        let mut msg = vec![0u8; 12];
        let mut table = CompressionTable::new();

        table
            .pack(&name_to_wire("www.example.com").unwrap(), &mut msg)
            .unwrap();
        assert_eq!(msg.len(), 12 + 17);
        assert_eq!(table.len(), 1);

        table
            .pack(&name_to_wire("mail.EXAMPLE.com").unwrap(), &mut msg)
            .unwrap();
        // "mail" then a pointer to "example.com" at offset 16
        assert_eq!(&msg[29..], b"\x04mail\xc0\x10");

        table
            .pack(&name_to_wire("www.example.com").unwrap(), &mut msg)
            .unwrap();
        assert_eq!(&msg[36..], b"\xc0\x0c");
    }

    #[test]
    fn test_decode_follows_pointers() {
        let mut msg = vec![0u8; 12];
        let mut table = CompressionTable::new();
        table
            .pack(&name_to_wire("dns.google").unwrap(), &mut msg)
            .unwrap();
        let second = msg.len();
        table
            .pack(&name_to_wire("ns1.dns.google").unwrap(), &mut msg)
            .unwrap();

        let (name, used) = decode_name(&msg, second).unwrap();
        assert_eq!(name, "ns1.dns.google");
        assert_eq!(used, 6);
        assert_eq!(skip_name(&msg, second), Ok(6));
        assert_eq!(skip_name(&msg, 12), Ok(12));
    }

    #[test]
    fn test_pointer_far_behind_the_name() {
        let mut msg = vec![0u8; 12];
        msg.extend_from_slice(b"\x01a\x01b\x00");
        msg.resize(40, 0);
        msg.extend_from_slice(&[0xC0, 0x0C]);

        assert_eq!(decode_name(&msg, 40), Ok(("a.b".to_string(), 2)));
        assert_eq!(skip_name(&msg, 40), Ok(2));
    }

    #[test]
    fn test_pointer_loops_fail() {
        let mut msg = vec![0u8; 12];
        msg.extend_from_slice(&[0xC0, 0x0C]);
        assert_eq!(
            decode_name(&msg, 12),
            Err(WireError::PointerOutOfRange(12))
        );

        let mut msg = vec![0u8; 12];
        msg.extend_from_slice(&[0x01, b'a', 0xC0, 0x0C]);
        assert_eq!(decode_name(&msg, 12), Err(WireError::CompressionLoop));
        assert_eq!(skip_name(&msg, 12), Err(WireError::CompressionLoop));

        let mut msg = vec![0u8; 12];
        msg.extend_from_slice(&[0xC0, 0x0E, 0xC0, 0x0C]);
        assert!(decode_name(&msg, 12).is_err());
        assert!(skip_name(&msg, 14).is_err());
    }

    #[test]
    fn test_pointer_past_end_fails() {
        let mut msg = vec![0u8; 12];
        msg.extend_from_slice(&[0x01, b'a', 0xC0, 0xFF]);
        assert_eq!(
            decode_name(&msg, 12),
            Err(WireError::PointerOutOfRange(0xFF))
        );
    }

    #[test]
    fn test_label_overrun_fails() {
        let mut msg = vec![0u8; 12];
        msg.extend_from_slice(&[0x05, b'a', b'b']);
        assert_eq!(decode_name(&msg, 12), Err(WireError::LabelOverrun(12)));
    }

    #[test]
    fn test_unknown_label_type_fails() {
        let mut msg = vec![0u8; 12];
        msg.extend_from_slice(&[0x80, 0x00]);
        assert_eq!(
            decode_name(&msg, 12),
            Err(WireError::UnknownLabelType(0x80))
        );
    }
}
