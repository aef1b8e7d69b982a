//! Big-endian integer access into message buffers.

use stubres_domain::WireError;

#[inline]
pub fn get16(buf: &[u8], pos: usize) -> Result<u16, WireError> {
    match buf.get(pos..pos + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(WireError::Truncated(pos)),
    }
}

#[inline]
pub fn get32(buf: &[u8], pos: usize) -> Result<u32, WireError> {
    match buf.get(pos..pos + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(WireError::Truncated(pos)),
    }
}

#[inline]
pub fn put16(buf: &mut [u8], pos: usize, value: u16) -> Result<(), WireError> {
    let dst = buf
        .get_mut(pos..pos + 2)
        .ok_or(WireError::BufferTooSmall)?;
    dst.copy_from_slice(&value.to_be_bytes());
    Ok(())
}

#[inline]
pub fn put32(buf: &mut [u8], pos: usize, value: u32) -> Result<(), WireError> {
    let dst = buf
        .get_mut(pos..pos + 4)
        .ok_or(WireError::BufferTooSmall)?;
    dst.copy_from_slice(&value.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_reads_network_order() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9a];
        assert_eq!(get16(&buf, 0), Ok(0x1234));
        assert_eq!(get16(&buf, 3), Ok(0x789a));
        assert_eq!(get32(&buf, 1), Ok(0x3456_789a));
    }

    #[test]
    fn test_get_past_end_is_truncated() {
        let buf = [0u8; 3];
        assert_eq!(get16(&buf, 2), Err(WireError::Truncated(2)));
        assert_eq!(get32(&buf, 0), Err(WireError::Truncated(0)));
    }

    #[test]
    fn test_put_writes_in_place() {
        let mut buf = [0u8; 6];
        put16(&mut buf, 0, 0xbeef).unwrap();
        put32(&mut buf, 2, 0x0102_0304).unwrap();
        assert_eq!(buf, [0xbe, 0xef, 1, 2, 3, 4]);
        assert_eq!(put32(&mut buf, 4, 1), Err(WireError::BufferTooSmall));
    }
}
