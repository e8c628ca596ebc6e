// Byte-level helpers for little-endian container fields

/// Read a little-endian 16-bit integer at a byte offset
pub fn read_le_u16_at(buffer: &[u8], offset: usize) -> Option<u16> {
    buffer
        .get(offset..offset + 2)
        .map(|b| u16::from_le_bytes(b.try_into().unwrap()))
}

/// Read a little-endian 32-bit integer at a byte offset
pub fn read_le_u32_at(buffer: &[u8], offset: usize) -> Option<u32> {
    buffer
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
}

/// Write a little-endian 32-bit integer at a byte offset
///
/// The caller guarantees the buffer holds at least `offset + 4` bytes.
pub fn write_le_u32_at(buffer: &mut [u8], offset: usize, value: u32) {
    buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_le_fields() {
        let buffer = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
        assert_eq!(read_le_u16_at(&buffer, 0), Some(0x0201));
        assert_eq!(read_le_u32_at(&buffer, 1), Some(0x05040302));
        assert_eq!(read_le_u32_at(&buffer, 6), None);
    }

    #[test]
    fn test_write_le_u32() {
        let mut buffer = [0u8; 8];
        write_le_u32_at(&mut buffer, 2, 0xaabbccdd);
        assert_eq!(buffer, [0, 0, 0xdd, 0xcc, 0xbb, 0xaa, 0, 0]);
        assert_eq!(read_le_u32_at(&buffer, 2), Some(0xaabbccdd));
    }
}
