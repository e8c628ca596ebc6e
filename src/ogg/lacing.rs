// Segment table (lacing) encoding
//
// Each packet is described by one 255-valued lacing byte per full
// 255-byte run, terminated by a byte holding the remainder. A packet
// whose length is an exact multiple of 255 ends with an explicit 0 entry
// so decoders can tell "ends on 255" from "continues on the next page".

use crate::error::MuxerError;

/// Maximum number of lacing entries in a single page (one-byte count field)
pub const MAX_SEGMENTS_PER_PAGE: usize = 255;

/// Largest single packet that fits one page: 254 full segments plus a
/// 254-byte terminator
pub const MAX_PACKET_SIZE: usize = 254 * 255 + 254;

/// Build the lacing byte sequence for a sequence of whole packets
///
/// The sum of one packet's lacing values always equals its byte length.
/// Fails with `PageOverflow` when the combined packets need more than 255
/// entries; callers must pre-chunk oversized frames.
pub fn build_lacing_table(packets: &[&[u8]]) -> Result<Vec<u8>, MuxerError> {
    let mut table = Vec::new();
    for packet in packets {
        let entries = packet.len() / 255 + 1;
        if table.len() + entries > MAX_SEGMENTS_PER_PAGE {
            return Err(MuxerError::PageOverflow {
                packet_size: packet.len(),
            });
        }
        let mut remaining = packet.len();
        while remaining >= 255 {
            table.push(255);
            remaining -= 255;
        }
        table.push(remaining as u8);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_packet() {
        assert_eq!(build_lacing_table(&[&[0u8; 20]]).unwrap(), vec![20]);
    }

    #[test]
    fn test_exact_multiple_gets_trailing_zero() {
        assert_eq!(build_lacing_table(&[&[0u8; 255]]).unwrap(), vec![255, 0]);
        assert_eq!(
            build_lacing_table(&[&[0u8; 510]]).unwrap(),
            vec![255, 255, 0]
        );
    }

    #[test]
    fn test_run_with_remainder() {
        assert_eq!(build_lacing_table(&[&[0u8; 256]]).unwrap(), vec![255, 1]);
    }

    #[test]
    fn test_multiple_packets_concatenate() {
        let a = [0u8; 200];
        let b = [0u8; 300];
        assert_eq!(
            build_lacing_table(&[&a, &b]).unwrap(),
            vec![200, 255, 45]
        );
    }

    #[test]
    fn test_largest_packet_fits() {
        let packet = vec![0u8; MAX_PACKET_SIZE];
        let table = build_lacing_table(&[&packet]).unwrap();
        assert_eq!(table.len(), MAX_SEGMENTS_PER_PAGE);
        assert_eq!(
            table.iter().map(|&x| x as usize).sum::<usize>(),
            MAX_PACKET_SIZE
        );
    }

    #[test]
    fn test_oversized_packet_rejected() {
        let packet = vec![0u8; MAX_PACKET_SIZE + 1];
        assert_eq!(
            build_lacing_table(&[&packet]),
            Err(MuxerError::PageOverflow {
                packet_size: MAX_PACKET_SIZE + 1
            })
        );
    }
}
