// Ogg bitstream framing (RFC 3533)
//
// Ogg Page Structure:
// - Page Header (27 bytes)
//   - Capture Pattern: "OggS" (4 bytes)
//   - Version: 0 (1 byte)
//   - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
//   - Granule Position (8 bytes, little-endian)
//   - Bitstream Serial Number (4 bytes, little-endian)
//   - Page Sequence Number (4 bytes, little-endian)
//   - CRC Checksum (4 bytes, little-endian)
//   - Number of Page Segments (1 byte)
//   - Segment Table (variable)
// - Payload (concatenated segment data)

pub mod crc;
pub mod lacing;
pub mod page;

// Ogg signature
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";

// Ogg page header types
pub const OGG_HEADER_TYPE_CONTINUATION: u8 = 0x01;
pub const OGG_HEADER_TYPE_BOS: u8 = 0x02; // Beginning of Stream
pub const OGG_HEADER_TYPE_EOS: u8 = 0x04; // End of Stream
