// Ogg page building, parsing and in-place patching
//
// One shared implementation serves both the incremental writer and the
// re-stamper, so the binary layout lives in exactly one place.

use std::io::Read;

use crate::error::MuxerError;
use crate::ogg::crc::Crc32;
use crate::ogg::lacing::build_lacing_table;
use crate::ogg::{
    OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION, OGG_HEADER_TYPE_EOS, OGG_SIGNATURE,
};
use crate::utils::io::{read_le_u32_at, write_le_u32_at};

/// Fixed page header size up to the segment table
pub const PAGE_HEADER_SIZE: usize = 27;

// Fixed field offsets within a page buffer
pub(crate) const HEADER_TYPE_OFFSET: usize = 5;
pub(crate) const SERIAL_OFFSET: usize = 14;
pub(crate) const SEQUENCE_OFFSET: usize = 18;
pub(crate) const CRC_OFFSET: usize = 22;

/// Ogg page header
#[derive(Debug, Clone)]
pub struct OggPageHeader {
    pub version: u8,
    pub header_type: u8,
    pub granule_position: u64,
    pub serial_number: u32,
    pub sequence_number: u32,
    pub crc: u32,
    pub segment_table: Vec<u8>,
}

impl OggPageHeader {
    /// Read an Ogg page header from a reader
    pub fn read<R: Read>(reader: &mut R) -> Option<Self> {
        let mut header = [0u8; PAGE_HEADER_SIZE];
        if reader.read_exact(&mut header).is_err() {
            return None;
        }

        // Check Ogg signature
        if &header[0..4] != OGG_SIGNATURE {
            return None;
        }

        let version = header[4];
        if version != 0 {
            return None;
        }

        let header_type = header[5];
        let granule_position = u64::from_le_bytes(header[6..14].try_into().unwrap());
        let serial_number = u32::from_le_bytes(header[14..18].try_into().unwrap());
        let sequence_number = u32::from_le_bytes(header[18..22].try_into().unwrap());
        let crc = u32::from_le_bytes(header[22..26].try_into().unwrap());
        let segment_count = header[26];

        // Read segment table
        let mut segment_table = vec![0u8; segment_count as usize];
        if reader.read_exact(&mut segment_table).is_err() {
            return None;
        }

        Some(OggPageHeader {
            version,
            header_type,
            granule_position,
            serial_number,
            sequence_number,
            crc,
            segment_table,
        })
    }

    /// Total payload size described by the segment table
    pub fn payload_size(&self) -> usize {
        self.segment_table.iter().map(|&x| x as usize).sum()
    }

    pub fn is_continuation(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_CONTINUATION != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_EOS != 0
    }

    /// Decode the segment table back into packet lengths
    ///
    /// A final length is reported even when the last lacing value is 255,
    /// meaning the packet continues on the following page.
    pub fn packet_lengths(&self) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut current = 0usize;
        for &lace in &self.segment_table {
            current += lace as usize;
            if lace < 255 {
                lengths.push(current);
                current = 0;
            }
        }
        if current > 0 {
            lengths.push(current);
        }
        lengths
    }
}

/// A parsed Ogg page
#[derive(Debug, Clone)]
pub struct OggPage {
    pub header: OggPageHeader,
    pub data: Vec<u8>,
}

impl OggPage {
    /// Read one Ogg page from a reader
    pub fn read<R: Read>(reader: &mut R) -> Option<Self> {
        let header = OggPageHeader::read(reader)?;

        let data_size = header.payload_size();
        let mut data = vec![0u8; data_size];
        if reader.read_exact(&mut data).is_err() {
            return None;
        }

        Some(OggPage { header, data })
    }

    /// Read every remaining page from a reader
    pub fn read_all<R: Read>(reader: &mut R) -> Vec<Self> {
        let mut pages = Vec::new();
        while let Some(page) = Self::read(reader) {
            pages.push(page);
        }
        pages
    }

    /// Reassemble the exact page bytes, stored checksum included
    pub fn as_bytes(&self) -> Vec<u8> {
        let header = &self.header;
        let mut buffer =
            Vec::with_capacity(PAGE_HEADER_SIZE + header.segment_table.len() + self.data.len());
        buffer.extend_from_slice(OGG_SIGNATURE);
        buffer.push(header.version);
        buffer.push(header.header_type);
        buffer.extend_from_slice(&header.granule_position.to_le_bytes());
        buffer.extend_from_slice(&header.serial_number.to_le_bytes());
        buffer.extend_from_slice(&header.sequence_number.to_le_bytes());
        buffer.extend_from_slice(&header.crc.to_le_bytes());
        buffer.push(header.segment_table.len() as u8);
        buffer.extend_from_slice(&header.segment_table);
        buffer.extend_from_slice(&self.data);
        buffer
    }

    /// Recompute the checksum over this page with the CRC field zeroed
    pub fn compute_checksum(&self, crc: &Crc32) -> u32 {
        let mut bytes = self.as_bytes();
        bytes[CRC_OFFSET..CRC_OFFSET + 4].fill(0);
        crc.checksum(&bytes)
    }

    /// True when the stored checksum matches the page contents
    pub fn checksum_valid(&self, crc: &Crc32) -> bool {
        self.compute_checksum(crc) == self.header.crc
    }
}

/// Assemble a complete page from whole packets
///
/// Writes the fixed 27-byte header, the lacing table and the concatenated
/// packet bytes, then computes the checksum over the assembled buffer with
/// the CRC field zeroed and writes it back at offset 22.
pub fn build_page(
    crc: &Crc32,
    packets: &[&[u8]],
    granule_position: u64,
    bos: bool,
    eos: bool,
    serial_number: u32,
    sequence_number: u32,
) -> Result<Vec<u8>, MuxerError> {
    let segment_table = build_lacing_table(packets)?;
    let payload_size: usize = packets.iter().map(|p| p.len()).sum();

    let mut header_type = 0u8;
    if bos {
        header_type |= OGG_HEADER_TYPE_BOS;
    }
    if eos {
        header_type |= OGG_HEADER_TYPE_EOS;
    }

    let mut buffer = Vec::with_capacity(PAGE_HEADER_SIZE + segment_table.len() + payload_size);
    buffer.extend_from_slice(OGG_SIGNATURE);
    buffer.push(0); // version
    buffer.push(header_type);
    buffer.extend_from_slice(&granule_position.to_le_bytes());
    buffer.extend_from_slice(&serial_number.to_le_bytes());
    buffer.extend_from_slice(&sequence_number.to_le_bytes());
    buffer.extend_from_slice(&[0, 0, 0, 0]); // checksum, backpatched below
    buffer.push(segment_table.len() as u8);
    buffer.extend_from_slice(&segment_table);
    for packet in packets {
        buffer.extend_from_slice(packet);
    }

    refresh_checksum(&mut buffer, crc);
    Ok(buffer)
}

/// Read the serial number field from a raw page buffer
pub fn read_serial_number(page: &[u8]) -> Option<u32> {
    read_le_u32_at(page, SERIAL_OFFSET)
}

/// Overwrite the serial number field in place
pub(crate) fn patch_serial_number(page: &mut [u8], serial_number: u32) {
    write_le_u32_at(page, SERIAL_OFFSET, serial_number);
}

/// Overwrite the page sequence number field in place
pub(crate) fn patch_sequence_number(page: &mut [u8], sequence_number: u32) {
    write_le_u32_at(page, SEQUENCE_OFFSET, sequence_number);
}

/// Set the end-of-stream bit in the header type field
pub(crate) fn set_end_of_stream(page: &mut [u8]) {
    page[HEADER_TYPE_OFFSET] |= OGG_HEADER_TYPE_EOS;
}

/// Clear the BOS and EOS bits, keeping a continuation bit if present
pub(crate) fn clear_stream_flags(page: &mut [u8]) {
    page[HEADER_TYPE_OFFSET] &= OGG_HEADER_TYPE_CONTINUATION;
}

/// Zero the checksum field and write a freshly computed value
pub(crate) fn refresh_checksum(page: &mut [u8], crc: &Crc32) {
    page[CRC_OFFSET..CRC_OFFSET + 4].fill(0);
    let value = crc.checksum(page);
    write_le_u32_at(page, CRC_OFFSET, value);
}
