// Incremental Ogg/Opus muxing session
//
// A session owns the serial number, page sequence counter and granule
// position of exactly one logical stream. The two mandatory header pages
// are emitted at creation as sequences 0 and 1; every audio frame then
// becomes exactly one data page, and `finish` moves the EOS flag onto the
// true last page before concatenating everything.

pub mod restamp;

use log::debug;

use crate::error::MuxerError;
use crate::ogg::crc::Crc32;
use crate::ogg::page::{self, build_page};
use crate::opus::{build_comment_payload, OpusHead, DEFAULT_PRE_SKIP, VENDOR_STRING};

/// Samples per frame at 48 kHz for the common 20 ms Opus frame
pub const DEFAULT_FRAME_SAMPLES: u64 = 960;

/// MIME type of a finished stream
pub const OGG_OPUS_MIME_TYPE: &str = "audio/ogg; codecs=opus";

/// Fixed per-stream parameters
#[derive(Debug, Clone)]
pub struct StreamParams {
    /// Original input sample rate recorded in the identification header.
    /// Granule positions always count 48 kHz samples regardless.
    pub sample_rate: u32,
    pub channels: u8,
    /// Decoder-side priming skip in 48 kHz samples
    pub pre_skip: u16,
}

/// An in-progress Ogg/Opus stream
pub struct MuxerSession {
    params: StreamParams,
    crc: Crc32,
    serial_number: u32,
    sequence_number: u32,
    granule_position: u64,
    pages: Vec<Vec<u8>>,
    finished: bool,
}

impl MuxerSession {
    /// Create a session with a random serial number and default pre-skip
    pub fn new(sample_rate: u32, channels: u8) -> Self {
        Self::from_params(
            StreamParams {
                sample_rate,
                channels,
                pre_skip: DEFAULT_PRE_SKIP,
            },
            None,
        )
    }

    /// Create a session with a caller-chosen serial number
    ///
    /// Pinning the serial makes output reproducible byte for byte, which
    /// tests and stream-unification callers rely on.
    pub fn with_serial(sample_rate: u32, channels: u8, serial_number: u32) -> Self {
        Self::from_params(
            StreamParams {
                sample_rate,
                channels,
                pre_skip: DEFAULT_PRE_SKIP,
            },
            Some(serial_number),
        )
    }

    /// Create a session from explicit stream parameters
    ///
    /// `serial_number` pins the stream serial; `None` draws a random one.
    pub fn from_params(params: StreamParams, serial_number: Option<u32>) -> Self {
        let serial_number = serial_number.unwrap_or_else(rand::random);
        let mut session = MuxerSession {
            params,
            crc: Crc32::new(),
            serial_number,
            sequence_number: 0,
            granule_position: 0,
            pages: Vec::new(),
            finished: false,
        };
        session.write_header_pages();
        session
    }

    // Header pages always occupy sequences 0 and 1 with granule position 0.
    fn write_header_pages(&mut self) {
        let id_payload = OpusHead {
            channels: self.params.channels,
            pre_skip: self.params.pre_skip,
            input_sample_rate: self.params.sample_rate,
        }
        .to_bytes();
        let id_page = build_page(
            &self.crc,
            &[&id_payload],
            0,
            true,
            false,
            self.serial_number,
            self.sequence_number,
        )
        .expect("identification header fits a single page");
        self.pages.push(id_page);
        self.sequence_number += 1;

        let tags_payload = build_comment_payload(VENDOR_STRING);
        let tags_page = build_page(
            &self.crc,
            &[&tags_payload],
            0,
            false,
            false,
            self.serial_number,
            self.sequence_number,
        )
        .expect("comment header fits a single page");
        self.pages.push(tags_page);
        self.sequence_number += 1;
    }

    // Re-emit the header pages after the serial number changed.
    fn rebuild_header_pages(&mut self) {
        self.pages.clear();
        self.sequence_number = 0;
        self.write_header_pages();
    }

    /// Append one audio frame as one page
    ///
    /// `samples` is the frame duration in 48 kHz samples (960 for the
    /// common 20 ms frame). Each call emits exactly one page; packets are
    /// never packed together, so output matches the streaming path.
    pub fn write_frame(&mut self, frame: &[u8], samples: u64) -> Result<(), MuxerError> {
        self.ensure_active("write_frame")?;

        let granule_position = self.granule_position + samples;
        let data_page = build_page(
            &self.crc,
            &[frame],
            granule_position,
            false,
            false,
            self.serial_number,
            self.sequence_number,
        )?;

        debug!(
            "page seq={} granule={} payload={}B",
            self.sequence_number,
            granule_position,
            frame.len()
        );
        self.granule_position = granule_position;
        self.pages.push(data_page);
        self.sequence_number += 1;
        Ok(())
    }

    /// Append a batch of frames sharing one duration
    pub fn write_frames(&mut self, frames: &[Vec<u8>], samples_per_frame: u64) -> Result<(), MuxerError> {
        for frame in frames {
            self.write_frame(frame, samples_per_frame)?;
        }
        Ok(())
    }

    /// Finalize the stream and return the concatenated page bytes
    ///
    /// The EOS flag lands on the last data page; a session that never
    /// received audio gets one empty EOS page after the headers. A session
    /// can only be finished once.
    pub fn finish(&mut self) -> Result<Vec<u8>, MuxerError> {
        self.ensure_active("finish")?;
        self.finished = true;

        if self.pages.len() <= 2 {
            // No audio was written; close the stream with an empty page.
            let eos_page = build_page(
                &self.crc,
                &[],
                self.granule_position,
                false,
                true,
                self.serial_number,
                self.sequence_number,
            )?;
            self.pages.push(eos_page);
            self.sequence_number += 1;
        } else {
            let last = self.pages.len() - 1;
            page::set_end_of_stream(&mut self.pages[last]);
            page::refresh_checksum(&mut self.pages[last], &self.crc);
        }

        debug!(
            "finished stream serial={:#010x} pages={} granule={}",
            self.serial_number,
            self.pages.len(),
            self.granule_position
        );
        Ok(concatenate(&self.pages))
    }

    fn ensure_active(&self, operation: &str) -> Result<(), MuxerError> {
        if self.finished {
            return Err(MuxerError::InvalidSessionState(format!(
                "{} called on a finished session",
                operation
            )));
        }
        Ok(())
    }

    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    pub fn granule_position(&self) -> u64 {
        self.granule_position
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pages emitted so far, headers included
    pub fn pages(&self) -> &[Vec<u8>] {
        &self.pages
    }
}

/// Concatenate finalized pages into one contiguous stream buffer
pub fn concatenate(pages: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = pages.iter().map(|p| p.len()).sum();
    let mut buffer = Vec::with_capacity(total);
    for page in pages {
        buffer.extend_from_slice(page);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ogg::page::OggPage;
    use crate::opus::OPUS_TAGS_SIGNATURE;
    use std::io::Cursor;

    fn parse_stream(bytes: &[u8]) -> Vec<OggPage> {
        OggPage::read_all(&mut Cursor::new(bytes))
    }

    #[test]
    fn test_fresh_session_emits_canonical_headers() {
        let session = MuxerSession::with_serial(48_000, 1, 0x1234);
        let pages = session.pages();
        assert_eq!(pages.len(), 2);

        let id_page = OggPage::read(&mut Cursor::new(&pages[0])).unwrap();
        assert!(id_page.header.is_bos());
        assert!(!id_page.header.is_eos());
        assert_eq!(id_page.header.sequence_number, 0);
        assert_eq!(id_page.header.granule_position, 0);
        assert_eq!(
            OpusHead::parse(&id_page.data),
            Some(OpusHead {
                channels: 1,
                pre_skip: DEFAULT_PRE_SKIP,
                input_sample_rate: 48_000,
            })
        );

        let tags_page = OggPage::read(&mut Cursor::new(&pages[1])).unwrap();
        assert!(!tags_page.header.is_bos());
        assert_eq!(tags_page.header.sequence_number, 1);
        assert_eq!(tags_page.header.granule_position, 0);
        assert!(tags_page.data.starts_with(OPUS_TAGS_SIGNATURE));
    }

    #[test]
    fn test_pinned_serial_gives_identical_bytes() {
        let mut a = MuxerSession::with_serial(48_000, 2, 42);
        let mut b = MuxerSession::with_serial(48_000, 2, 42);
        a.write_frame(&[1, 2, 3], 960).unwrap();
        b.write_frame(&[1, 2, 3], 960).unwrap();
        assert_eq!(a.finish().unwrap(), b.finish().unwrap());
    }

    #[test]
    fn test_granule_accumulates_frame_samples() {
        let mut session = MuxerSession::with_serial(48_000, 1, 1);
        for samples in [960u64, 480, 960, 120] {
            session.write_frame(&[0u8; 8], samples).unwrap();
        }
        assert_eq!(session.granule_position(), 2520);
    }

    #[test]
    fn test_single_frame_stream_layout() {
        // One 20-byte frame of 960 samples: headers plus one EOS data page.
        let mut session = MuxerSession::with_serial(48_000, 1, 9);
        session.write_frame(&[7u8; 20], DEFAULT_FRAME_SAMPLES).unwrap();
        let stream = session.finish().unwrap();

        let pages = parse_stream(&stream);
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().filter(|p| p.header.is_eos()).count(),
            1
        );

        let data_page = &pages[2];
        assert!(data_page.header.is_eos());
        assert_eq!(data_page.header.sequence_number, 2);
        assert_eq!(data_page.header.granule_position, 960);
        assert_eq!(data_page.header.packet_lengths(), vec![20]);
    }

    #[test]
    fn test_every_page_checksum_recomputes() {
        let mut session = MuxerSession::with_serial(48_000, 2, 77);
        let frames: Vec<Vec<u8>> = (0u8..5).map(|i| vec![i; 40 + i as usize]).collect();
        session.write_frames(&frames, 960).unwrap();
        let stream = session.finish().unwrap();

        let crc = Crc32::new();
        let pages = parse_stream(&stream);
        assert_eq!(pages.len(), 7);
        for page in &pages {
            assert!(page.checksum_valid(&crc));
        }
    }

    #[test]
    fn test_eos_set_on_exactly_one_page() {
        let mut session = MuxerSession::with_serial(48_000, 1, 3);
        session
            .write_frames(&[vec![1u8; 10], vec![2u8; 10], vec![3u8; 10]], 960)
            .unwrap();
        let stream = session.finish().unwrap();

        let pages = parse_stream(&stream);
        let eos_positions: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.header.is_eos())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(eos_positions, vec![pages.len() - 1]);
    }

    #[test]
    fn test_empty_session_closes_with_empty_page() {
        let mut session = MuxerSession::with_serial(48_000, 1, 8);
        let stream = session.finish().unwrap();

        let pages = parse_stream(&stream);
        assert_eq!(pages.len(), 3);
        assert!(pages[2].header.is_eos());
        assert_eq!(pages[2].header.granule_position, 0);
        assert!(pages[2].data.is_empty());
        assert_eq!(pages[2].header.segment_table.len(), 0);
    }

    #[test]
    fn test_double_finish_fails_fast() {
        let mut session = MuxerSession::with_serial(48_000, 1, 5);
        session.finish().unwrap();
        assert!(matches!(
            session.finish(),
            Err(MuxerError::InvalidSessionState(_))
        ));
    }

    #[test]
    fn test_write_after_finish_fails_fast() {
        let mut session = MuxerSession::with_serial(48_000, 1, 5);
        session.write_frame(&[1u8; 4], 960).unwrap();
        session.finish().unwrap();
        assert!(matches!(
            session.write_frame(&[1u8; 4], 960),
            Err(MuxerError::InvalidSessionState(_))
        ));
    }

    #[test]
    fn test_oversized_frame_leaves_state_untouched() {
        let mut session = MuxerSession::with_serial(48_000, 1, 5);
        let oversized = vec![0u8; crate::ogg::lacing::MAX_PACKET_SIZE + 1];
        assert!(matches!(
            session.write_frame(&oversized, 960),
            Err(MuxerError::PageOverflow { .. })
        ));
        assert_eq!(session.granule_position(), 0);
        assert_eq!(session.pages().len(), 2);

        // The session stays usable after the rejected frame.
        session.write_frame(&[1u8; 4], 960).unwrap();
        assert_eq!(session.granule_position(), 960);
    }
}
