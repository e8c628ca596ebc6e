// Re-stamping of externally produced page sequences
//
// An encoder worker that streams pages asynchronously cannot know which
// page will be last, and may never emit the mandatory header pages. The
// re-stamper runs once the complete sequence is known: it adopts the
// foreign serial number for the whole logical stream, synthesizes the
// header pages, renumbers the sequence field and moves the EOS flag onto
// the true last page, refreshing the checksum after every mutation.

use log::{debug, warn};

use crate::error::MuxerError;
use crate::ogg::page::{self, PAGE_HEADER_SIZE};
use crate::ogg::{OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_EOS, OGG_SIGNATURE};

use super::MuxerSession;

impl MuxerSession {
    /// Normalize a foreign page sequence into one consistent logical stream
    ///
    /// Returns `[identification, comment, data...]` pages sharing one serial
    /// number, with sequence numbers renumbered from 0 and the EOS flag on
    /// the last page only. Input checksums are never inspected; every page
    /// is rewritten with a freshly computed one. An empty input yields just
    /// the two header pages under the session's own serial number.
    ///
    /// Normalizing finalizes the session; it cannot be combined with
    /// incremental writes on the same session.
    pub fn normalize(&mut self, foreign_pages: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, MuxerError> {
        if self.finished {
            return Err(MuxerError::InvalidSessionState(
                "normalize called on a finished session".to_string(),
            ));
        }
        if self.pages.len() > 2 {
            return Err(MuxerError::InvalidSessionState(
                "normalize called on a session with audio pages".to_string(),
            ));
        }

        // Validate every input page before touching any of them.
        for (index, foreign) in foreign_pages.iter().enumerate() {
            if foreign.len() < PAGE_HEADER_SIZE || &foreign[0..4] != OGG_SIGNATURE {
                return Err(MuxerError::MalformedPage {
                    index,
                    size: foreign.len(),
                });
            }
        }

        self.finished = true;

        if foreign_pages.is_empty() {
            debug!(
                "no foreign pages; emitting headers only under serial {:#010x}",
                self.serial_number
            );
            return Ok(self.pages.clone());
        }

        // The whole logical stream adopts the first page's serial number.
        let foreign_serial = page::read_serial_number(&foreign_pages[0]).ok_or(
            MuxerError::MalformedPage {
                index: 0,
                size: foreign_pages[0].len(),
            },
        )?;
        if foreign_serial != self.serial_number {
            debug!(
                "adopting foreign serial {:#010x} (was {:#010x})",
                foreign_serial, self.serial_number
            );
            self.serial_number = foreign_serial;
            self.rebuild_header_pages();
        }

        let mut output = self.pages.clone();
        let last = foreign_pages.len() - 1;
        for (index, foreign) in foreign_pages.iter().enumerate() {
            let mut restamped = foreign.clone();

            // The foreign encoder's own stream boundaries do not survive:
            // BOS lives on the identification page and EOS moves to the
            // true last page.
            let flags = restamped[page::HEADER_TYPE_OFFSET];
            if flags & (OGG_HEADER_TYPE_BOS | OGG_HEADER_TYPE_EOS) != 0 {
                warn!(
                    "clearing stray stream flags {:#04x} on foreign page {}",
                    flags, index
                );
            }
            page::clear_stream_flags(&mut restamped);

            page::patch_serial_number(&mut restamped, self.serial_number);
            page::patch_sequence_number(&mut restamped, (index as u32) + 2);
            if index == last {
                page::set_end_of_stream(&mut restamped);
            }
            page::refresh_checksum(&mut restamped, &self.crc);
            output.push(restamped);
        }

        debug!(
            "restamped {} foreign pages under serial {:#010x}",
            foreign_pages.len(),
            self.serial_number
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ogg::crc::Crc32;
    use crate::ogg::page::{build_page, OggPage};
    use crate::opus::{OpusHead, OPUS_TAGS_SIGNATURE};
    use std::io::Cursor;

    fn foreign_page(serial: u32, sequence: u32, granule: u64, eos: bool) -> Vec<u8> {
        let crc = Crc32::new();
        let payload = vec![sequence as u8; 24];
        build_page(&crc, &[&payload], granule, false, eos, serial, sequence).unwrap()
    }

    #[test]
    fn test_empty_input_yields_header_pages_only() {
        let mut session = MuxerSession::with_serial(48_000, 1, 0xabcd);
        let pages = session.normalize(&[]).unwrap();

        assert_eq!(pages.len(), 2);
        let id_page = OggPage::read(&mut Cursor::new(&pages[0])).unwrap();
        assert!(id_page.header.is_bos());
        assert_eq!(id_page.header.granule_position, 0);
        assert_eq!(id_page.header.serial_number, 0xabcd);
        let tags_page = OggPage::read(&mut Cursor::new(&pages[1])).unwrap();
        assert_eq!(tags_page.header.granule_position, 0);
        assert!(tags_page.data.starts_with(OPUS_TAGS_SIGNATURE));
    }

    #[test]
    fn test_three_foreign_pages_unify_into_five() {
        // Distinct foreign serials on every input page; the first one wins.
        let foreign = vec![
            foreign_page(0x1111, 9, 960, false),
            foreign_page(0x2222, 10, 1920, true),
            foreign_page(0x3333, 11, 2880, false),
        ];

        let mut session = MuxerSession::new(48_000, 1);
        let pages = session.normalize(&foreign).unwrap();
        assert_eq!(pages.len(), 5);

        let crc = Crc32::new();
        let parsed: Vec<OggPage> = pages
            .iter()
            .map(|p| OggPage::read(&mut Cursor::new(p)).unwrap())
            .collect();

        for (index, page) in parsed.iter().enumerate() {
            assert_eq!(page.header.serial_number, 0x1111);
            assert_eq!(page.header.sequence_number, index as u32);
            assert_eq!(page.header.is_eos(), index == 4);
            assert_eq!(page.header.is_bos(), index == 0);
            assert!(page.checksum_valid(&crc));
        }

        // Payloads and granule positions of the data pages are untouched.
        assert_eq!(parsed[2].data, vec![9u8; 24]);
        assert_eq!(parsed[3].header.granule_position, 1920);
        assert_eq!(parsed[4].header.granule_position, 2880);
    }

    #[test]
    fn test_headers_carry_adopted_serial() {
        let foreign = vec![foreign_page(0x5555, 0, 960, false)];
        let mut session = MuxerSession::with_serial(44_100, 2, 0x9999);
        let pages = session.normalize(&foreign).unwrap();

        assert_eq!(session.serial_number(), 0x5555);
        let id_page = OggPage::read(&mut Cursor::new(&pages[0])).unwrap();
        assert_eq!(id_page.header.serial_number, 0x5555);
        assert_eq!(
            OpusHead::parse(&id_page.data).map(|h| h.input_sample_rate),
            Some(44_100)
        );
    }

    #[test]
    fn test_short_page_rejected_before_mutation() {
        let foreign = vec![
            foreign_page(0x1111, 0, 960, false),
            vec![0x4f, 0x67, 0x67, 0x53, 0x00], // truncated header
        ];
        let mut session = MuxerSession::new(48_000, 1);
        assert_eq!(
            session.normalize(&foreign),
            Err(MuxerError::MalformedPage { index: 1, size: 5 })
        );
        assert!(!session.is_finished());
    }

    #[test]
    fn test_missing_capture_pattern_rejected() {
        let mut bogus = foreign_page(0x1111, 0, 960, false);
        bogus[0] = b'X';
        let mut session = MuxerSession::new(48_000, 1);
        assert!(matches!(
            session.normalize(&[bogus]),
            Err(MuxerError::MalformedPage { index: 0, .. })
        ));
    }

    #[test]
    fn test_normalize_finalizes_the_session() {
        let mut session = MuxerSession::new(48_000, 1);
        session.normalize(&[]).unwrap();
        assert!(session.is_finished());
        assert!(matches!(
            session.normalize(&[]),
            Err(MuxerError::InvalidSessionState(_))
        ));
        assert!(matches!(
            session.write_frame(&[1u8; 4], 960),
            Err(MuxerError::InvalidSessionState(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_mixed_mode_session() {
        let mut session = MuxerSession::new(48_000, 1);
        session.write_frame(&[1u8; 4], 960).unwrap();
        assert!(matches!(
            session.normalize(&[]),
            Err(MuxerError::InvalidSessionState(_))
        ));
    }
}
