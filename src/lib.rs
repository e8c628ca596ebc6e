// opusmux - Ogg/Opus streaming container muxer
//
// Wraps raw Opus-encoded frames into a spec-compliant Ogg bitstream
// (RFC 7845 / RFC 3533): mandatory OpusHead/OpusTags header pages, page
// segmentation with lacing, Ogg-variant CRC32 checksums, granule-position
// tracking and BOS/EOS flags. Also re-stamps page sequences produced by
// external encoders so headers, serial number, page numbering and the EOS
// flag form one consistent logical stream.

pub mod error;
pub mod muxer;
pub mod ogg;
pub mod opus;
mod utils;

#[cfg(feature = "python")]
mod python;

pub use error::{MuxerError, MuxerResult};
pub use muxer::{
    concatenate, MuxerSession, StreamParams, DEFAULT_FRAME_SAMPLES, OGG_OPUS_MIME_TYPE,
};
pub use ogg::page::{OggPage, OggPageHeader};
pub use opus::OpusHead;
