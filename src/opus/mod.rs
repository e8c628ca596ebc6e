// Opus encapsulation headers (RFC 7845)
//
// An Ogg Opus stream carries two mandatory header pages before any audio:
// - Identification header: "OpusHead" (8 bytes) followed by version,
//   channel count, pre-skip, input sample rate, output gain and channel
//   mapping family
// - Comment header: "OpusTags" (8 bytes) followed by a Vorbis-style
//   vendor string and user comment list
// Audio data pages follow, with granule positions counting 48 kHz samples.
//
// Reference:
// - https://opus-codec.org/docs/
// - RFC 7845: Ogg Encapsulation for the Opus Audio Codec

use crate::utils::io::{read_le_u16_at, read_le_u32_at};

pub const OPUS_HEAD_SIGNATURE: &[u8; 8] = b"OpusHead";
pub const OPUS_TAGS_SIGNATURE: &[u8; 8] = b"OpusTags";

/// Encoder priming delay skipped by decoders, in 48 kHz samples (~6.5 ms)
pub const DEFAULT_PRE_SKIP: u16 = 312;

/// Vendor string written into the comment header
pub const VENDOR_STRING: &str = "opusmux";

/// OpusHead identification structure
///
/// Output gain is fixed at 0 and the channel mapping family at 0
/// (mono/stereo), so only the variable fields are carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusHead {
    pub channels: u8,
    pub pre_skip: u16,
    pub input_sample_rate: u32,
}

impl OpusHead {
    /// Serialize the 19-byte identification header payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(19);
        payload.extend_from_slice(OPUS_HEAD_SIGNATURE);
        payload.push(1); // version
        payload.push(self.channels);
        payload.extend_from_slice(&self.pre_skip.to_le_bytes());
        payload.extend_from_slice(&self.input_sample_rate.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes()); // output gain
        payload.push(0); // channel mapping family
        payload
    }

    /// Parse an identification header payload
    ///
    /// Accepts any encapsulation version with a zero major nibble, the
    /// compatibility rule of RFC 7845 section 5.1.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < 19 || &payload[0..8] != OPUS_HEAD_SIGNATURE {
            return None;
        }
        if payload[8] & 0xf0 != 0 {
            return None;
        }
        Some(OpusHead {
            channels: payload[9],
            pre_skip: read_le_u16_at(payload, 10)?,
            input_sample_rate: read_le_u32_at(payload, 12)?,
        })
    }
}

/// Serialize an OpusTags comment header payload with no user comments
pub fn build_comment_payload(vendor: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(8 + 4 + vendor.len() + 4);
    payload.extend_from_slice(OPUS_TAGS_SIGNATURE);
    payload.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    payload.extend_from_slice(vendor.as_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes()); // no user comments
    payload
}
