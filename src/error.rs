// Error type for muxing operations

use std::fmt;

pub type MuxerResult<T> = Result<T, MuxerError>;

/// Errors raised by page building, session writes and re-stamping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxerError {
    /// A packet needs more lacing entries than one page can carry
    PageOverflow { packet_size: usize },
    /// A write or finish arrived after the session was finalized
    InvalidSessionState(String),
    /// A foreign page buffer is not a valid Ogg page
    MalformedPage { index: usize, size: usize },
}

impl fmt::Display for MuxerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxerError::PageOverflow { packet_size } => write!(
                f,
                "Packet of {} bytes exceeds the 255-entry segment table of a single page",
                packet_size
            ),
            MuxerError::InvalidSessionState(msg) => write!(f, "Invalid session state: {}", msg),
            MuxerError::MalformedPage { index, size } => write!(
                f,
                "Malformed page at index {}: {} byte buffer is not an Ogg page",
                index, size
            ),
        }
    }
}

impl std::error::Error for MuxerError {}
