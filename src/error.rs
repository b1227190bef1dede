//! Error codes surfaced by the playback engine.

use core::fmt;

use crate::io::IoError;

/// Failure code reported by the playback engine.
///
/// The set is closed: every failure mode of opening, scanning, decoding and
/// seeking maps onto one of these codes. Decode-time failures are also kept
/// as the stream's sticky error, readable through
/// [`Player::last_error`](crate::Player::last_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The byte source could not be opened or the stream is not a GIF.
    OpenFailed,
    /// The byte source could not record its start position.
    NotReadable,
    /// An internal buffer allocation failed.
    NotEnoughMemory,
    /// The logical screen has a zero dimension.
    InvalidScreenDimensions,
    /// A frame has a zero dimension or an unaddressable pixel count.
    InvalidImageDimensions,
    /// A frame's rectangle does not fit within the canvas.
    ImageNotConfined,
    /// The stream ended without a single decodable frame.
    NoFrames,
    /// Reading or decoding the stream failed mid-record.
    ReadFailed,
    /// Rewinding the byte source failed. Fatal when it happens during
    /// playback: the stream can no longer be replayed.
    RewindFailed,
}

impl fmt::Display for Error {
    #[cold]
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::OpenFailed => "failed to open the GIF stream",
            Self::NotReadable => "the byte source is not readable",
            Self::NotEnoughMemory => "not enough memory for internal buffers",
            Self::InvalidScreenDimensions => "invalid logical screen dimensions",
            Self::InvalidImageDimensions => "invalid frame dimensions",
            Self::ImageNotConfined => "frame rectangle exceeds the canvas",
            Self::NoFrames => "the stream contains no frames",
            Self::ReadFailed => "reading the GIF stream failed",
            Self::RewindFailed => "rewinding the byte source failed",
        };
        fmt.write_str(msg)
    }
}

impl core::error::Error for Error {}

impl From<IoError> for Error {
    #[cold]
    fn from(_: IoError) -> Self {
        Self::ReadFailed
    }
}
