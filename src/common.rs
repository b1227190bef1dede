//! Shared types: disposal methods, frame geometry, color tables and the
//! per-frame descriptor built by the metadata pass.

use alloc::vec::Vec;

use crate::error::Error;

/// Disposal method attached to a frame.
///
/// Tells the compositor how to treat the frame's rectangle before the next
/// frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DisposalMethod {
    /// Decoder is not required to take any action.
    #[default]
    Any = 0,
    /// Do not dispose. The frame's pixels stay on the canvas.
    Keep = 1,
    /// Restore the frame's rectangle to the background.
    Background = 2,
    /// Restore the canvas to its state before the frame was drawn.
    Previous = 3,
}

impl DisposalMethod {
    /// Maps a graphics-control-extension disposal field.
    ///
    /// Reserved values (> 3) degrade to [`DisposalMethod::Any`]; a player has
    /// nothing better to do with them than leave the canvas alone.
    #[must_use]
    pub fn from_u8(n: u8) -> Self {
        match n {
            1 => Self::Keep,
            2 => Self::Background,
            3 => Self::Previous,
            _ => Self::Any,
        }
    }
}

/// A frame's sub-rectangle within the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Column of the left edge.
    pub left: u16,
    /// Row of the top edge.
    pub top: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl Rect {
    /// Returns true if `self` completely covers `other`.
    #[must_use]
    pub fn covers(&self, other: &Rect) -> bool {
        u32::from(self.left) <= u32::from(other.left)
            && u32::from(other.left) + u32::from(other.width)
                <= u32::from(self.left) + u32::from(self.width)
            && u32::from(self.top) <= u32::from(other.top)
            && u32::from(other.top) + u32::from(other.height)
                <= u32::from(self.top) + u32::from(self.height)
    }

    /// Pixel count, computed without overflow.
    #[must_use]
    pub fn pixels(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// Validates a frame rectangle against the canvas.
///
/// Both the metadata pass and the frame decoder run this check; a frame that
/// slips past the scanner must still not index out of the canvas.
pub(crate) fn check_frame_rect(screen_width: u16, screen_height: u16, rect: Rect) -> Result<(), Error> {
    if rect.width < 1 || rect.height < 1 {
        return Err(Error::InvalidImageDimensions);
    }
    if usize::from(rect.width)
        .checked_mul(usize::from(rect.height))
        .and_then(|px| px.checked_mul(4))
        .is_none()
    {
        return Err(Error::InvalidImageDimensions);
    }
    if u32::from(rect.left) + u32::from(rect.width) > u32::from(screen_width)
        || u32::from(rect.top) + u32::from(rect.height) > u32::from(screen_height)
    {
        return Err(Error::ImageNotConfined);
    }
    Ok(())
}

/// Fully transparent black, the disposal fill color.
pub(crate) const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Shared 256-entry grayscale ramp, substituted for missing or malformed
/// color tables. Entry `i` is `RGB(i, i, i)`.
pub static GRAYSCALE: [u8; 768] = grayscale_ramp();

const fn grayscale_ramp() -> [u8; 768] {
    let mut table = [0u8; 768];
    let mut i = 0;
    while i < 256 {
        table[i * 3] = i as u8;
        table[i * 3 + 1] = i as u8;
        table[i * 3 + 2] = i as u8;
        i += 1;
    }
    table
}

/// Resolves a pixel index against a table of RGB triples.
///
/// An index beyond the table resolves to entry 0 rather than failing, so
/// malformed pixel data cannot index out of bounds.
#[must_use]
pub fn resolve(index: u8, triples: &[u8]) -> [u8; 4] {
    let count = triples.len() / 3;
    let i = if usize::from(index) >= count {
        0
    } else {
        usize::from(index)
    };
    [triples[i * 3], triples[i * 3 + 1], triples[i * 3 + 2], 0xFF]
}

/// A color table read from the stream, either global or frame-local.
#[derive(Debug, Clone)]
pub struct Palette {
    bits: u8,
    data: Vec<u8>,
}

impl Palette {
    /// Builds a palette from RGB triples and its declared bits-per-pixel.
    #[must_use]
    pub fn new(bits: u8, data: Vec<u8>) -> Self {
        Self { bits, data }
    }

    /// A table is well formed when its entry count equals `2^bits`.
    /// Ill-formed tables are discarded in favor of [`GRAYSCALE`].
    #[must_use]
    pub fn well_formed(&self) -> bool {
        self.bits >= 1 && self.bits <= 8 && self.data.len() == (1usize << self.bits) * 3
    }

    /// The raw RGB triples.
    #[must_use]
    pub fn triples(&self) -> &[u8] {
        &self.data
    }

    /// The triples to resolve pixels against: the table itself when well
    /// formed, the shared grayscale ramp otherwise.
    #[must_use]
    pub fn effective_triples(&self) -> &[u8] {
        if self.well_formed() {
            &self.data
        } else {
            &GRAYSCALE
        }
    }
}

/// Timing and compositing facts for one frame, collected by the metadata
/// pass. Index `i` is immutable once the pass appends it; the descriptor
/// list length always equals the stream's frame count.
#[derive(Debug, Clone, Default)]
pub struct FrameDescriptor {
    /// Display duration in milliseconds. The GIF centisecond delay is
    /// multiplied by 10; raw delays of 0 or 1 centisecond normalize to 100 ms.
    pub duration_ms: u32,
    /// How to treat this frame's rectangle before drawing the next one.
    pub dispose: DisposalMethod,
    /// Pixel index treated as transparent during the blit, if any.
    pub transparent: Option<u8>,
    /// The frame's rectangle within the canvas.
    pub rect: Rect,
}
