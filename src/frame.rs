//! On-demand decoding of a single frame's raw pixel indices.
//!
//! One [`RawFrame`] scratch buffer lives per player and is overwritten by
//! every decode; the compositor consumes it before the next decode runs.

use alloc::vec::Vec;

use crate::codec::Codec;
use crate::common::{check_frame_rect, Palette, Rect};
use crate::error::Error;
use crate::io::Source;

/// Row offsets of the four interlace passes.
const INTERLACE_OFFSETS: [usize; 4] = [0, 4, 2, 1];
/// Row strides of the four interlace passes.
const INTERLACE_STRIDES: [usize; 4] = [8, 8, 4, 2];

/// One decoded frame's raw indexed pixels and geometry.
///
/// Reused across decode calls; never two live at once.
#[derive(Default)]
pub(crate) struct RawFrame {
    pub rect: Rect,
    pub palette: Option<Palette>,
    /// `rect.width × rect.height` pixel indices, row major.
    pub pixels: Vec<u8>,
}

/// Decodes the image record at the codec's current position into `raw`.
///
/// The codec must already be positioned at the record by sequential
/// advancement; there is no out-of-order access. Interlaced frames are
/// decoded in the standard four passes, each row landing at its absolute
/// position in the buffer.
pub(crate) fn decode_frame<S: Source>(
    codec: &mut Codec<S>,
    raw: &mut RawFrame,
    screen_width: u16,
    screen_height: u16,
) -> Result<(), Error> {
    let desc = codec.read_image_desc()?;
    check_frame_rect(screen_width, screen_height, desc.rect)?;

    raw.rect = desc.rect;
    raw.palette = desc.palette;

    let len = desc.rect.pixels();
    raw.pixels.clear();
    raw.pixels
        .try_reserve_exact(len)
        .map_err(|_| Error::NotEnoughMemory)?;
    raw.pixels.resize(len, 0);

    codec.begin_image_data()?;
    let width = usize::from(desc.rect.width);
    let height = usize::from(desc.rect.height);
    if desc.interlaced {
        for (offset, stride) in INTERLACE_OFFSETS.into_iter().zip(INTERLACE_STRIDES) {
            let mut row = offset;
            while row < height {
                codec.read_pixels(&mut raw.pixels[row * width..row * width + width])?;
                row += stride;
            }
        }
    } else {
        codec.read_pixels(&mut raw.pixels)?;
    }
    codec.finish_image_data()?;
    Ok(())
}
