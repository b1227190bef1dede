//! Frame composition onto the caller's RGBA canvas.
//!
//! Each decoded frame is a sub-rectangle of raw indices. Compositing frame
//! `i` first disposes of frame `i - 1` (clear to background, revert to the
//! backup snapshot, or leave as-is), then blits the new pixels honoring
//! transparency and canvas clipping. Disposal always looks at the
//! {outgoing, incoming} pair: a chained restore-to-previous reverts the
//! canvas, and an opaque incoming frame that fully covers the outgoing
//! rectangle makes disposal work redundant.

use alloc::vec::Vec;

use crate::common::{resolve, DisposalMethod, FrameDescriptor, Rect, TRANSPARENT};
use crate::frame::RawFrame;

/// Owns the backup bitmap and applies disposal + blit to the canvas.
pub(crate) struct Compositor {
    width: u16,
    height: u16,
    backup: Option<Vec<u8>>,
}

impl Compositor {
    pub fn new(width: u16, height: u16, backup: Option<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            backup,
        }
    }

    /// Composites frame `index` onto `canvas`.
    ///
    /// Frame 0 erases the whole canvas first: to the resolved background
    /// color when the frame is opaque, to transparent black otherwise.
    pub fn composite(
        &mut self,
        canvas: &mut [u8],
        index: usize,
        frames: &[FrameDescriptor],
        raw: &RawFrame,
        global_triples: &[u8],
        background: u8,
    ) {
        let incoming = &frames[index];
        if index == 0 {
            let color = if incoming.transparent.is_none() {
                resolve(background, global_triples)
            } else {
                TRANSPARENT
            };
            erase(canvas, color);
        } else {
            self.dispose(canvas, &frames[index - 1], incoming);
        }

        let table = match &raw.palette {
            Some(palette) => palette.effective_triples(),
            None => global_triples,
        };
        blit(
            canvas,
            self.width,
            self.height,
            raw,
            table,
            incoming.transparent,
        );
    }

    /// Disposal of the outgoing frame, then the snapshot a future
    /// restore-to-previous will revert to.
    fn dispose(&mut self, canvas: &mut [u8], outgoing: &FrameDescriptor, incoming: &FrameDescriptor) {
        let incoming_transparent = incoming.transparent.is_some();
        if incoming_transparent || !incoming.rect.covers(&outgoing.rect) {
            match outgoing.dispose {
                DisposalMethod::Background => {
                    fill_rect(canvas, self.width, self.height, outgoing.rect, TRANSPARENT);
                }
                DisposalMethod::Previous if incoming.dispose == DisposalMethod::Previous => {
                    if let Some(backup) = &self.backup {
                        canvas.copy_from_slice(backup);
                    }
                }
                _ => {}
            }
        }

        if incoming.dispose == DisposalMethod::Previous {
            let backup = self
                .backup
                .get_or_insert_with(|| alloc::vec![0; canvas.len()]);
            backup.copy_from_slice(canvas);
        }
    }
}

fn erase(canvas: &mut [u8], color: [u8; 4]) {
    for pixel in canvas.chunks_exact_mut(4) {
        pixel.copy_from_slice(&color);
    }
}

/// Fills `rect`, clipped to the canvas, with a single color.
fn fill_rect(canvas: &mut [u8], canvas_width: u16, canvas_height: u16, rect: Rect, color: [u8; 4]) {
    let Some((left, top, copy_width, copy_height)) = clip(canvas_width, canvas_height, rect) else {
        return;
    };
    let stride = usize::from(canvas_width) * 4;
    for y in 0..copy_height {
        let start = (top + y) * stride + left * 4;
        for pixel in canvas[start..start + copy_width * 4].chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }
}

/// Writes the frame's resolved pixels, skipping the transparent index.
fn blit(
    canvas: &mut [u8],
    canvas_width: u16,
    canvas_height: u16,
    raw: &RawFrame,
    table: &[u8],
    transparent: Option<u8>,
) {
    let Some((left, top, copy_width, copy_height)) = clip(canvas_width, canvas_height, raw.rect)
    else {
        return;
    };
    let frame_width = usize::from(raw.rect.width);
    let stride = usize::from(canvas_width) * 4;
    for y in 0..copy_height {
        let src = &raw.pixels[y * frame_width..y * frame_width + copy_width];
        let start = (top + y) * stride + left * 4;
        let dst = &mut canvas[start..start + copy_width * 4];
        for (pixel, &index) in dst.chunks_exact_mut(4).zip(src) {
            if Some(index) == transparent {
                continue;
            }
            pixel.copy_from_slice(&resolve(index, table));
        }
    }
}

/// Clips a rectangle to the canvas, yielding usize geometry, or `None` when
/// nothing overlaps.
fn clip(canvas_width: u16, canvas_height: u16, rect: Rect) -> Option<(usize, usize, usize, usize)> {
    let left = usize::from(rect.left);
    let top = usize::from(rect.top);
    let cw = usize::from(canvas_width);
    let ch = usize::from(canvas_height);
    if left >= cw || top >= ch || rect.width == 0 || rect.height == 0 {
        return None;
    }
    let copy_width = usize::from(rect.width).min(cw - left);
    let copy_height = usize::from(rect.height).min(ch - top);
    Some((left, top, copy_width, copy_height))
}
