//! Metadata pass.
//!
//! A single forward walk over the stream's records that builds the per-frame
//! descriptor table, the comment text and the loop count without ever
//! decoding pixel data. The pass also allocates the backup bitmap the moment
//! a restore-to-previous disposal first appears, so the compositor always has
//! something to restore.

use alloc::string::String;
use alloc::vec::Vec;

use crate::codec::{
    Codec, Record, ScreenDescriptor, EXT_APPLICATION, EXT_COMMENT, EXT_GRAPHICS_CONTROL,
};
use crate::common::{check_frame_rect, resolve, DisposalMethod, FrameDescriptor, TRANSPARENT};
use crate::error::Error;
use crate::io::Source;

/// Application extension identifiers that carry a loop count.
const LOOP_IDENTIFIERS: [&[u8]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

/// Everything the metadata pass extracts from a stream.
#[derive(Debug)]
pub(crate) struct Metadata {
    pub frames: Vec<FrameDescriptor>,
    pub comment: String,
    /// Raw loop count from the application extension; 0 means infinite.
    pub loop_count: u16,
    /// Backup bitmap, pre-filled, when any frame disposes to previous.
    pub backup: Option<Vec<u8>>,
}

/// Byte length of an RGBA buffer covering the whole canvas.
pub(crate) fn canvas_bytes(width: u16, height: u16) -> Result<usize, Error> {
    usize::from(width)
        .checked_mul(usize::from(height))
        .and_then(|px| px.checked_mul(4))
        .ok_or(Error::NotEnoughMemory)
}

/// Walks the stream until the trailer, building [`Metadata`].
///
/// The source is left at the trailer; the caller rewinds it.
pub(crate) fn scan<S: Source>(
    codec: &mut Codec<S>,
    screen: &ScreenDescriptor,
) -> Result<Metadata, Error> {
    let mut frames: Vec<FrameDescriptor> = Vec::new();
    let mut images = 0usize;
    let mut comment = String::new();
    let mut loop_count = 0u16;
    let mut backup: Option<Vec<u8>> = None;

    loop {
        match codec.next_record()? {
            Record::Image => {
                if frames.len() == images {
                    frames.push(FrameDescriptor::default());
                }
                let desc = codec.read_image_desc()?;
                check_frame_rect(screen.width, screen.height, desc.rect)?;
                frames[images].rect = desc.rect;
                images += 1;
                codec.skip_image_data()?;
            }
            Record::Extension => {
                let label = codec.read_extension_label()?;
                match label {
                    EXT_GRAPHICS_CONTROL => {
                        if frames.len() == images {
                            frames.push(FrameDescriptor::default());
                        }
                        let (dispose, transparent) =
                            read_graphics_control(codec, &mut frames[images])?;
                        if dispose == DisposalMethod::Previous && backup.is_none() {
                            backup = Some(seed_backup(screen, transparent)?);
                        }
                        codec.skip_sub_blocks()?;
                    }
                    EXT_COMMENT => {
                        while let Some(block) = codec.next_sub_block()? {
                            comment.push_str(&String::from_utf8_lossy(block));
                        }
                    }
                    EXT_APPLICATION => {
                        let recognized = match codec.next_sub_block()? {
                            Some(block) => LOOP_IDENTIFIERS.contains(&block),
                            None => continue,
                        };
                        if recognized {
                            if let Some(block) = codec.next_sub_block()? {
                                if block.len() == 3 && block[0] == 1 {
                                    loop_count = u16::from_le_bytes([block[1], block[2]]);
                                }
                            } else {
                                continue;
                            }
                        }
                        codec.skip_sub_blocks()?;
                    }
                    _ => codec.skip_sub_blocks()?,
                }
            }
            Record::Trailer => break,
        }
    }

    // A graphics-control block with no following image leaves a dangling
    // descriptor; drop it so the table length equals the frame count.
    frames.truncate(images);

    Ok(Metadata {
        frames,
        comment,
        loop_count,
        backup,
    })
}

/// Parses the 4-byte graphics control block into the upcoming frame's
/// descriptor. Returns the disposal/transparency pair for backup handling.
fn read_graphics_control<S: Source>(
    codec: &mut Codec<S>,
    descriptor: &mut FrameDescriptor,
) -> Result<(DisposalMethod, Option<u8>), Error> {
    let block = codec.next_sub_block()?.ok_or(Error::ReadFailed)?;
    if block.len() < 4 {
        return Err(Error::ReadFailed);
    }
    let flags = block[0];
    let delay = u16::from_le_bytes([block[1], block[2]]);
    let dispose = DisposalMethod::from_u8((flags >> 2) & 0b111);
    let transparent = if flags & 1 != 0 { Some(block[3]) } else { None };

    descriptor.duration_ms = if delay > 1 { u32::from(delay) * 10 } else { 100 };
    descriptor.dispose = dispose;
    descriptor.transparent = transparent;
    Ok((dispose, transparent))
}

/// Allocates the backup bitmap, filled with the resolved background color or
/// transparent black when the pending frame carries transparency.
fn seed_backup(screen: &ScreenDescriptor, transparent: Option<u8>) -> Result<Vec<u8>, Error> {
    let len = canvas_bytes(screen.width, screen.height)?;
    let color = if transparent.is_none() {
        resolve(screen.background, screen.effective_triples())
    } else {
        TRANSPARENT
    };
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::NotEnoughMemory)?;
    buf.resize(len, 0);
    for pixel in buf.chunks_exact_mut(4) {
        pixel.copy_from_slice(&color);
    }
    Ok(buf)
}
