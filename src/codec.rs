//! Record-level pull decoder.
//!
//! Walks the GIF stream one record at a time: the caller asks for the next
//! record type, then reads an image descriptor, pixel data or extension
//! sub-blocks as appropriate. Pixel data is decompressed with [`weezl`]'s
//! streaming LZW decoder; everything else is plain byte parsing over a
//! [`Source`].

use alloc::vec::Vec;

use weezl::{decode::Decoder as LzwDecoder, BitOrder, LzwStatus};

use crate::common::{Palette, Rect, GRAYSCALE};
use crate::error::Error;
use crate::io::Source;

/// Block introducer for an image descriptor.
const BLOCK_IMAGE: u8 = 0x2C;
/// Block introducer for an extension.
const BLOCK_EXTENSION: u8 = 0x21;
/// Stream trailer.
const BLOCK_TRAILER: u8 = 0x3B;

/// Graphics control extension label.
pub(crate) const EXT_GRAPHICS_CONTROL: u8 = 0xF9;
/// Comment extension label.
pub(crate) const EXT_COMMENT: u8 = 0xFE;
/// Application extension label.
pub(crate) const EXT_APPLICATION: u8 = 0xFF;

/// The three record kinds a GIF stream is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Record {
    /// An image descriptor follows.
    Image,
    /// An extension label and its sub-blocks follow.
    Extension,
    /// End of stream.
    Trailer,
}

/// Logical screen facts parsed from the stream header.
#[derive(Debug, Clone)]
pub(crate) struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    /// Index into the global table used when erasing to the background.
    pub background: u8,
    pub palette: Option<Palette>,
}

impl ScreenDescriptor {
    /// The stream-level table pixels resolve against: the global table when
    /// present and well formed, the shared grayscale ramp otherwise.
    pub fn effective_triples(&self) -> &[u8] {
        match &self.palette {
            Some(palette) if palette.well_formed() => palette.triples(),
            _ => &GRAYSCALE,
        }
    }
}

/// An image descriptor, read after a [`Record::Image`].
#[derive(Debug)]
pub(crate) struct ImageDesc {
    pub rect: Rect,
    pub interlaced: bool,
    pub palette: Option<Palette>,
}

/// Pull decoder over a byte source.
///
/// At most one image's pixel data is in flight at a time; the LZW state and
/// the 255-byte sub-block buffer are reset by [`begin_image_data`](Codec::begin_image_data)
/// and torn down by [`finish_image_data`](Codec::finish_image_data) or
/// [`rewind`](Codec::rewind).
pub(crate) struct Codec<S: Source> {
    src: S,
    lzw: Option<LzwDecoder>,
    block: [u8; 255],
    block_len: usize,
    block_pos: usize,
    data_done: bool,
}

impl<S: Source> core::fmt::Debug for Codec<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl<S: Source> Codec<S> {
    /// Opens a stream: parses the signature, the logical screen descriptor
    /// and the global color table, then marks the source so later rewinds
    /// land just past the header.
    pub fn open(mut src: S) -> Result<(Self, ScreenDescriptor), Error> {
        let mut signature = [0u8; 6];
        src.read_exact(&mut signature)
            .map_err(|_| Error::OpenFailed)?;
        let version = &signature[3..];
        if &signature[..3] != b"GIF" || (version != b"87a" && version != b"89a") {
            return Err(Error::OpenFailed);
        }

        let mut screen_desc = [0u8; 7];
        src.read_exact(&mut screen_desc)?;
        let width = u16::from_le_bytes([screen_desc[0], screen_desc[1]]);
        let height = u16::from_le_bytes([screen_desc[2], screen_desc[3]]);
        let flags = screen_desc[4];
        let background = screen_desc[5];

        let palette = if flags & 0b1000_0000 != 0 {
            Some(read_color_table(&mut src, flags)?)
        } else {
            None
        };

        src.mark().map_err(|_| Error::NotReadable)?;

        let codec = Self {
            src,
            lzw: None,
            block: [0; 255],
            block_len: 0,
            block_pos: 0,
            data_done: true,
        };
        let screen = ScreenDescriptor {
            width,
            height,
            background,
            palette,
        };
        Ok((codec, screen))
    }

    /// Reads the next record introducer.
    pub fn next_record(&mut self) -> Result<Record, Error> {
        match self.read_byte()? {
            BLOCK_IMAGE => Ok(Record::Image),
            BLOCK_EXTENSION => Ok(Record::Extension),
            BLOCK_TRAILER => Ok(Record::Trailer),
            _ => Err(Error::ReadFailed),
        }
    }

    /// Reads the image descriptor and, if present, its local color table.
    pub fn read_image_desc(&mut self) -> Result<ImageDesc, Error> {
        let mut desc = [0u8; 9];
        self.src.read_exact(&mut desc)?;
        let rect = Rect {
            left: u16::from_le_bytes([desc[0], desc[1]]),
            top: u16::from_le_bytes([desc[2], desc[3]]),
            width: u16::from_le_bytes([desc[4], desc[5]]),
            height: u16::from_le_bytes([desc[6], desc[7]]),
        };
        let flags = desc[8];
        let palette = if flags & 0b1000_0000 != 0 {
            Some(read_color_table(&mut self.src, flags)?)
        } else {
            None
        };
        Ok(ImageDesc {
            rect,
            interlaced: flags & 0b0100_0000 != 0,
            palette,
        })
    }

    /// Reads the LZW minimum code size and arms the decoder for
    /// [`read_pixels`](Codec::read_pixels).
    pub fn begin_image_data(&mut self) -> Result<(), Error> {
        let min_code_size = self.read_byte()?;
        if min_code_size < 2 || min_code_size > 11 {
            return Err(Error::ReadFailed);
        }
        self.lzw = Some(LzwDecoder::new(BitOrder::Lsb, min_code_size));
        self.block_len = 0;
        self.block_pos = 0;
        self.data_done = false;
        Ok(())
    }

    /// Decodes exactly `out.len()` pixel indices from the current image.
    pub fn read_pixels(&mut self, out: &mut [u8]) -> Result<(), Error> {
        let mut filled = 0;
        while filled < out.len() {
            if self.block_pos == self.block_len && !self.data_done {
                self.fill_data_block()?;
            }
            let lzw = self.lzw.as_mut().ok_or(Error::ReadFailed)?;
            let result =
                lzw.decode_bytes(&self.block[self.block_pos..self.block_len], &mut out[filled..]);
            self.block_pos += result.consumed_in;
            filled += result.consumed_out;
            match result.status {
                Ok(LzwStatus::Ok) => {}
                Ok(LzwStatus::NoProgress) => {
                    // Input still pending means the compressed stream ended
                    // early; nothing more will come out of the decoder.
                    if self.data_done || self.block_pos < self.block_len {
                        return Err(Error::ReadFailed);
                    }
                }
                Ok(LzwStatus::Done) => {
                    if filled < out.len() {
                        return Err(Error::ReadFailed);
                    }
                }
                Err(_) => return Err(Error::ReadFailed),
            }
        }
        Ok(())
    }

    /// Drains remaining pixel sub-blocks and the block terminator, releasing
    /// the LZW state.
    pub fn finish_image_data(&mut self) -> Result<(), Error> {
        while !self.data_done {
            self.fill_data_block()?;
        }
        self.lzw = None;
        Ok(())
    }

    /// Skips an image's compressed data without decoding, as the metadata
    /// pass does.
    pub fn skip_image_data(&mut self) -> Result<(), Error> {
        let _min_code_size = self.read_byte()?;
        self.skip_sub_blocks()
    }

    /// Reads the extension label following a [`Record::Extension`].
    pub fn read_extension_label(&mut self) -> Result<u8, Error> {
        self.read_byte()
    }

    /// Reads the next extension sub-block, or `None` at the null terminator.
    pub fn next_sub_block(&mut self) -> Result<Option<&[u8]>, Error> {
        let len = usize::from(self.read_byte()?);
        if len == 0 {
            return Ok(None);
        }
        self.src.read_exact(&mut self.block[..len])?;
        Ok(Some(&self.block[..len]))
    }

    /// Discards sub-blocks up to and including the null terminator.
    pub fn skip_sub_blocks(&mut self) -> Result<(), Error> {
        loop {
            let len = usize::from(self.read_byte()?);
            if len == 0 {
                return Ok(());
            }
            self.src.read_exact(&mut self.block[..len])?;
        }
    }

    /// Rewinds the source to just past the header and clears decode state,
    /// positioning the codec to re-walk frame 0.
    pub fn rewind(&mut self) -> Result<(), Error> {
        self.src.rewind().map_err(|_| Error::RewindFailed)?;
        self.lzw = None;
        self.block_len = 0;
        self.block_pos = 0;
        self.data_done = true;
        Ok(())
    }

    /// Releases the byte source.
    pub fn into_inner(self) -> S {
        self.src
    }

    fn fill_data_block(&mut self) -> Result<(), Error> {
        let len = usize::from(self.read_byte()?);
        if len == 0 {
            self.data_done = true;
            self.block_len = 0;
        } else {
            self.src.read_exact(&mut self.block[..len])?;
            self.block_len = len;
        }
        self.block_pos = 0;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut byte = [0u8; 1];
        self.src.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

fn read_color_table<S: Source>(src: &mut S, flags: u8) -> Result<Palette, Error> {
    let bits = (flags & 0b0000_0111) + 1;
    let len = (2usize << (flags & 0b0000_0111)) * 3;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::NotEnoughMemory)?;
    data.resize(len, 0);
    src.read_exact(&mut data)?;
    Ok(Palette::new(bits, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemorySource;
    use alloc::vec;

    fn open(bytes: Vec<u8>) -> (Codec<MemorySource<Vec<u8>>>, ScreenDescriptor) {
        Codec::open(MemorySource::new(bytes)).unwrap()
    }

    fn header(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        // global table, 2 entries: black, white
        bytes.extend_from_slice(&[0b1000_0000, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        bytes
    }

    #[test]
    fn rejects_non_gif_signature() {
        let err = Codec::open(MemorySource::new(b"PNG89a\0\0".to_vec())).unwrap_err();
        assert_eq!(err, Error::OpenFailed);
    }

    #[test]
    fn parses_screen_descriptor_and_global_table() {
        let (_, screen) = open(header(320, 200));
        assert_eq!((screen.width, screen.height), (320, 200));
        let palette = screen.palette.as_ref().unwrap();
        assert!(palette.well_formed());
        assert_eq!(palette.triples(), &[0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn dispatches_record_types() {
        let mut bytes = header(4, 4);
        bytes.push(0x21);
        bytes.push(0x3B);
        let (mut codec, _) = open(bytes);
        assert_eq!(codec.next_record().unwrap(), Record::Extension);
        assert_eq!(codec.read_extension_label().unwrap(), 0x3B);
    }

    #[test]
    fn reads_chained_sub_blocks_until_terminator() {
        let mut bytes = header(4, 4);
        bytes.extend_from_slice(&[3, b'a', b'b', b'c', 1, b'd', 0]);
        let (mut codec, _) = open(bytes);
        assert_eq!(codec.next_sub_block().unwrap(), Some(&b"abc"[..]));
        assert_eq!(codec.next_sub_block().unwrap(), Some(&b"d"[..]));
        assert_eq!(codec.next_sub_block().unwrap(), None);
    }

    #[test]
    fn decodes_lzw_pixel_data() {
        let pixels = [0u8, 1, 1, 0, 1, 0, 0, 1];
        let mut compressed = vec![];
        let mut enc = weezl::encode::Encoder::new(BitOrder::Lsb, 2);
        let consumed = enc.into_vec(&mut compressed).encode_all(&pixels).consumed_out;
        compressed.truncate(consumed);

        let mut bytes = header(4, 2);
        bytes.push(2); // min code size
        bytes.push(compressed.len() as u8);
        bytes.extend_from_slice(&compressed);
        bytes.push(0);

        let (mut codec, _) = open(bytes);
        codec.begin_image_data().unwrap();
        let mut out = [0u8; 8];
        codec.read_pixels(&mut out).unwrap();
        codec.finish_image_data().unwrap();
        assert_eq!(out, pixels);
    }

    #[test]
    fn truncated_pixel_data_is_a_read_error() {
        let mut bytes = header(4, 2);
        bytes.push(2);
        bytes.push(0); // empty data, immediate terminator
        let (mut codec, _) = open(bytes);
        codec.begin_image_data().unwrap();
        let mut out = [0u8; 8];
        assert_eq!(codec.read_pixels(&mut out), Err(Error::ReadFailed));
    }

    #[test]
    fn rewind_returns_to_first_record() {
        let mut bytes = header(4, 4);
        bytes.push(0x3B);
        let (mut codec, _) = open(bytes);
        assert_eq!(codec.next_record().unwrap(), Record::Trailer);
        codec.rewind().unwrap();
        assert_eq!(codec.next_record().unwrap(), Record::Trailer);
    }
}
