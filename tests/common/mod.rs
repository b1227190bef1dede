//! Shared GIF byte-stream builder for integration tests.

#![allow(dead_code)]

use weezl::BitOrder;

/// Builds well-formed GIF89a streams block by block.
pub struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    /// Starts a stream. `palette` is RGB triples (a power-of-two entry
    /// count, or empty for no global table); `background` is the index used
    /// when erasing.
    pub fn new(width: u16, height: u16, palette: &[u8], background: u8) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        if palette.is_empty() {
            bytes.extend_from_slice(&[0, background, 0]);
        } else {
            let entries = palette.len() / 3;
            assert!(entries.is_power_of_two() && entries >= 2);
            let size_field = entries.trailing_zeros() as u8 - 1;
            bytes.push(0b1000_0000 | size_field);
            bytes.push(background);
            bytes.push(0);
            bytes.extend_from_slice(palette);
        }
        Self { bytes }
    }

    /// Appends a NETSCAPE2.0 loop extension.
    pub fn loop_count(mut self, count: u16) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.extend_from_slice(&[3, 1]);
        self.bytes.extend_from_slice(&count.to_le_bytes());
        self.bytes.push(0);
        self
    }

    /// Appends a comment extension with one sub-block per entry.
    pub fn comment_blocks(mut self, blocks: &[&[u8]]) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFE]);
        for block in blocks {
            assert!(!block.is_empty() && block.len() <= 255);
            self.bytes.push(block.len() as u8);
            self.bytes.extend_from_slice(block);
        }
        self.bytes.push(0);
        self
    }

    /// Appends a graphics control extension for the next frame.
    pub fn control(mut self, dispose: u8, delay_cs: u16, transparent: Option<u8>) -> Self {
        let flags = (dispose << 2) | u8::from(transparent.is_some());
        self.bytes.extend_from_slice(&[0x21, 0xF9, 4, flags]);
        self.bytes.extend_from_slice(&delay_cs.to_le_bytes());
        self.bytes.push(transparent.unwrap_or(0));
        self.bytes.push(0);
        self
    }

    /// Appends an image record with LZW-compressed `pixels` (indices < 4).
    pub fn frame(mut self, left: u16, top: u16, width: u16, height: u16, pixels: &[u8]) -> Self {
        assert_eq!(pixels.len(), usize::from(width) * usize::from(height));
        self.image_descriptor(left, top, width, height);
        self.bytes.push(2); // min code size
        for chunk in compress(pixels).chunks(255) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
        self
    }

    /// Appends an image record whose pixel data ends before the raster is
    /// complete. Survives the metadata pass, fails when decoded.
    pub fn truncated_frame(mut self, left: u16, top: u16, width: u16, height: u16) -> Self {
        self.image_descriptor(left, top, width, height);
        self.bytes.push(2);
        self.bytes.push(0); // immediate sub-block terminator
        self
    }

    /// Terminates the stream.
    pub fn build(mut self) -> Vec<u8> {
        self.bytes.push(0x3B);
        self.bytes
    }

    fn image_descriptor(&mut self, left: u16, top: u16, width: u16, height: u16) {
        self.bytes.push(0x2C);
        self.bytes.extend_from_slice(&left.to_le_bytes());
        self.bytes.extend_from_slice(&top.to_le_bytes());
        self.bytes.extend_from_slice(&width.to_le_bytes());
        self.bytes.extend_from_slice(&height.to_le_bytes());
        self.bytes.push(0); // no local table, not interlaced
    }
}

fn compress(pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut encoder = weezl::encode::Encoder::new(BitOrder::Lsb, 2);
    let consumed = encoder.into_vec(&mut out).encode_all(pixels).consumed_out;
    out.truncate(consumed);
    out
}

/// RGBA pixel at (x, y) of a canvas `width` pixels wide.
pub fn pixel(canvas: &[u8], width: u16, x: usize, y: usize) -> [u8; 4] {
    let at = (y * usize::from(width) + x) * 4;
    [canvas[at], canvas[at + 1], canvas[at + 2], canvas[at + 3]]
}

/// Red, green, blue, white.
pub const PALETTE: [u8; 12] = [220, 20, 20, 20, 220, 20, 20, 20, 220, 255, 255, 255];

pub const RED: [u8; 4] = [220, 20, 20, 255];
pub const GREEN: [u8; 4] = [20, 220, 20, 255];
pub const BLUE: [u8; 4] = [20, 20, 220, 255];
