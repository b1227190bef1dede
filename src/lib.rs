#![forbid(unsafe_code)]
//! # GIF animation playback library
//!
//! This library decodes GIF image streams and plays them back as wall-clock
//! animations onto a caller-owned RGBA canvas. It composites frames with
//! full disposal-method and transparency handling, tracks loop budgets and
//! frame timing, and supports forward seeking by frame index or by animation
//! time.
//!
//! The engine never blocks and never reads a clock: every time-dependent
//! call takes the caller's current time in milliseconds, so the caller owns
//! scheduling (a render loop, a timer wheel, a test harness).
//!
//! ## no_std support
//!
//! This crate supports `no_std` environments with an allocator. Disable the
//! default `std` feature:
//!
//! ```toml
//! [dependencies]
//! gif-player = { version = "0.1", default-features = false }
//! ```
//!
//! In `no_std` mode, implement the [`io::Source`] trait for your byte
//! source, or use the built-in [`io::MemorySource`].
//!
//! ## Playing an animation
//!
//! ```rust
//! use gif_player::{Advance, Player};
//!
//! // A 1x1 single-frame GIF.
//! let bytes = vec![
//!     b'G', b'I', b'F', b'8', b'9', b'a',
//!     1, 0, 1, 0, 0x80, 0, 0,
//!     0xFF, 0x00, 0x00, 0x00, 0x00, 0x00,
//!     0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0,
//!     0x02, 0x02, 0x44, 0x01, 0x00,
//!     0x3B,
//! ];
//!
//! let mut player = Player::from_bytes(bytes).unwrap();
//! let mut canvas = vec![0u8; player.buffer_size()];
//! match player.advance(&mut canvas, 0) {
//!     Advance::Rendered { delay, .. } => {
//!         assert_eq!(&canvas[..4], &[0xFF, 0x00, 0x00, 0xFF]);
//!         assert!(delay >= 1);
//!     }
//!     Advance::Pending { .. } => unreachable!("first frame is due immediately"),
//! }
//! ```
//!
//! ### Reading a file
//!
#![cfg_attr(feature = "std", doc = "```rust,no_run")]
#![cfg_attr(not(feature = "std"), doc = "```rust,ignore")]
//! let mut player = gif_player::Player::open_file("animation.gif").unwrap();
//! println!(
//!     "{}x{}, {} frames, {} ms per cycle",
//!     player.width(),
//!     player.height(),
//!     player.frame_count(),
//!     player.total_duration(),
//! );
//! ```
#![deny(missing_docs)]
#![allow(unknown_lints)] // Certain lints only apply to later versions of Rust
#![allow(clippy::manual_range_contains)]
#![deny(clippy::alloc_instead_of_core)]
#![deny(clippy::std_instead_of_alloc)]
#![deny(clippy::std_instead_of_core)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod canvas;
mod codec;
mod common;
mod error;
mod frame;
/// Byte-source abstraction and no_std support types.
pub mod io;
mod player;
mod scan;

pub use crate::common::{resolve, DisposalMethod, FrameDescriptor, Palette, Rect, GRAYSCALE};
pub use crate::error::Error;
pub use crate::player::{Advance, Player};
