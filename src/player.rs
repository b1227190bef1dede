//! Playback state machine and stream lifecycle.
//!
//! A [`Player`] owns everything attached to one open stream: the codec
//! session, the frame descriptor table, the compositor with its backup
//! bitmap, the reusable decode scratch buffer and the playback clock state.
//! Frames are only ever composited in forward, cyclic order, since each
//! canvas state is a chain of disposals over the previous one; seeking backward
//! means rewinding the byte source and replaying from frame 0.
//!
//! The engine never reads a clock of its own: every time-dependent operation
//! takes the caller's current wall time in milliseconds, which keeps
//! scheduling advisory and the whole state machine testable.

use alloc::string::String;
use alloc::vec::Vec;

use crate::canvas::Compositor;
use crate::codec::{Codec, Record, ScreenDescriptor};
use crate::common::FrameDescriptor;
use crate::error::Error;
use crate::frame::{decode_frame, RawFrame};
use crate::io::{MemorySource, Source};
use crate::scan::{canvas_bytes, scan};

/// Outcome of [`Player::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A new frame was composited onto the canvas.
    Rendered {
        /// True when the rendered frame is the stream's last: one animation
        /// cycle is complete. Callers combine this with
        /// [`Player::loop_count`] to decide whether to keep scheduling.
        cycle_complete: bool,
        /// Milliseconds until the next frame is due, already speed-scaled.
        delay: u64,
    },
    /// Nothing was rendered: the current frame is still on display, the loop
    /// budget is spent, or the stream is in a failed state.
    Pending {
        /// Milliseconds until the current frame expires (0 when overdue or
        /// when playback has stopped).
        remaining: u64,
    },
}

/// Loop accounting. A stream without a loop extension, or with a raw count
/// of zero, replays forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Infinite,
    Finite { completed: u16, limit: u16 },
}

impl LoopState {
    fn from_raw(count: u16) -> Self {
        if count == 0 {
            Self::Infinite
        } else {
            Self::Finite {
                completed: 0,
                limit: count,
            }
        }
    }

    fn exhausted(self) -> bool {
        matches!(self, Self::Finite { completed, limit } if completed >= limit)
    }

    fn complete_cycle(&mut self) {
        if let Self::Finite { completed, .. } = self {
            *completed = completed.saturating_add(1);
        }
    }

    fn restart(&mut self) {
        if let Self::Finite { completed, .. } = self {
            *completed = 0;
        }
    }
}

/// An open GIF stream with playback state.
///
/// All mutating operations take `&mut self`; a `Player` has a single logical
/// owner and provides no internal synchronization.
pub struct Player<S: Source> {
    codec: Codec<S>,
    screen: ScreenDescriptor,
    frames: Vec<FrameDescriptor>,
    comment: String,
    loop_count: u16,
    loops: LoopState,
    compositor: Compositor,
    /// Decode scratch buffer; `None` for metadata-only handles.
    raw: Option<RawFrame>,
    buffer_len: usize,
    /// Index of the frame currently on the canvas; `None` before playback
    /// starts.
    current: Option<usize>,
    /// Wall time at which the next frame becomes due.
    next_due: u64,
    /// Display time left on the current frame, captured by
    /// [`save_remainder`](Player::save_remainder).
    remainder: Option<u64>,
    speed: f32,
    error: Option<Error>,
    fatal: bool,
}

impl<S: Source> core::fmt::Debug for Player<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Player").finish_non_exhaustive()
    }
}

impl<T: AsRef<[u8]>> Player<MemorySource<T>> {
    /// Opens a stream held entirely in memory.
    pub fn from_bytes(data: T) -> Result<Self, Error> {
        Self::open(MemorySource::new(data))
    }
}

#[cfg(feature = "std")]
impl Player<crate::io::SeekSource<std::io::BufReader<std::fs::File>>> {
    /// Opens a GIF file from the filesystem.
    pub fn open_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|_| Error::OpenFailed)?;
        let src = crate::io::SeekSource::new(std::io::BufReader::new(file))
            .map_err(|_| Error::NotReadable)?;
        Self::open(src)
    }
}

impl<S: Source> Player<S> {
    /// Opens a stream: parses the header, runs the metadata pass and rewinds
    /// the source, ready for the first [`advance`](Player::advance).
    pub fn open(src: S) -> Result<Self, Error> {
        Self::open_impl(src, false)
    }

    /// Opens a stream for metadata inspection only.
    ///
    /// Skips the decode scratch-buffer allocation; all rendering operations
    /// on the returned player are no-ops, but every metadata accessor works.
    pub fn open_metadata_only(src: S) -> Result<Self, Error> {
        Self::open_impl(src, true)
    }

    fn open_impl(src: S, metadata_only: bool) -> Result<Self, Error> {
        let (mut codec, screen) = Codec::open(src)?;
        if screen.width == 0 || screen.height == 0 {
            return Err(Error::InvalidScreenDimensions);
        }
        let buffer_len = canvas_bytes(screen.width, screen.height)?;

        let metadata = scan(&mut codec, &screen)?;
        if metadata.frames.is_empty() {
            return Err(Error::NoFrames);
        }
        codec.rewind()?;

        let raw = if metadata_only {
            None
        } else {
            let mut raw = RawFrame::default();
            raw.pixels
                .try_reserve_exact(usize::from(screen.width) * usize::from(screen.height))
                .map_err(|_| Error::NotEnoughMemory)?;
            Some(raw)
        };

        Ok(Self {
            compositor: Compositor::new(screen.width, screen.height, metadata.backup),
            codec,
            screen,
            frames: metadata.frames,
            comment: metadata.comment,
            loop_count: metadata.loop_count,
            loops: LoopState::from_raw(metadata.loop_count),
            raw,
            buffer_len,
            current: None,
            next_due: 0,
            remainder: None,
            speed: 1.0,
            error: None,
            fatal: false,
        })
    }

    /// Renders the next frame if it is due at `now` (milliseconds).
    ///
    /// Not-yet-due, a spent loop budget and failed streams all report
    /// [`Advance::Pending`]; otherwise the next frame (wrapping past the
    /// last) is decoded and composited onto `canvas` and the new delay is
    /// returned.
    ///
    /// # Panics
    ///
    /// Panics if `canvas` is not exactly [`buffer_size`](Player::buffer_size)
    /// bytes.
    pub fn advance(&mut self, canvas: &mut [u8], now: u64) -> Advance {
        self.assert_canvas(canvas);
        if self.fatal || self.raw.is_none() || now < self.next_due || self.loops.exhausted() {
            return Advance::Pending {
                remaining: self.next_due.saturating_sub(now),
            };
        }

        let index = match self.current {
            Some(i) => (i + 1) % self.frames.len(),
            None => 0,
        };
        self.current = Some(index);
        if !self.render(canvas, index) {
            return Advance::Pending { remaining: 0 };
        }

        let delay = self.scaled_duration(index);
        self.next_due = now + delay;
        Advance::Rendered {
            cycle_complete: index + 1 == self.frames.len(),
            delay,
        }
    }

    /// Seeks forward to `index`, compositing every intermediate frame.
    ///
    /// A target at or before the current frame is a no-op: the canvas only
    /// moves forward (seeking backward requires [`reset`](Player::reset)).
    /// Targets past the end clamp to the last frame. The frame becomes due
    /// `duration(target)` after `now`, speed-scaled.
    ///
    /// # Panics
    ///
    /// Panics if `canvas` is not exactly [`buffer_size`](Player::buffer_size)
    /// bytes.
    pub fn seek_to_frame(&mut self, canvas: &mut [u8], index: usize, now: u64) {
        self.assert_canvas(canvas);
        if self.fatal || self.raw.is_none() || self.frames.len() <= 1 {
            return;
        }
        if self.current.is_some_and(|current| index <= current) {
            return;
        }
        let target = index.min(self.frames.len() - 1);
        self.remainder = Some(0);
        if !self.advance_to(canvas, target) {
            return;
        }
        self.next_due = now + self.scaled_duration(target);
    }

    /// Seeks forward to the frame on display `target_ms` into the animation.
    ///
    /// The target frame is found by accumulating descriptor durations until
    /// the running sum reaches `target_ms`; the leftover within that frame
    /// is saved as the remaining display time. A target resolving to a frame
    /// before the current one is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `canvas` is not exactly [`buffer_size`](Player::buffer_size)
    /// bytes.
    pub fn seek_to_time(&mut self, canvas: &mut [u8], target_ms: u64, now: u64) {
        self.assert_canvas(canvas);
        if self.fatal || self.raw.is_none() || self.frames.len() <= 1 {
            return;
        }

        let mut sum: u64 = 0;
        let mut found = None;
        for (i, frame) in self.frames.iter().enumerate() {
            let with_frame = sum + u64::from(frame.duration_ms);
            if with_frame >= target_ms {
                found = Some(i);
                break;
            }
            sum = with_frame;
        }
        let index = match found {
            Some(i) => i,
            None => {
                // past the end: land on the last frame
                let last = self.frames.len() - 1;
                sum -= u64::from(self.frames[last].duration_ms);
                last
            }
        };
        if self.current.is_some_and(|current| index < current) {
            return;
        }

        let mut remainder = target_ms - sum;
        if index + 1 == self.frames.len() {
            remainder = remainder.min(u64::from(self.frames[index].duration_ms));
        }
        if !self.advance_to(canvas, index) {
            return;
        }
        self.remainder = Some(remainder);
        self.next_due = now + self.scale(remainder);
    }

    /// Rewinds playback to before frame 0.
    ///
    /// Used by callers to restart, and internally after a mid-stream decode
    /// failure. A rewind failure here marks the stream permanently broken:
    /// every later operation becomes a no-op and
    /// [`last_error`](Player::last_error) stays at
    /// [`Error::RewindFailed`].
    pub fn reset(&mut self) {
        if self.fatal {
            return;
        }
        if self.rewind_playback().is_err() {
            self.fatal = true;
            self.error = Some(Error::RewindFailed);
        }
    }

    /// Sets the playback speed multiplier. Frame durations are divided by
    /// the factor, so 2.0 plays twice as fast.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is not strictly positive.
    pub fn set_speed_factor(&mut self, factor: f32) {
        assert!(factor > 0.0, "speed factor must be positive");
        self.speed = factor;
    }

    /// Captures the display time left on the current frame, so a pause does
    /// not count against it.
    pub fn save_remainder(&mut self, now: u64) {
        if self.fatal {
            return;
        }
        self.remainder = Some(self.next_due.saturating_sub(now));
    }

    /// Restores a saved remainder: the current frame stays on display for
    /// the captured time counted from `now`. No-op without a saved value.
    pub fn restore_remainder(&mut self, now: u64) {
        if self.fatal {
            return;
        }
        if let Some(remainder) = self.remainder.take() {
            self.next_due = now + remainder;
        }
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u16 {
        self.screen.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u16 {
        self.screen.height
    }

    /// Number of frames in the stream.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Required canvas length in bytes (`width × height × 4`).
    pub fn buffer_size(&self) -> usize {
        self.buffer_len
    }

    /// Concatenated comment-extension text, empty when the stream has none.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Raw loop count from the stream; 0 means loop forever.
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    /// Sum of all frame durations in milliseconds, unscaled.
    pub fn total_duration(&self) -> u64 {
        self.frames
            .iter()
            .map(|frame| u64::from(frame.duration_ms))
            .sum()
    }

    /// Position within the animation in milliseconds: durations of all
    /// frames before the current one plus the elapsed share of the current
    /// frame (per the saved remainder when paused).
    pub fn current_position(&self, now: u64) -> u64 {
        let Some(index) = self.current else {
            return 0;
        };
        if self.frames.len() <= 1 {
            return 0;
        }
        let before: u64 = self.frames[..index]
            .iter()
            .map(|frame| u64::from(frame.duration_ms))
            .sum();
        let duration = u64::from(self.frames[index].duration_ms);
        let remaining = self
            .remainder
            .unwrap_or_else(|| self.next_due.saturating_sub(now))
            .min(duration);
        before + (duration - remaining)
    }

    /// The stream's sticky error code, if any decode-time failure occurred.
    pub fn last_error(&self) -> Option<Error> {
        self.error
    }

    /// Releases the byte source, dropping all playback state.
    pub fn into_inner(self) -> S {
        self.codec.into_inner()
    }

    /// Advances one frame at a time until `target` is on the canvas.
    /// Returns false when a decode failure stopped the walk.
    fn advance_to(&mut self, canvas: &mut [u8], target: usize) -> bool {
        loop {
            let next = match self.current {
                None => 0,
                Some(current) if current < target => current + 1,
                _ => return true,
            };
            self.current = Some(next);
            if !self.render(canvas, next) {
                return false;
            }
        }
    }

    /// Decode + composite with the failure policy applied: errors are made
    /// sticky and playback resets to frame 0; a failed rewind is fatal.
    fn render(&mut self, canvas: &mut [u8], index: usize) -> bool {
        match self.render_frame(canvas, index) {
            Ok(()) => true,
            Err(Error::RewindFailed) => {
                self.error = Some(Error::RewindFailed);
                self.fatal = true;
                false
            }
            Err(err) => {
                self.error = Some(err);
                if self.rewind_playback().is_err() {
                    self.fatal = true;
                    self.error = Some(Error::RewindFailed);
                }
                false
            }
        }
    }

    fn render_frame(&mut self, canvas: &mut [u8], index: usize) -> Result<(), Error> {
        // Walk to the next image record; extensions were consumed by the
        // metadata pass and are skipped here.
        loop {
            match self.codec.next_record()? {
                Record::Image => break,
                Record::Extension => {
                    let _label = self.codec.read_extension_label()?;
                    self.codec.skip_sub_blocks()?;
                }
                Record::Trailer => return Err(Error::ReadFailed),
            }
        }

        let Some(raw) = self.raw.as_mut() else {
            return Err(Error::ReadFailed);
        };
        decode_frame(&mut self.codec, raw, self.screen.width, self.screen.height)?;

        // Past the last frame the stream loops: count the finished cycle and
        // reposition the codec at frame 0 without re-parsing metadata.
        if index + 1 == self.frames.len() {
            self.loops.complete_cycle();
            self.codec.rewind()?;
        }

        self.compositor.composite(
            canvas,
            index,
            &self.frames,
            raw,
            self.screen.effective_triples(),
            self.screen.background,
        );
        Ok(())
    }

    fn rewind_playback(&mut self) -> Result<(), Error> {
        self.codec.rewind()?;
        self.current = None;
        self.next_due = 0;
        self.remainder = None;
        self.loops.restart();
        Ok(())
    }

    fn scaled_duration(&self, index: usize) -> u64 {
        self.scale(u64::from(self.frames[index].duration_ms))
    }

    /// Divides a duration by the speed factor, clamped to `1..=i32::MAX` so
    /// zero-length frames still yield a schedulable delay.
    fn scale(&self, duration: u64) -> u64 {
        let scaled = (duration as f64 / f64::from(self.speed)) as u64;
        scaled.clamp(1, i32::MAX as u64)
    }

    fn assert_canvas(&self, canvas: &[u8]) {
        assert_eq!(
            canvas.len(),
            self.buffer_len,
            "canvas must be width * height * 4 bytes"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_state_budget() {
        let mut loops = LoopState::from_raw(2);
        assert!(!loops.exhausted());
        loops.complete_cycle();
        assert!(!loops.exhausted());
        loops.complete_cycle();
        assert!(loops.exhausted());
        loops.restart();
        assert!(!loops.exhausted());

        let mut forever = LoopState::from_raw(0);
        for _ in 0..1000 {
            forever.complete_cycle();
        }
        assert!(!forever.exhausted());
    }

    #[test]
    fn finite_loop_counter_saturates() {
        let mut loops = LoopState::Finite {
            completed: u16::MAX,
            limit: 1,
        };
        loops.complete_cycle();
        assert!(loops.exhausted());
    }
}
