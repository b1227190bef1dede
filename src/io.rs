//! Byte-source traits and types for std and no_std environments.
//!
//! The playback engine pulls bytes from a [`Source`]: a readable stream that
//! can record a mark position and later rewind to it. Rewinding to the mark
//! (set right after the GIF header is parsed) is how cyclic playback and
//! forward-only seeking replay the frame records without re-parsing metadata.
//! The trait uses a fixed `IoError` type to avoid code duplication between
//! the std and no_std builds.

use core::fmt;

// Re-export ErrorKind for error construction
pub use embedded_io::ErrorKind;

// ============================================================================
// IoError - unified error type
// ============================================================================

/// I/O error type used by this crate.
///
/// In std mode, this wraps `std::io::Error`. In no_std mode, it contains an `ErrorKind`.
#[derive(Debug)]
pub struct IoError {
    #[cfg(feature = "std")]
    inner: std::io::Error,
    #[cfg(not(feature = "std"))]
    kind: ErrorKind,
}

impl IoError {
    /// Create a new error from an ErrorKind.
    #[cfg(not(feature = "std"))]
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Create a new error from an ErrorKind.
    #[cfg(feature = "std")]
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        let io_kind = match kind {
            ErrorKind::NotFound => std::io::ErrorKind::NotFound,
            ErrorKind::PermissionDenied => std::io::ErrorKind::PermissionDenied,
            ErrorKind::ConnectionRefused => std::io::ErrorKind::ConnectionRefused,
            ErrorKind::ConnectionReset => std::io::ErrorKind::ConnectionReset,
            ErrorKind::ConnectionAborted => std::io::ErrorKind::ConnectionAborted,
            ErrorKind::NotConnected => std::io::ErrorKind::NotConnected,
            ErrorKind::AddrInUse => std::io::ErrorKind::AddrInUse,
            ErrorKind::AddrNotAvailable => std::io::ErrorKind::AddrNotAvailable,
            ErrorKind::BrokenPipe => std::io::ErrorKind::BrokenPipe,
            ErrorKind::AlreadyExists => std::io::ErrorKind::AlreadyExists,
            ErrorKind::InvalidInput => std::io::ErrorKind::InvalidInput,
            ErrorKind::InvalidData => std::io::ErrorKind::InvalidData,
            ErrorKind::TimedOut => std::io::ErrorKind::TimedOut,
            ErrorKind::Interrupted => std::io::ErrorKind::Interrupted,
            ErrorKind::WriteZero => std::io::ErrorKind::WriteZero,
            ErrorKind::OutOfMemory => std::io::ErrorKind::OutOfMemory,
            _ => std::io::ErrorKind::Other,
        };
        Self {
            inner: std::io::Error::new(io_kind, "io error"),
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        #[cfg(feature = "std")]
        {
            match self.inner.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
                std::io::ErrorKind::ConnectionRefused => ErrorKind::ConnectionRefused,
                std::io::ErrorKind::ConnectionReset => ErrorKind::ConnectionReset,
                std::io::ErrorKind::ConnectionAborted => ErrorKind::ConnectionAborted,
                std::io::ErrorKind::NotConnected => ErrorKind::NotConnected,
                std::io::ErrorKind::AddrInUse => ErrorKind::AddrInUse,
                std::io::ErrorKind::AddrNotAvailable => ErrorKind::AddrNotAvailable,
                std::io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
                std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
                std::io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
                std::io::ErrorKind::InvalidData => ErrorKind::InvalidData,
                std::io::ErrorKind::TimedOut => ErrorKind::TimedOut,
                std::io::ErrorKind::Interrupted => ErrorKind::Interrupted,
                std::io::ErrorKind::WriteZero => ErrorKind::WriteZero,
                std::io::ErrorKind::OutOfMemory => ErrorKind::OutOfMemory,
                std::io::ErrorKind::UnexpectedEof => ErrorKind::Other,
                _ => ErrorKind::Other,
            }
        }
        #[cfg(not(feature = "std"))]
        {
            self.kind
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "std")]
        {
            self.inner.fmt(f)
        }
        #[cfg(not(feature = "std"))]
        {
            write!(f, "I/O error: {:?}", self.kind)
        }
    }
}

impl core::error::Error for IoError {
    #[cfg(feature = "std")]
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.inner.source()
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for IoError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self { inner: err }
    }
}

#[cfg(feature = "std")]
impl From<IoError> for std::io::Error {
    #[inline]
    fn from(err: IoError) -> Self {
        err.inner
    }
}

impl From<ErrorKind> for IoError {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<core::convert::Infallible> for IoError {
    #[inline]
    fn from(e: core::convert::Infallible) -> Self {
        match e {}
    }
}

/// Result type for I/O operations.
pub type Result<T> = core::result::Result<T, IoError>;

// ============================================================================
// Source - readable, rewindable byte stream
// ============================================================================

/// A readable byte stream with a single rewind point.
///
/// [`mark`](Source::mark) records the current position; [`rewind`](Source::rewind)
/// returns to it. The engine marks the stream once, directly after the GIF
/// header, and rewinds there after each full pass over the frame records.
/// The mark is not necessarily absolute offset 0; a caller may hand over a
/// stream positioned mid-file, e.g. inside a container format.
pub trait Source {
    /// Read bytes into `buf`, returning the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Record the current position as the rewind point.
    fn mark(&mut self) -> Result<()>;

    /// Return to the position recorded by the last [`mark`](Source::mark).
    fn rewind(&mut self) -> Result<()>;

    /// Read exactly `buf.len()` bytes or error.
    fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.read(buf) {
                Ok(0) => return Err(IoError::new(ErrorKind::Other)), // UnexpectedEof
                Ok(n) => buf = &mut buf[n..],
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl<S: Source + ?Sized> Source for &mut S {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    #[inline]
    fn mark(&mut self) -> Result<()> {
        (**self).mark()
    }

    #[inline]
    fn rewind(&mut self) -> Result<()> {
        (**self).rewind()
    }
}

/// In-memory byte source over any `AsRef<[u8]>`.
///
/// Reads never block and rewinding cannot fail. Available in no_std builds.
pub struct MemorySource<T> {
    data: T,
    pos: usize,
    mark: usize,
}

impl<T: AsRef<[u8]>> MemorySource<T> {
    /// Creates a source positioned at the start of `data`.
    #[inline]
    pub fn new(data: T) -> Self {
        Self {
            data,
            pos: 0,
            mark: 0,
        }
    }

    /// Unwraps this source, returning the underlying buffer.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: AsRef<[u8]>> Source for MemorySource<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let data = self.data.as_ref();
        let remaining = &data[self.pos.min(data.len())..];
        let amt = core::cmp::min(buf.len(), remaining.len());
        buf[..amt].copy_from_slice(&remaining[..amt]);
        self.pos += amt;
        Ok(amt)
    }

    #[inline]
    fn mark(&mut self) -> Result<()> {
        self.mark = self.pos;
        Ok(())
    }

    #[inline]
    fn rewind(&mut self) -> Result<()> {
        self.pos = self.mark;
        Ok(())
    }
}

/// Byte source over any `std::io::Read + Seek`, e.g. a [`BufReader`](std::io::BufReader)
/// around a file.
///
/// The rewind point is a stream offset; rewinding seeks back to it.
#[cfg(feature = "std")]
pub struct SeekSource<R> {
    inner: R,
    mark: u64,
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> SeekSource<R> {
    /// Creates a source whose initial rewind point is the stream's current
    /// position.
    pub fn new(mut inner: R) -> Result<Self> {
        let mark = inner.stream_position()?;
        Ok(Self { inner, mark })
    }

    /// Unwraps this source, returning the underlying reader.
    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> Source for SeekSource<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf).map_err(IoError::from)
    }

    fn mark(&mut self) -> Result<()> {
        self.mark = self.inner.stream_position()?;
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        self.inner.seek(std::io::SeekFrom::Start(self.mark))?;
        Ok(())
    }
}
