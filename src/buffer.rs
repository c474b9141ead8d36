use std::cmp;
use std::fmt;
use std::io;

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// The initial capacity of a buffer, in bytes.
pub const DEFAULT_CAPACITY: usize = 4 * 1024;

/// The maximum size a buffer may grow to, in bytes.
pub const DEFAULT_MAX_SIZE: usize = 64 * 1024;

/// A growable lookahead buffer over a reader.
///
/// The buffer holds the bytes read from the underlying reader that have not
/// been consumed yet. It only reads when asked to make more bytes
/// available with `ensure`, and it grows (doubling, up to a hard maximum)
/// only when the unconsumed bytes do not fit otherwise. Before growing, the
/// unconsumed bytes are moved to the front of the buffer.
///
/// The unconsumed bytes are handed out mutably so that a scanner can rewrite
/// fields in place.
pub struct Buffer<R> {
    rdr: R,
    buf: Vec<u8>,
    /// Start of the unconsumed bytes.
    r: usize,
    /// End of the unconsumed bytes.
    w: usize,
    max: usize,
    eof: bool,
}

impl<R: io::Read> Buffer<R> {
    /// Create a buffer with the default initial capacity and maximum size.
    pub fn new(rdr: R) -> Buffer<R> {
        Buffer::with_capacity(rdr, DEFAULT_CAPACITY, DEFAULT_MAX_SIZE)
    }

    /// Create a buffer with the given initial capacity and maximum size.
    ///
    /// The capacity is clamped to the maximum size, and both are at least
    /// one byte.
    pub fn with_capacity(rdr: R, capacity: usize, max: usize) -> Buffer<R> {
        let max = cmp::max(1, max);
        let capacity = cmp::max(1, cmp::min(capacity, max));
        Buffer { rdr, buf: vec![0; capacity], r: 0, w: 0, max, eof: false }
    }

    /// Make at least `n` unconsumed bytes available, reading as needed.
    ///
    /// Fewer bytes are available afterwards only if the reader is exhausted,
    /// which `is_eof` then reports.
    ///
    /// # Errors
    ///
    /// `Error::BufferOverflow` is returned if `n` exceeds the maximum size
    /// of the buffer and the reader still has data past a full buffer.
    /// `Error::Io` is returned if reading fails. Reads interrupted by a
    /// signal are retried.
    pub fn ensure(&mut self, n: usize) -> Result<()> {
        let want = cmp::min(n, self.max);
        while self.len() < want && !self.eof {
            if self.r + want > self.buf.len() {
                self.compact();
            }
            if want > self.buf.len() {
                self.grow(want);
            }
            self.fill()?;
        }
        if self.len() < n && !self.eof {
            // The buffer is full. Overflow only if the reader has more.
            if !self.at_end()? {
                debug!("buffer overflow: {} bytes requested, max {}", n, self.max);
                return Err(Error::BufferOverflow { max: self.max });
            }
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<()> {
        loop {
            match self.rdr.read(&mut self.buf[self.w..]) {
                Ok(0) => {
                    trace!("end of input after {} buffered bytes", self.len());
                    self.eof = true;
                }
                Ok(nread) => self.w += nread,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    continue
                }
                Err(err) => return Err(Error::Io(err)),
            }
            return Ok(());
        }
    }

    /// Check whether the reader is exhausted without room to store what it
    /// returns. A byte read here is lost, so this is only used right before
    /// reporting an overflow.
    fn at_end(&mut self) -> Result<bool> {
        let mut scratch = [0; 1];
        loop {
            match self.rdr.read(&mut scratch) {
                Ok(0) => {
                    trace!("end of input with a full buffer");
                    self.eof = true;
                    return Ok(true);
                }
                Ok(_) => return Ok(false),
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    /// Mark the first `n` unconsumed bytes as consumed.
    ///
    /// # Panics
    ///
    /// If fewer than `n` bytes are unconsumed.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.len(), "consumed more bytes than buffered");
        self.r += n;
    }

    /// Move the unconsumed bytes to the start of the buffer.
    pub fn compact(&mut self) {
        if self.r == 0 {
            return;
        }
        trace!("compacting {} unconsumed bytes", self.len());
        self.buf.copy_within(self.r..self.w, 0);
        self.w -= self.r;
        self.r = 0;
    }

    fn grow(&mut self, n: usize) {
        let old = self.buf.len();
        let new = cmp::min(cmp::max(old.saturating_mul(2), n), self.max);
        debug!("growing buffer from {} to {} bytes", old, new);
        self.buf.resize(new, 0);
    }

    /// The unconsumed bytes.
    pub fn unread(&self) -> &[u8] {
        &self.buf[self.r..self.w]
    }

    /// The unconsumed bytes, mutably.
    pub fn unread_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.r..self.w]
    }

    /// The number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.w - self.r
    }

    /// Returns true if there are no unconsumed bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once the reader has reported the end of its data.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// The offset of the first unconsumed byte within the whole buffer.
    pub(crate) fn position(&self) -> usize {
        self.r
    }

    /// The whole buffer, including consumed bytes that have not been
    /// compacted away yet.
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// The current capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The maximum size of the buffer.
    pub fn max_size(&self) -> usize {
        self.max
    }

    /// Return a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Return a mutable reference to the underlying reader.
    ///
    /// Reading from it directly skips over whatever is buffered.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.rdr
    }

    /// Unwrap this buffer, returning the underlying reader.
    ///
    /// Note that any leftover data in the buffer is lost.
    pub fn into_inner(self) -> R {
        self.rdr
    }
}

impl<R: fmt::Debug> fmt::Debug for Buffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("rdr", &self.rdr)
            .field("unread", &(self.w - self.r))
            .field("capacity", &self.buf.len())
            .field("max", &self.max)
            .field("eof", &self.eof)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::error::Error;

    use super::Buffer;

    /// A reader that returns at most `chunk` bytes per read, and interrupts
    /// every other read.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
        interrupt: bool,
    }

    impl<'a> io::Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "ouch"));
            }
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn reads_on_demand() {
        let mut buf = Buffer::with_capacity(&b"abcdef"[..], 4, 16);
        assert!(buf.is_empty());
        buf.ensure(2).unwrap();
        assert_eq!(buf.unread(), b"abcd");
        buf.consume(3);
        assert_eq!(buf.unread(), b"d");
        buf.ensure(3).unwrap();
        assert_eq!(buf.unread(), b"def");
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.capacity(), 4);
        buf.ensure(4).unwrap();
        assert!(buf.is_eof());
        assert_eq!(buf.unread(), b"def");
    }

    #[test]
    fn grows_by_doubling_up_to_max() {
        let data = vec![b'x'; 100];
        let mut buf = Buffer::with_capacity(&data[..], 4, 40);
        buf.ensure(5).unwrap();
        assert_eq!(buf.capacity(), 8);
        buf.ensure(20).unwrap();
        assert_eq!(buf.capacity(), 20);
        buf.ensure(39).unwrap();
        assert_eq!(buf.capacity(), 40);
        assert_eq!(buf.len(), 40);
    }

    #[test]
    fn overflow() {
        let data = vec![b'x'; 100];
        let mut buf = Buffer::with_capacity(&data[..], 4, 16);
        match buf.ensure(17) {
            Err(Error::BufferOverflow { max: 16 }) => {}
            res => panic!("expected overflow, got {:?}", res),
        }
    }

    #[test]
    fn full_buffer_at_eof() {
        let data = vec![b'x'; 16];
        let mut buf = Buffer::with_capacity(&data[..], 4, 16);
        buf.ensure(17).unwrap();
        assert!(buf.is_eof());
        assert_eq!(buf.len(), 16);

        let rdr = Trickle { data: &data, chunk: 5, interrupt: false };
        let mut buf = Buffer::with_capacity(rdr, 4, 16);
        buf.ensure(17).unwrap();
        assert!(buf.is_eof());
        assert_eq!(buf.unread(), &data[..]);
    }

    #[test]
    fn no_overflow_at_eof() {
        let mut buf = Buffer::with_capacity(&b"ab"[..], 4, 4);
        buf.ensure(2).unwrap();
        buf.ensure(3).unwrap();
        assert!(buf.is_eof());
        buf.ensure(100).unwrap();
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let rdr = Trickle { data: b"hello world", chunk: 3, interrupt: false };
        let mut buf = Buffer::with_capacity(rdr, 2, 64);
        buf.ensure(11).unwrap();
        assert_eq!(buf.unread(), b"hello world");
    }

    #[test]
    fn io_errors_surface() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "broken"))
            }
        }
        let mut buf = Buffer::new(Broken);
        match buf.ensure(1) {
            Err(Error::Io(ref err)) => assert_eq!(err.to_string(), "broken"),
            res => panic!("expected I/O error, got {:?}", res),
        }
    }

    #[test]
    fn compact_keeps_unread() {
        let mut buf = Buffer::with_capacity(&b"abcdef"[..], 8, 8);
        buf.ensure(6).unwrap();
        buf.consume(4);
        buf.compact();
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.unread(), b"ef");
        assert_eq!(&buf.as_slice()[..2], b"ef");
        buf.unread_mut()[0] = b'E';
        assert_eq!(buf.unread(), b"Ef");
    }
}
