use std::io::{self, Read};

use crate::consts::{QOI_PADDING_SIZE, QOI_STREAM_BUF_SIZE};
use crate::error::{Error, Result};
use crate::utils::{try_alloc_zeroed, unlikely};

/// Lookahead the decoder is guaranteed before each op: enough for the longest
/// op (5 bytes) and for the end marker.
const LOOKAHEAD: usize = QOI_PADDING_SIZE;

/// Once the read position reaches this offset the window slides.
const STALE: usize = QOI_STREAM_BUF_SIZE - LOOKAHEAD;

/// Fixed-size sliding window over a byte source.
///
/// `buf[pos..end]` holds bytes that were read from the source but not yet
/// consumed. After [`StreamBuf::prepare`] returns `Ok`, either at least
/// `LOOKAHEAD` bytes are buffered or the source is exhausted and everything it
/// produced is buffered. Memory use is bounded by the window size no matter how
/// large the image is.
pub struct StreamBuf<R> {
    reader: R,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
    exhausted: bool,
}

impl<R: Read> StreamBuf<R> {
    pub fn new(reader: R) -> Result<Self> {
        let buf = try_alloc_zeroed(QOI_STREAM_BUF_SIZE)?.into_boxed_slice();
        Ok(Self { reader, buf, pos: 0, end: 0, exhausted: false })
    }

    /// Reads until the window is full or the source reports end of stream.
    fn fill(&mut self) -> Result<()> {
        while !self.exhausted && self.end < self.buf.len() {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => self.exhausted = true,
                Ok(n) => self.end += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Must be called before decoding each op.
    ///
    /// Slides the trailing `LOOKAHEAD` bytes to the front once the read
    /// position goes stale and refills the freed space. Fails if nothing at all
    /// is left to read.
    #[inline]
    pub fn prepare(&mut self) -> Result<()> {
        if self.pos >= STALE {
            self.buf.copy_within(STALE..self.end, 0);
            self.end -= STALE;
            self.pos -= STALE;
            self.fill()?;
        } else if self.pos == self.end {
            self.fill()?;
        }
        if unlikely(self.pos >= self.end) {
            return Err(Error::UnexpectedBufferEnd);
        }
        Ok(())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        if unlikely(self.pos >= self.end) {
            return Err(Error::UnexpectedBufferEnd);
        }
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        if unlikely(self.end - self.pos < N) {
            return Err(Error::UnexpectedBufferEnd);
        }
        let mut out = [0; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Number of buffered, not yet consumed bytes.
    #[cfg(test)]
    pub const fn buffered(&self) -> usize {
        self.end - self.pos
    }

    /// Returns the underlying reader. Bytes still sitting in the window are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
