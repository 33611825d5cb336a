//! Pull-based byte sources for the decoder.
//!
//! A [`Scanner`] hands the reader a *window* onto the logical byte stream.
//! The reader asks for more data only when its current window runs out, and
//! tells the scanner how many bytes at the front of the old window it will
//! never look at again, so a streaming source can discard them.

use crate::errors::Error;
use bytes::Bytes;
use std::io;

/// A pull-based source of bytes.
pub trait Scanner {
    /// Returns a new window onto the stream.
    ///
    /// The first `skip` bytes of the *previous* window will never be
    /// requested again and may be discarded; the returned window begins at
    /// the previous window's offset plus `skip`. The result must hold at
    /// least `min_bytes` bytes unless the stream is exhausted, in which case
    /// it holds whatever remains (the caller detects the shortfall).
    fn read(&mut self, skip: usize, min_bytes: usize) -> Result<Bytes, Error>;
}

/// A scanner over a buffer that is entirely in memory. Windows are zero-copy
/// slices of the original buffer.
#[derive(Clone, Debug)]
pub struct SliceScanner {
    data: Bytes,
    offset: usize,
}

impl SliceScanner {
    pub fn new(data: Bytes) -> SliceScanner { SliceScanner { data, offset: 0 } }
}

impl Scanner for SliceScanner {
    fn read(&mut self, skip: usize, _min_bytes: usize) -> Result<Bytes, Error> {
        debug_assert!(self.offset + skip <= self.data.len());
        self.offset = (self.offset + skip).min(self.data.len());
        Ok(self.data.slice_from(self.offset))
    }
}

/// A scanner that pulls from any [`io::Read`], buffering only the current
/// window, so arbitrarily large streams can be decoded without holding the
/// whole input in memory.
#[derive(Debug)]
pub struct IoScanner<R> {
    source: R,
    window: Vec<u8>,
    eof: bool,
}

impl<R: io::Read> IoScanner<R> {
    pub fn new(source: R) -> IoScanner<R> {
        IoScanner {
            source,
            window: Vec::new(),
            eof: false,
        }
    }
}

const IO_CHUNK_SIZE: usize = 4096;

impl<R: io::Read> Scanner for IoScanner<R> {
    fn read(&mut self, skip: usize, min_bytes: usize) -> Result<Bytes, Error> {
        debug_assert!(skip <= self.window.len());
        self.window.drain(..skip.min(self.window.len()));

        let mut chunk = [0u8; IO_CHUNK_SIZE];
        while self.window.len() < min_bytes && !self.eof {
            let n = self.source.read(&mut chunk).map_err(|e| Error::Scanner {
                message: e.to_string(),
            })?;
            if n == 0 {
                self.eof = true;
            } else {
                self.window.extend_from_slice(&chunk[..n]);
            }
        }

        Ok(Bytes::from(self.window.clone()))
    }
}
