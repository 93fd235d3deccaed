//! Lookahead helpers shared by the sub-codecs and a `BufRead` adapter which counts consumed bytes.

use crate::error::DecodeError;
use std::io::{self, BufRead, Read};

/// Returns the next byte of the source without consuming it, or `None` at the end of input.
#[inline]
pub(crate) fn peek<R: BufRead + ?Sized>(r: &mut R) -> Result<Option<u8>, DecodeError> {
    Ok(r.fill_buf()?.first().copied())
}

/// Consumes the next byte if it equals `expected`.
#[inline]
pub(crate) fn next_is<R: BufRead + ?Sized>(r: &mut R, expected: u8) -> Result<bool, DecodeError> {
    if peek(r)? == Some(expected) {
        r.consume(1);
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Keeps track of the input position so errors can report where decoding stopped.
pub(crate) struct Tracked<R> {
    inner: R,
    pos: usize,
}

impl<R> Tracked<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> Read for Tracked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let c = self.inner.read(buf)?;
        self.pos += c;
        Ok(c)
    }
}

impl<R: BufRead> BufRead for Tracked<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.pos += amt;
        self.inner.consume(amt)
    }
}
