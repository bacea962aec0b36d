//! Fixed-width line wrapping for encoded output.

use std::io::{self, Write};

/// MIME line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// Line length for wrapped base64 bodies (RFC 2045 section 6.8).
pub const BASE64_LINE_LENGTH: usize = 76;

/// Line length limit for 7bit and 8bit bodies (RFC 5322 section 2.1.1).
pub const SEVEN_BIT_LINE_LENGTH: usize = 1000;

/// Writer that inserts a separator after every `width` bytes.
///
/// The input is treated as opaque bytes: existing line breaks do not reset
/// the column. The separator is only written once more output follows, so
/// the stream never ends with an inserted separator.
#[derive(Debug)]
pub struct LineWrapper<W> {
    inner: W,
    width: usize,
    separator: &'static [u8],
    column: usize,
}

impl<W: Write> LineWrapper<W> {
    /// Creates a wrapper breaking lines every `width` bytes with `separator`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    #[must_use]
    pub fn new(inner: W, width: usize, separator: &'static [u8]) -> Self {
        assert!(width > 0, "line width must be positive");
        Self {
            inner,
            width,
            separator,
            column: 0,
        }
    }

    /// Creates a CRLF wrapper at the base64 line length.
    #[must_use]
    pub fn base64(inner: W) -> Self {
        Self::new(inner, BASE64_LINE_LENGTH, CRLF)
    }

    /// Creates a CRLF wrapper at the 7bit/8bit line length limit.
    #[must_use]
    pub fn seven_bit(inner: W) -> Self {
        Self::new(inner, SEVEN_BIT_LINE_LENGTH, CRLF)
    }

    /// Returns the number of bytes on the current output line.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Returns a reference to the wrapped sink.
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for LineWrapper<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            if self.column == self.width {
                self.inner.write_all(self.separator)?;
                self.column = 0;
            }

            let room = (self.width - self.column).min(rest.len());
            let (line, tail) = rest.split_at(room);
            self.inner.write_all(line)?;
            self.column += line.len();
            rest = tail;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn wrap(width: usize, chunks: &[&[u8]]) -> Vec<u8> {
        let mut w = LineWrapper::new(Vec::new(), width, CRLF);
        for chunk in chunks {
            w.write_all(chunk).unwrap();
        }
        w.into_inner()
    }

    #[test]
    fn test_wrap_inserts_separator_between_lines() {
        assert_eq!(wrap(4, &[b"abcdefghij"]), b"abcd\r\nefgh\r\nij");
    }

    #[test]
    fn test_wrap_no_trailing_separator_on_exact_fill() {
        assert_eq!(wrap(4, &[b"abcdefgh"]), b"abcd\r\nefgh");
        assert_eq!(wrap(4, &[b"abcd"]), b"abcd");
    }

    #[test]
    fn test_wrap_across_write_boundaries() {
        assert_eq!(wrap(3, &[b"ab", b"cd", b"", b"efg", b"h"]), b"abc\r\ndef\r\ngh");
    }

    #[test]
    fn test_wrap_ignores_existing_line_breaks() {
        assert_eq!(wrap(4, &[b"a\r\nbcd"]), b"a\r\nb\r\ncd");
    }

    #[test]
    fn test_wrap_column_tracking() {
        let mut w = LineWrapper::base64(Vec::new());
        w.write_all(&[b'A'; 80]).unwrap();
        assert_eq!(w.column(), 4);
        assert_eq!(w.get_ref().len(), 82);
    }

    #[test]
    fn test_single_write_consumes_whole_buffer() {
        let mut w = LineWrapper::new(Vec::new(), 4, CRLF);
        assert_eq!(w.write(b"abcdefghij").unwrap(), 10);
        assert_eq!(w.into_inner(), b"abcd\r\nefgh\r\nij");
    }

    #[test]
    fn test_seven_bit_width() {
        let out = wrap(SEVEN_BIT_LINE_LENGTH, &[&[b'x'; 2001]]);
        assert_eq!(out.len(), 2001 + 4);
        assert_eq!(&out[1000..1002], CRLF);
        assert_eq!(&out[2002..2004], CRLF);
    }
}
