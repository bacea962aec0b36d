//! Streaming Quoted-Printable transfer encoding (RFC 2045 section 6.7).

use std::io::{self, Read, Write};

use crate::error::Error;

/// Maximum encoded line length, including the `=` of a soft break.
const MAX_LINE_LENGTH: usize = 76;

/// Size of the buffer used to pull encoded bytes from the source.
const READ_BUFFER_SIZE: usize = 4096;

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Quoted-Printable encoder.
///
/// The current output line is buffered so trailing whitespace can be
/// escaped once the end of the line is known. A CRLF pair in the input is
/// written as a hard line break; a lone CR or LF is escaped so the decoded
/// bytes match the input exactly.
///
/// [`Write::flush`] only flushes the sink. Call [`finish`] to write the last
/// line.
///
/// [`finish`]: QuotedPrintableWriter::finish
#[derive(Debug)]
pub struct QuotedPrintableWriter<W> {
    inner: W,
    line: Vec<u8>,
    pending_cr: bool,
}

impl<W: Write> QuotedPrintableWriter<W> {
    /// Creates an encoder writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            inner: sink,
            line: Vec::with_capacity(MAX_LINE_LENGTH + 2),
            pending_cr: false,
        }
    }

    /// Writes the buffered line and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the final line cannot be written.
    pub fn finish(mut self) -> io::Result<W> {
        if self.pending_cr {
            self.pending_cr = false;
            self.escape(b'\r')?;
        }
        self.escape_trailing_whitespace()?;
        self.flush_line()?;
        Ok(self.inner)
    }

    fn encode_byte(&mut self, byte: u8) -> io::Result<()> {
        if self.pending_cr {
            self.pending_cr = false;
            if byte == b'\n' {
                return self.hard_break();
            }
            self.escape(b'\r')?;
        }

        match byte {
            b'\r' => {
                self.pending_cr = true;
                Ok(())
            }
            b'!'..=b'<' | b'>'..=b'~' | b' ' | b'\t' => self.literal(byte),
            _ => self.escape(byte),
        }
    }

    fn literal(&mut self, byte: u8) -> io::Result<()> {
        if self.line.len() == MAX_LINE_LENGTH - 1 {
            self.soft_break()?;
        }
        self.line.push(byte);
        Ok(())
    }

    fn escape(&mut self, byte: u8) -> io::Result<()> {
        if MAX_LINE_LENGTH - 1 - self.line.len() < 3 {
            self.soft_break()?;
        }
        self.line.extend_from_slice(&[
            b'=',
            UPPER_HEX[usize::from(byte >> 4)],
            UPPER_HEX[usize::from(byte & 0x0f)],
        ]);
        Ok(())
    }

    /// Escapes a space or tab ending the line; a bare one would be
    /// stripped as transport padding.
    fn escape_trailing_whitespace(&mut self) -> io::Result<()> {
        match self.line.last() {
            Some(&byte) if byte == b' ' || byte == b'\t' => {
                self.line.pop();
                self.escape(byte)
            }
            _ => Ok(()),
        }
    }

    fn soft_break(&mut self) -> io::Result<()> {
        self.line.extend_from_slice(b"=\r\n");
        self.flush_line()
    }

    fn hard_break(&mut self) -> io::Result<()> {
        self.escape_trailing_whitespace()?;
        self.line.extend_from_slice(b"\r\n");
        self.flush_line()
    }

    fn flush_line(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.line)?;
        self.line.clear();
        Ok(())
    }
}

impl<W: Write> Write for QuotedPrintableWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            self.encode_byte(byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Text,
    /// Raw CR seen; LF makes it a hard line break.
    Cr,
    /// `=` seen at the given offset.
    Escape(u64),
    /// First hex digit of an escape seen.
    EscapeHex(u64, u8),
    /// `=` followed by transport whitespace; only a line break may follow.
    SoftPadding(u64),
    /// Soft break CR seen; LF must follow.
    SoftCr(u64),
}

/// Quoted-Printable decoder over an encoded source.
///
/// Spaces and tabs before a line break are transport padding and dropped.
/// Hard line breaks are passed through as found: a bare LF is accepted as
/// a line break even though the encoder only writes CRLF, since mail
/// stored with Unix line endings is common. A lone CR is kept as data
/// together with any whitespace before it.
#[derive(Debug)]
pub struct QuotedPrintableReader<R> {
    source: R,
    raw: Box<[u8]>,
    offset: u64,
    state: DecodeState,
    whitespace: Vec<u8>,
    decoded: Vec<u8>,
    decoded_pos: usize,
    eof: bool,
}

impl<R: Read> QuotedPrintableReader<R> {
    /// Creates a decoder reading from `source`.
    pub fn new(source: R) -> Self {
        Self {
            source,
            raw: vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
            offset: 0,
            state: DecodeState::Text,
            whitespace: Vec::new(),
            decoded: Vec::with_capacity(READ_BUFFER_SIZE),
            decoded_pos: 0,
            eof: false,
        }
    }

    /// Unwraps the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn fill(&mut self) -> io::Result<()> {
        let n = self.source.read(&mut self.raw)?;
        self.decoded.clear();
        self.decoded_pos = 0;

        if n == 0 {
            self.eof = true;
            return self.finish_input().map_err(Into::into);
        }

        for i in 0..n {
            let byte = self.raw[i];
            let pos = self.offset + i as u64;
            self.decode_byte(byte, pos)?;
        }
        self.offset += n as u64;
        Ok(())
    }

    fn decode_byte(&mut self, byte: u8, pos: u64) -> Result<(), Error> {
        let state = self.state;
        self.state = match state {
            DecodeState::Text => self.text_byte(byte, pos)?,
            DecodeState::Cr => {
                if byte == b'\n' {
                    self.whitespace.clear();
                    self.decoded.extend_from_slice(b"\r\n");
                    DecodeState::Text
                } else {
                    self.decoded.append(&mut self.whitespace);
                    self.decoded.push(b'\r');
                    self.text_byte(byte, pos)?
                }
            }
            DecodeState::Escape(start) => match byte {
                b'\n' => DecodeState::Text,
                b'\r' => DecodeState::SoftCr(start),
                b' ' | b'\t' => DecodeState::SoftPadding(start),
                _ => match hex_value(byte) {
                    Some(hi) => DecodeState::EscapeHex(start, hi),
                    None => return Err(invalid_escape(start)),
                },
            },
            DecodeState::EscapeHex(start, hi) => match hex_value(byte) {
                Some(lo) => {
                    self.decoded.push((hi << 4) | lo);
                    DecodeState::Text
                }
                None => return Err(invalid_escape(start)),
            },
            DecodeState::SoftPadding(start) => match byte {
                b' ' | b'\t' => DecodeState::SoftPadding(start),
                b'\r' => DecodeState::SoftCr(start),
                b'\n' => DecodeState::Text,
                _ => return Err(invalid_escape(start)),
            },
            DecodeState::SoftCr(start) => {
                if byte == b'\n' {
                    DecodeState::Text
                } else {
                    return Err(invalid_escape(start));
                }
            }
        };
        Ok(())
    }

    fn text_byte(&mut self, byte: u8, pos: u64) -> Result<DecodeState, Error> {
        match byte {
            b' ' | b'\t' => {
                self.whitespace.push(byte);
                return Ok(DecodeState::Text);
            }
            // Whitespace stays pending until the next byte shows whether
            // this CR ends the line.
            b'\r' => return Ok(DecodeState::Cr),
            b'\n' => {
                self.whitespace.clear();
                self.decoded.push(b'\n');
                return Ok(DecodeState::Text);
            }
            _ => {}
        }

        self.decoded.append(&mut self.whitespace);
        match byte {
            b'=' => Ok(DecodeState::Escape(pos)),
            b'!'..=b'~' => {
                self.decoded.push(byte);
                Ok(DecodeState::Text)
            }
            _ => Err(Error::malformed(
                Some(pos),
                format!("invalid unescaped byte 0x{byte:02X}"),
            )),
        }
    }

    fn finish_input(&mut self) -> Result<(), Error> {
        match self.state {
            DecodeState::Cr => {
                self.decoded.append(&mut self.whitespace);
                self.decoded.push(b'\r');
                Ok(())
            }
            // `=` at the very end is a soft break with nothing after it.
            DecodeState::Text | DecodeState::Escape(_) | DecodeState::SoftPadding(_) => {
                self.whitespace.clear();
                Ok(())
            }
            DecodeState::EscapeHex(start, _) | DecodeState::SoftCr(start) => {
                Err(invalid_escape(start))
            }
        }
    }
}

impl<R: Read> Read for QuotedPrintableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.decoded_pos == self.decoded.len() {
            if self.eof {
                return Ok(0);
            }
            self.fill()?;
        }

        let pending = &self.decoded[self.decoded_pos..];
        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.decoded_pos += n;
        Ok(n)
    }
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

fn invalid_escape(position: u64) -> Error {
    Error::malformed(Some(position), "invalid quoted-printable escape sequence")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode(data: &[u8]) -> String {
        let mut w = QuotedPrintableWriter::new(Vec::new());
        w.write_all(data).unwrap();
        String::from_utf8(w.finish().unwrap()).unwrap()
    }

    fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        QuotedPrintableReader::new(data)
            .read_to_end(&mut out)
            .map_err(Error::from_read)?;
        Ok(out)
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode(b"Hello, World!"), "Hello, World!");
        assert_eq!(encode("Héllo, Wørld!".as_bytes()), "H=C3=A9llo, W=C3=B8rld!");
        assert_eq!(encode(b"a=b"), "a=3Db");
    }

    #[test]
    fn test_quoted_printable_encode_trailing_whitespace() {
        assert_eq!(encode(b"end "), "end=20");
        assert_eq!(encode(b"tab\t\r\nnext"), "tab=09\r\nnext");
        assert_eq!(encode(b"a b"), "a b");
    }

    #[test]
    fn test_quoted_printable_encode_line_breaks() {
        assert_eq!(encode(b"one\r\ntwo\r\n"), "one\r\ntwo\r\n");
        assert_eq!(encode(b"bare\nlf"), "bare=0Alf");
        assert_eq!(encode(b"bare\rcr"), "bare=0Dcr");
        assert_eq!(encode(b"ends\r"), "ends=0D");
    }

    #[test]
    fn test_quoted_printable_encode_crlf_split_across_writes() {
        let mut w = QuotedPrintableWriter::new(Vec::new());
        w.write_all(b"line\r").unwrap();
        w.write_all(b"\nnext").unwrap();
        assert_eq!(w.finish().unwrap(), b"line\r\nnext");
    }

    #[test]
    fn test_quoted_printable_encode_soft_breaks() {
        let out = encode(&[b'x'; 200]);
        for line in out.split("\r\n") {
            assert!(line.len() <= MAX_LINE_LENGTH);
        }
        assert!(out.starts_with(&format!("{}=\r\n", "x".repeat(75))));
        assert_eq!(out.replace("=\r\n", ""), "x".repeat(200));
    }

    #[test]
    fn test_quoted_printable_escape_not_split() {
        let mut input = vec![b'x'; 74];
        input.push(0xFF);
        let out = encode(&input);
        assert_eq!(out, format!("{}=\r\n=FF", "x".repeat(74)));
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode(b"Hello, World!").unwrap(), b"Hello, World!");
        assert_eq!(decode(b"H=C3=A9llo").unwrap(), "Héllo".as_bytes());
        assert_eq!(decode(b"h=c3=a9").unwrap(), "hé".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode(b"Hello=\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode(b"Hello= \t\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode(b"Hello=").unwrap(), b"Hello");
    }

    #[test]
    fn test_quoted_printable_decode_strips_transport_padding() {
        assert_eq!(decode(b"one  \r\ntwo\t\nthree ").unwrap(), b"one\r\ntwo\nthree");
        assert_eq!(decode(b"a b =\r\nc").unwrap(), b"a b c");
    }

    #[test]
    fn test_quoted_printable_decode_lone_cr_keeps_whitespace() {
        assert_eq!(decode(b"a \rb").unwrap(), b"a \rb");
        assert_eq!(decode(b"a\t\r").unwrap(), b"a\t\r");
        assert_eq!(decode(b"a \r\r\nb").unwrap(), b"a \r\r\nb");
        assert_eq!(decode(b"a \r\nb").unwrap(), b"a\r\nb");
    }

    #[test]
    fn test_quoted_printable_decode_invalid_escape() {
        let err = decode(b"abc=XYdef").unwrap_err();
        match err {
            Error::MalformedInput { position, .. } => assert_eq!(position, Some(3)),
            other => panic!("unexpected error: {other}"),
        }

        assert!(decode(b"abc=4").unwrap_err().is_malformed());
        assert!(decode(b"abc= x").unwrap_err().is_malformed());
    }

    #[test]
    fn test_quoted_printable_decode_rejects_raw_8bit() {
        let err = decode(b"ok\xFF").unwrap_err();
        match err {
            Error::MalformedInput { position, .. } => assert_eq!(position, Some(2)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_quoted_printable_round_trip_binary() {
        let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
        let encoded = encode(&data);
        assert_eq!(decode(encoded.as_bytes()).unwrap(), data);
    }
}
