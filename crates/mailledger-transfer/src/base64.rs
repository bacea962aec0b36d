//! Streaming base64 transfer encoding (RFC 2045 section 6.8).

use std::io::{self, Read, Write};

use ::base64::engine::GeneralPurpose;
use ::base64::engine::general_purpose::STANDARD;
use ::base64::write::EncoderWriter;
use ::base64::{DecodeError, Engine};

use crate::error::Error;
use crate::wrap::LineWrapper;

/// Size of the buffer used to pull encoded bytes from the source.
const READ_BUFFER_SIZE: usize = 4096;

/// Padding character.
const PAD: u8 = b'=';

/// Base64 encoder writing 76-column CRLF-wrapped lines.
///
/// Up to two input bytes stay pending between writes; [`finish`] encodes
/// them with padding. Dropping the writer without calling `finish` makes a
/// best-effort attempt and discards any error.
///
/// [`finish`]: Base64Writer::finish
pub struct Base64Writer<W: Write> {
    inner: EncoderWriter<'static, GeneralPurpose, LineWrapper<W>>,
}

impl<W: Write> Base64Writer<W> {
    /// Creates an encoder writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            inner: EncoderWriter::new(LineWrapper::base64(sink), &STANDARD),
        }
    }

    /// Writes the final quantum with padding and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the final output cannot be written.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.finish().map(LineWrapper::into_inner)
    }
}

impl<W: Write> Write for Base64Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The engine writer returns Ok(0) while it drains staged output.
        let mut consumed = 0;
        while consumed < buf.len() {
            consumed += self.inner.write(&buf[consumed..])?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> std::fmt::Debug for Base64Writer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Base64Writer").finish_non_exhaustive()
    }
}

/// Base64 decoder over an encoded source.
///
/// CR and LF are skipped so wrapped bodies decode. Any other byte outside
/// the standard alphabet is rejected with its offset in the source.
#[derive(Debug)]
pub struct Base64Reader<R> {
    source: R,
    raw: Box<[u8]>,
    /// Source bytes consumed so far.
    offset: u64,
    quad: [u8; 4],
    quad_pos: [u64; 4],
    quad_len: usize,
    decoded: Vec<u8>,
    decoded_pos: usize,
    padded: bool,
    eof: bool,
}

impl<R: Read> Base64Reader<R> {
    /// Creates a decoder reading from `source`.
    pub fn new(source: R) -> Self {
        Self {
            source,
            raw: vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
            offset: 0,
            quad: [0; 4],
            quad_pos: [0; 4],
            quad_len: 0,
            decoded: Vec::with_capacity(READ_BUFFER_SIZE / 4 * 3),
            decoded_pos: 0,
            padded: false,
            eof: false,
        }
    }

    /// Unwraps the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Pulls one chunk from the source and decodes every complete quantum.
    fn fill(&mut self) -> io::Result<()> {
        let n = self.source.read(&mut self.raw)?;
        self.decoded.clear();
        self.decoded_pos = 0;

        if n == 0 {
            self.eof = true;
            if self.quad_len > 0 {
                return Err(Error::malformed(
                    Some(self.quad_pos[0]),
                    "incomplete base64 quantum at end of input",
                )
                .into());
            }
            return Ok(());
        }

        for i in 0..n {
            let byte = self.raw[i];
            let pos = self.offset + i as u64;
            if byte == b'\r' || byte == b'\n' {
                continue;
            }
            if self.padded {
                return Err(Error::malformed(Some(pos), "data after base64 padding").into());
            }
            if !is_base64_byte(byte) {
                return Err(Error::malformed(
                    Some(pos),
                    format!("invalid base64 byte 0x{byte:02X}"),
                )
                .into());
            }

            self.quad[self.quad_len] = byte;
            self.quad_pos[self.quad_len] = pos;
            self.quad_len += 1;
            if self.quad_len == 4 {
                self.decode_quad()?;
            }
        }
        self.offset += n as u64;
        Ok(())
    }

    fn decode_quad(&mut self) -> io::Result<()> {
        self.quad_len = 0;
        STANDARD
            .decode_vec(self.quad, &mut self.decoded)
            .map_err(|e| self.quad_error(&e))?;
        self.padded = self.quad[3] == PAD;
        Ok(())
    }

    fn quad_error(&self, err: &DecodeError) -> io::Error {
        let position = match *err {
            DecodeError::InvalidByte(i, _) | DecodeError::InvalidLastSymbol(i, _) => {
                self.quad_pos.get(i).copied()
            }
            _ => Some(self.quad_pos[0]),
        };
        Error::malformed(position, err.to_string()).into()
    }
}

impl<R: Read> Read for Base64Reader<R> {
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

const fn is_base64_byte(byte: u8) -> bool {
    matches!(byte, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' | PAD)
}
