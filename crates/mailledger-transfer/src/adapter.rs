//! Decode and encode adapters returned by the codec selector.

use std::io::{self, Read, Write};

use crate::base64::{Base64Reader, Base64Writer};
use crate::error::{Error, Result};
use crate::quoted_printable::{QuotedPrintableReader, QuotedPrintableWriter};
use crate::wrap::LineWrapper;

/// Reader yielding the decoded bytes of a transfer-encoded source.
///
/// Malformed input is reported as an [`io::ErrorKind::InvalidData`] error;
/// use [`Error::from_read`] to get the offending position back.
#[derive(Debug)]
pub enum DecodeReader<R> {
    /// 7bit, 8bit, binary: bytes pass through unchanged.
    Identity(R),
    /// Base64 decoding.
    Base64(Base64Reader<R>),
    /// Quoted-Printable decoding.
    QuotedPrintable(QuotedPrintableReader<R>),
}

impl<R: Read> DecodeReader<R> {
    /// Unwraps the source. Bytes read but not yet returned are lost.
    pub fn into_inner(self) -> R {
        match self {
            Self::Identity(r) => r,
            Self::Base64(r) => r.into_inner(),
            Self::QuotedPrintable(r) => r.into_inner(),
        }
    }
}

impl<R: Read> Read for DecodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Identity(r) => r.read(buf),
            Self::Base64(r) => r.read(buf),
            Self::QuotedPrintable(r) => r.read(buf),
        }
    }
}

/// Writer transfer-encoding everything written to it into a sink.
///
/// Adapters that buffer state (base64, Quoted-Printable) only produce
/// complete output once [`finish`](Self::finish) succeeds. Check
/// [`requires_finish`](Self::requires_finish) to know whether skipping it
/// would lose data; calling `finish` is always correct.
#[must_use = "call `finish` to write buffered output"]
#[derive(Debug)]
pub enum EncodeWriter<W: Write> {
    /// Pure pass-through, no wrapping.
    Binary(W),
    /// Pass-through hard-wrapped at a fixed width (7bit, 8bit).
    Wrapped(LineWrapper<W>),
    /// Base64 wrapped at 76 columns.
    Base64(Base64Writer<W>),
    /// Quoted-Printable.
    QuotedPrintable(QuotedPrintableWriter<W>),
}

impl<W: Write> EncodeWriter<W> {
    /// Returns true if the adapter holds output that only `finish` writes.
    #[must_use]
    pub const fn requires_finish(&self) -> bool {
        matches!(self, Self::Base64(_) | Self::QuotedPrintable(_))
    }

    /// Writes any buffered state and returns the sink.
    ///
    /// A no-op for the pass-through variants. The sink itself is not
    /// flushed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Flush`] if the final output cannot be written.
    pub fn finish(self) -> Result<W> {
        match self {
            Self::Binary(w) => Ok(w),
            Self::Wrapped(w) => Ok(w.into_inner()),
            Self::Base64(w) => w.finish().map_err(Error::Flush),
            Self::QuotedPrintable(w) => w.finish().map_err(Error::Flush),
        }
    }
}

impl<W: Write> Write for EncodeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Binary(w) => w.write(buf),
            Self::Wrapped(w) => w.write(buf),
            Self::Base64(w) => w.write(buf),
            Self::QuotedPrintable(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Binary(w) => w.flush(),
            Self::Wrapped(w) => w.flush(),
            Self::Base64(w) => w.flush(),
            Self::QuotedPrintable(w) => w.flush(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Sink that accepts a fixed number of bytes, then fails.
    #[derive(Debug)]
    struct LimitedSink {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "sink full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_requires_finish() {
        assert!(!EncodeWriter::Binary(Vec::new()).requires_finish());
        assert!(!EncodeWriter::Wrapped(LineWrapper::seven_bit(Vec::new())).requires_finish());
        assert!(EncodeWriter::Base64(Base64Writer::new(Vec::new())).requires_finish());
        assert!(
            EncodeWriter::QuotedPrintable(QuotedPrintableWriter::new(Vec::new()))
                .requires_finish()
        );
    }

    #[test]
    fn test_finish_surfaces_flush_error() {
        let sink = LimitedSink {
            written: Vec::new(),
            limit: 0,
        };
        let mut writer = EncodeWriter::QuotedPrintable(QuotedPrintableWriter::new(sink));
        writer.write_all(b"short line").unwrap();

        match writer.finish().unwrap_err() {
            Error::Flush(e) => assert_eq!(e.kind(), io::ErrorKind::StorageFull),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_base64_finish_surfaces_padding_error() {
        let sink = LimitedSink {
            written: Vec::new(),
            limit: 0,
        };
        let mut writer = EncodeWriter::Base64(Base64Writer::new(sink));
        writer.write_all(b"a").unwrap();

        match writer.finish().unwrap_err() {
            Error::Flush(e) => assert_eq!(e.kind(), io::ErrorKind::StorageFull),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_write_consumes_whole_buffer() {
        let data = [b'a'; 3000];
        let writers = [
            EncodeWriter::Binary(Vec::new()),
            EncodeWriter::Wrapped(LineWrapper::seven_bit(Vec::new())),
            EncodeWriter::Base64(Base64Writer::new(Vec::new())),
            EncodeWriter::QuotedPrintable(QuotedPrintableWriter::new(Vec::new())),
        ];
        for mut writer in writers {
            assert_eq!(writer.write(&data).unwrap(), data.len(), "{writer:?}");
            writer.finish().unwrap();
        }
    }

    #[test]
    fn test_base64_finish_writes_padding() {
        let mut writer = EncodeWriter::Base64(Base64Writer::new(Vec::new()));
        writer.write_all(b"a").unwrap();
        assert_eq!(writer.finish().unwrap(), b"YQ==");
    }

    #[test]
    fn test_identity_decode_reader() {
        let mut out = Vec::new();
        DecodeReader::Identity(&b"=41 raw"[..])
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"=41 raw");
    }
}
