//! Transfer encoding names and the codec selector.
//!
//! Resolves a `Content-Transfer-Encoding` value to decode and encode
//! adapters. The two directions treat unknown names differently: decoding
//! refuses to guess and fails, encoding falls back to `binary`
//! pass-through. Callers validating user input should check
//! [`TransferEncoding::parse`] themselves before encoding.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use tracing::debug;

use crate::adapter::{DecodeReader, EncodeWriter};
use crate::base64::{Base64Reader, Base64Writer};
use crate::error::{Error, Result, SizeError, Stage};
use crate::quoted_printable::{QuotedPrintableReader, QuotedPrintableWriter};
use crate::size;
use crate::wrap::{BASE64_LINE_LENGTH, LineWrapper, SEVEN_BIT_LINE_LENGTH};

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    #[cfg_attr(feature = "serde", serde(rename = "7bit"))]
    SevenBit,
    /// 8-bit text.
    #[cfg_attr(feature = "serde", serde(rename = "8bit"))]
    EightBit,
    /// Binary (no encoding).
    #[cfg_attr(feature = "serde", serde(rename = "binary"))]
    Binary,
    /// Base64 encoding.
    #[cfg_attr(feature = "serde", serde(rename = "base64"))]
    Base64,
    /// Quoted-Printable encoding.
    #[cfg_attr(feature = "serde", serde(rename = "quoted-printable"))]
    QuotedPrintable,
}

impl TransferEncoding {
    /// All recognized encodings.
    pub const ALL: [Self; 5] = [
        Self::SevenBit,
        Self::EightBit,
        Self::Binary,
        Self::Base64,
        Self::QuotedPrintable,
    ];

    /// Parses an encoding name, ignoring ASCII case.
    ///
    /// Returns `None` for unrecognized names, including the empty string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|encoding| encoding.as_str().eq_ignore_ascii_case(s))
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        }
    }

    /// Returns the width at which encoded output is hard-wrapped, if any.
    ///
    /// Quoted-Printable wraps with soft breaks of its own and reports `None`.
    #[must_use]
    pub const fn line_length(self) -> Option<usize> {
        match self {
            Self::SevenBit | Self::EightBit => Some(SEVEN_BIT_LINE_LENGTH),
            Self::Base64 => Some(BASE64_LINE_LENGTH),
            Self::Binary | Self::QuotedPrintable => None,
        }
    }

    /// Wraps `source` with a decoder for this encoding.
    pub fn decoder<R: Read>(self, source: R) -> DecodeReader<R> {
        match self {
            Self::SevenBit | Self::EightBit | Self::Binary => DecodeReader::Identity(source),
            Self::Base64 => DecodeReader::Base64(Base64Reader::new(source)),
            Self::QuotedPrintable => {
                DecodeReader::QuotedPrintable(QuotedPrintableReader::new(source))
            }
        }
    }

    /// Wraps `sink` with an encoder for this encoding.
    pub fn encoder<W: Write>(self, sink: W) -> EncodeWriter<W> {
        match self {
            Self::SevenBit | Self::EightBit => EncodeWriter::Wrapped(LineWrapper::seven_bit(sink)),
            Self::Binary => EncodeWriter::Binary(sink),
            Self::Base64 => EncodeWriter::Base64(Base64Writer::new(sink)),
            Self::QuotedPrintable => {
                EncodeWriter::QuotedPrintable(QuotedPrintableWriter::new(sink))
            }
        }
    }

    /// Returns the exact size of `source` once encoded with this encoding.
    ///
    /// # Errors
    ///
    /// Returns a [`SizeError`] carrying the bytes counted so far if reading
    /// the source or finishing the encoder fails.
    pub fn encoded_size<R: Read>(self, source: R) -> std::result::Result<u64, SizeError> {
        size::measure(self, source)
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::UnsupportedEncoding(s.to_string()))
    }
}

/// Resolves the decode direction of an encoding name.
///
/// `7bit`, `8bit`, `binary` and the empty string decode as pass-through.
///
/// # Errors
///
/// Returns [`Error::UnsupportedEncoding`] for any other unrecognized name.
pub fn decoder<R: Read>(encoding: &str, source: R) -> Result<DecodeReader<R>> {
    match TransferEncoding::parse(encoding) {
        Some(resolved) => Ok(resolved.decoder(source)),
        None if encoding.is_empty() => Ok(TransferEncoding::SevenBit.decoder(source)),
        None => {
            debug!(encoding, "refusing to decode unsupported transfer encoding");
            Err(Error::UnsupportedEncoding(encoding.to_string()))
        }
    }
}

/// Resolves the encode direction of an encoding name.
///
/// Never fails: unrecognized names, the empty string included, are written
/// as `binary` pass-through. This differs from [`decoder`], which rejects
/// them.
pub fn encoder<W: Write>(encoding: &str, sink: W) -> EncodeWriter<W> {
    resolve_for_encoding(encoding).encoder(sink)
}

/// Returns the exact transfer-encoded size of the contents of `source`.
///
/// The size is measured by performing the encoding into a counting sink:
/// line-wrap positions depend on the encoding and the exact input, so there
/// is no closed form that holds for every encoding. Names resolve as in
/// [`encoder`].
///
/// # Errors
///
/// Returns a [`SizeError`] carrying the bytes counted before the failure.
pub fn encoded_size<R: Read>(encoding: &str, source: R) -> std::result::Result<u64, SizeError> {
    resolve_for_encoding(encoding).encoded_size(source)
}

/// Decodes an in-memory body.
///
/// # Errors
///
/// Returns an error if the encoding is unsupported or the body is malformed.
pub fn decode(encoding: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut decoded = Vec::with_capacity(data.len());
    decoder(encoding, data)?
        .read_to_end(&mut decoded)
        .map_err(Error::from_read)?;
    Ok(decoded)
}

/// Encodes an in-memory body.
///
/// # Errors
///
/// Writing to memory does not fail; the `Result` mirrors [`EncodeWriter::finish`].
pub fn encode(encoding: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut writer = encoder(encoding, Vec::with_capacity(data.len()));
    writer.write_all(data).map_err(|source| Error::Io {
        stage: Stage::Write,
        source,
    })?;
    writer.finish()
}

fn resolve_for_encoding(encoding: &str) -> TransferEncoding {
    TransferEncoding::parse(encoding).unwrap_or_else(|| {
        debug!(encoding, "unrecognized transfer encoding, writing as binary");
        TransferEncoding::Binary
    })
}
