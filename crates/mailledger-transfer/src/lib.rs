//! # mailledger-transfer
//!
//! MIME content-transfer-encoding for message bodies.
//!
//! ## Features
//!
//! - **Codec selection**: Resolve a `Content-Transfer-Encoding` value to a
//!   decoder or encoder, ignoring ASCII case
//! - **Streaming adapters**: `std::io::Read` decoders and `std::io::Write`
//!   encoders for base64, Quoted-Printable, 7bit, 8bit and binary
//! - **Line wrapping**: base64 at 76 columns, 7bit/8bit at 1000 bytes, CRLF
//! - **Size measurement**: Exact encoded size without keeping the output
//!
//! ## Quick Start
//!
//! ### Decoding a Body
//!
//! ```ignore
//! use std::io::Read;
//! use mailledger_transfer::{decoder, Error};
//!
//! let mut reader = decoder("base64", &b"SGVsbG8s\r\nIFdvcmxkIQ=="[..])?;
//! let mut body = Vec::new();
//! reader.read_to_end(&mut body).map_err(Error::from_read)?;
//! assert_eq!(body, b"Hello, World!");
//! ```
//!
//! ### Encoding a Body
//!
//! ```ignore
//! use std::io::Write;
//! use mailledger_transfer::encoder;
//!
//! let mut writer = encoder("quoted-printable", Vec::new());
//! writer.write_all("Héllo".as_bytes())?;
//! let encoded = writer.finish()?; // writes the last buffered line
//! assert_eq!(encoded, b"H=C3=A9llo");
//! ```
//!
//! ### Measuring Encoded Size
//!
//! ```ignore
//! use mailledger_transfer::encoded_size;
//!
//! let size = encoded_size("base64", &[0u8; 58][..])?;
//! assert_eq!(size, 80 + 2); // one CRLF after 76 columns
//! ```
//!
//! ## Unknown Encodings
//!
//! [`decoder`] rejects names it does not know with
//! [`Error::UnsupportedEncoding`]. [`encoder`] and [`encoded_size`] accept
//! any name and fall back to `binary` pass-through, so a typo in an
//! encoding name produces unencoded output rather than an error.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod adapter;
mod base64;
mod encoding;
mod error;
mod quoted_printable;
mod size;
mod wrap;

pub use self::adapter::{DecodeReader, EncodeWriter};
pub use self::base64::{Base64Reader, Base64Writer};
pub use self::encoding::{TransferEncoding, decode, decoder, encode, encoded_size, encoder};
pub use self::error::{Error, Result, SizeError, Stage};
pub use self::quoted_printable::{QuotedPrintableReader, QuotedPrintableWriter};
pub use self::wrap::{BASE64_LINE_LENGTH, CRLF, LineWrapper, SEVEN_BIT_LINE_LENGTH};
