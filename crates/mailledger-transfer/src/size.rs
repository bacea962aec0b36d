//! Encoded size measurement.

use std::cell::Cell;
use std::io::{self, Read, Write};

use tracing::trace;

use crate::encoding::TransferEncoding;
use crate::error::{Error, SizeError, Stage};

/// Size of the buffer used to copy the source through the encoder.
const COPY_BUFFER_SIZE: usize = 8192;

/// Sink that discards bytes and keeps a running total.
///
/// The total lives outside the counter so it stays readable while the
/// counter is owned by an encoder.
struct ByteCounter<'a> {
    total: &'a Cell<u64>,
}

impl Write for ByteCounter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.total.set(self.total.get() + buf.len() as u64);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Encodes all of `source` into a counter and returns the total.
pub(crate) fn measure<R: Read>(
    encoding: TransferEncoding,
    mut source: R,
) -> Result<u64, SizeError> {
    let total = Cell::new(0);
    let fail = |source: Error| SizeError {
        bytes: total.get(),
        source,
    };

    let mut writer = encoding.encoder(ByteCounter { total: &total });
    let mut buf = [0u8; COPY_BUFFER_SIZE];
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fail(Error::from_read(e))),
        };
        writer.write_all(&buf[..n]).map_err(|source| {
            fail(Error::Io {
                stage: Stage::Write,
                source,
            })
        })?;
    }
    writer.finish().map_err(fail)?;

    let bytes = total.get();
    trace!(%encoding, bytes, "measured encoded size");
    Ok(bytes)
}
