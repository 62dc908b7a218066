//! Archive entry codec
//!
//! Reads and writes one `(key, value)` entry boundary-correctly. The value
//! serialization itself is delegated to the entry's [`Holder`]; this module
//! owns the key framing and the binary marker.
//!
//! ## Wire Format
//! ```text
//! text:    <key><space><value-text><newline>
//! binary:  <key><space>\0B<holder-binary-blob>
//! ```
//!
//! There is no global header or footer and no newline framing in binary
//! mode: entry boundaries come entirely from the holder consuming exactly
//! its own bytes. Readers auto-detect the encoding of each entry by peeking
//! for the two-byte `\0B` marker after the key.

use std::io::{BufRead, Read, Write};

use crate::error::{ArkError, Result};
use crate::holder::Holder;
use crate::specifier::Encoding;

/// Marker prefixed to binary values (holders may opt out, e.g. tokens)
pub const BINARY_MARKER: [u8; 2] = [0x00, b'B'];

// =============================================================================
// Key Framing
// =============================================================================

/// Validate a key at write time
///
/// A key is a token: non-empty, no embedded whitespace.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ArkError::InvalidKey("empty key".to_string()));
    }
    if key.chars().any(|c| c.is_whitespace()) {
        return Err(ArkError::InvalidKey(format!(
            "key '{}' contains whitespace",
            key.escape_default()
        )));
    }
    Ok(())
}

/// Write `<key><space>`
pub fn write_key(w: &mut dyn Write, key: &str) -> Result<()> {
    validate_key(key)?;
    w.write_all(key.as_bytes())?;
    w.write_all(b" ")?;
    Ok(())
}

/// Read a key up to the single-space delimiter
///
/// Returns `Ok(None)` on a clean end of stream (no bytes before EOF).
/// EOF in the middle of a key, or a newline where the space should be,
/// is a framing error.
pub fn read_key(r: &mut dyn BufRead) -> Result<Option<String>> {
    let mut key = Vec::new();
    loop {
        let byte = match read_byte(r)? {
            Some(b) => b,
            None if key.is_empty() => return Ok(None),
            None => {
                return Err(ArkError::CorruptArchive(format!(
                    "end of stream inside key '{}'",
                    String::from_utf8_lossy(&key)
                )))
            }
        };
        match byte {
            b' ' if key.is_empty() => {
                return Err(ArkError::CorruptArchive(
                    "empty key before value".to_string(),
                ))
            }
            b' ' => break,
            b'\n' => {
                return Err(ArkError::CorruptArchive(format!(
                    "newline inside key '{}'",
                    String::from_utf8_lossy(&key)
                )))
            }
            b => key.push(b),
        }
    }
    String::from_utf8(key)
        .map(Some)
        .map_err(|e| ArkError::CorruptArchive(format!("key is not valid UTF-8: {}", e)))
}

// =============================================================================
// Value Framing
// =============================================================================

/// Write one value in the requested encoding, marker included
pub fn write_value<H: Holder>(w: &mut dyn Write, encoding: Encoding, value: &H) -> Result<()> {
    match encoding {
        Encoding::Binary => {
            if H::binary_marker() {
                w.write_all(&BINARY_MARKER)?;
            }
            value.encode_binary(w)
        }
        Encoding::Text => value.encode_text(w),
    }
}

/// Read one value, auto-detecting its encoding via the binary marker
pub fn read_value<H: Holder>(r: &mut dyn BufRead) -> Result<H> {
    match peek_byte(r)? {
        None => Err(ArkError::CorruptArchive(
            "end of stream where value expected".to_string(),
        )),
        Some(0x00) => {
            let mut marker = [0u8; 2];
            r.read_exact(&mut marker).map_err(ArkError::from).map_err(map_eof)?;
            if marker != BINARY_MARKER {
                return Err(ArkError::CorruptArchive(format!(
                    "bad binary marker byte {:#04x}",
                    marker[1]
                )));
            }
            H::decode_binary(r).map_err(map_eof)
        }
        Some(_) => H::decode_text(r).map_err(map_eof),
    }
}

/// Running out of bytes inside a value is a framing error, not an I/O one
fn map_eof(e: ArkError) -> ArkError {
    match e {
        ArkError::Io(ioe) if ioe.kind() == std::io::ErrorKind::UnexpectedEof => {
            ArkError::CorruptArchive("unexpected end of stream inside value".to_string())
        }
        other => other,
    }
}

/// Write one full entry; returns nothing, offsets are tracked by the caller
pub fn write_entry<H: Holder>(
    w: &mut dyn Write,
    key: &str,
    value: &H,
    encoding: Encoding,
) -> Result<()> {
    write_key(w, key)?;
    write_value(w, encoding, value)
}

// =============================================================================
// Byte-level Helpers
// =============================================================================

/// Peek the next byte without consuming it
pub(crate) fn peek_byte(r: &mut dyn BufRead) -> Result<Option<u8>> {
    let buf = r.fill_buf()?;
    Ok(buf.first().copied())
}

/// Read a single byte; `Ok(None)` at end of stream
pub(crate) fn read_byte(r: &mut dyn BufRead) -> Result<Option<u8>> {
    let buf = r.fill_buf()?;
    match buf.first().copied() {
        Some(b) => {
            r.consume(1);
            Ok(Some(b))
        }
        None => Ok(None),
    }
}

/// Read one `\n`-terminated line; EOF before the newline is a framing error
/// unless some bytes were read (a final unterminated line is accepted)
pub(crate) fn read_line(r: &mut dyn BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let n = r.read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(Some(line))
}

// =============================================================================
// Counting Writer
// =============================================================================

/// Write adapter that tracks how many bytes have passed through
///
/// The table writer uses this to record exact value offsets for the index
/// file without re-seeking the underlying stream.
pub struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
