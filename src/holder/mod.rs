//! Holder contract
//!
//! A value type plugs into the engine by implementing [`Holder`]: binary
//! encode/decode, text encode/decode, and optionally partial-range
//! extraction. The codec, index, and reader/writer components are generic
//! over the holder, so adding a new archivable type touches nothing else.
//!
//! ## Built-in holders
//! - `i32`, `f32`, `f64`, `bool` — size-tagged binary, one-line text
//! - `Vec<i32>`, `Vec<f32>` — length-prefixed binary, space-separated text
//! - `String` — whitespace-free token, identical in both encodings
//! - [`FloatMatrix`] — typed binary header, bracketed multi-line text,
//!   row/column range extraction

mod basic;
mod matrix;
mod token;
mod vector;

use std::io::{BufRead, Read, Write};

use crate::error::{ArkError, Result};

pub use matrix::FloatMatrix;

/// Serialization contract for archivable value types
///
/// Binary decoders must consume exactly their own bytes (entry boundaries
/// in an archive come from nothing else); text decoders must consume their
/// terminating newline.
pub trait Holder: Sized {
    /// Serialize in binary form (marker excluded; the codec writes it)
    fn encode_binary(&self, w: &mut dyn Write) -> Result<()>;

    /// Deserialize the binary form, consuming exactly its own bytes
    fn decode_binary(r: &mut dyn BufRead) -> Result<Self>;

    /// Serialize in text form, terminator included
    fn encode_text(&self, w: &mut dyn Write) -> Result<()>;

    /// Deserialize the text form, consuming the terminator
    fn decode_text(r: &mut dyn BufRead) -> Result<Self>;

    /// Whether binary output carries the `\0B` marker
    ///
    /// Token values opt out: their two encodings are identical.
    fn binary_marker() -> bool {
        true
    }

    /// Extract a sub-range of the value (e.g. a row slice of a matrix)
    ///
    /// Holders without a natural sub-range grammar keep this default.
    fn extract_range(&self, range: &str) -> Result<Self> {
        Err(ArkError::UnsupportedEncoding(format!(
            "range extraction ('{}') is not defined for this value type",
            range
        )))
    }
}

// =============================================================================
// Shared Binary Primitives
// =============================================================================

/// Write a size-tag byte followed by the little-endian payload
pub(crate) fn write_tagged(w: &mut dyn Write, bytes: &[u8]) -> Result<()> {
    w.write_all(&[bytes.len() as u8])?;
    w.write_all(bytes)?;
    Ok(())
}

/// Read a size-tagged payload of exactly `N` bytes
pub(crate) fn read_tagged<const N: usize>(r: &mut dyn BufRead) -> Result<[u8; N]> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag)?;
    if tag[0] as usize != N {
        return Err(ArkError::CorruptArchive(format!(
            "size tag mismatch: expected {}, found {}",
            N, tag[0]
        )));
    }
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read the one-line text form shared by the scalar and vector holders
pub(crate) fn read_text_line(r: &mut dyn BufRead) -> Result<String> {
    crate::codec::read_line(r)?.ok_or_else(|| {
        ArkError::CorruptArchive("end of stream where text value expected".to_string())
    })
}
