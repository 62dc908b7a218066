//! Holders for basic scalar types
//!
//! Binary form is one size-tag byte then the little-endian payload, so a
//! decoder compiled with a different width fails loudly instead of reading
//! garbage. Text form is the `Display` representation on its own line.
//! `bool` uses single-character `T`/`F` in both forms.

use std::io::{BufRead, Read, Write};

use crate::error::{ArkError, Result};

use super::{read_tagged, read_text_line, write_tagged, Holder};

macro_rules! numeric_holder {
    ($ty:ty, $width:expr) => {
        impl Holder for $ty {
            fn encode_binary(&self, w: &mut dyn Write) -> Result<()> {
                write_tagged(w, &self.to_le_bytes())
            }

            fn decode_binary(r: &mut dyn BufRead) -> Result<Self> {
                let bytes = read_tagged::<$width>(r)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }

            fn encode_text(&self, w: &mut dyn Write) -> Result<()> {
                writeln!(w, "{}", self)?;
                Ok(())
            }

            fn decode_text(r: &mut dyn BufRead) -> Result<Self> {
                let line = read_text_line(r)?;
                line.trim().parse::<$ty>().map_err(|e| {
                    ArkError::CorruptArchive(format!(
                        "cannot parse '{}' as {}: {}",
                        line.trim(),
                        stringify!($ty),
                        e
                    ))
                })
            }
        }
    };
}

numeric_holder!(i32, 4);
numeric_holder!(f32, 4);
numeric_holder!(f64, 8);

impl Holder for bool {
    fn encode_binary(&self, w: &mut dyn Write) -> Result<()> {
        w.write_all(if *self { b"T" } else { b"F" })?;
        Ok(())
    }

    fn decode_binary(r: &mut dyn BufRead) -> Result<Self> {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        match byte[0] {
            b'T' => Ok(true),
            b'F' => Ok(false),
            other => Err(ArkError::CorruptArchive(format!(
                "expected 'T' or 'F' for bool, found {:#04x}",
                other
            ))),
        }
    }

    fn encode_text(&self, w: &mut dyn Write) -> Result<()> {
        writeln!(w, "{}", if *self { "T" } else { "F" })?;
        Ok(())
    }

    fn decode_text(r: &mut dyn BufRead) -> Result<Self> {
        let line = read_text_line(r)?;
        match line.trim() {
            "T" => Ok(true),
            "F" => Ok(false),
            other => Err(ArkError::CorruptArchive(format!(
                "expected 'T' or 'F' for bool, found '{}'",
                other
            ))),
        }
    }
}
