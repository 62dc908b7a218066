//! Holders for vectors of basic types
//!
//! Binary form: size-tagged i32 element count, then each element in its
//! scalar binary form. Text form: space-separated elements on one line; an
//! empty vector is an empty line.

use std::io::{BufRead, Write};

use crate::error::{ArkError, Result};

use super::{read_tagged, read_text_line, write_tagged, Holder};

macro_rules! vector_holder {
    ($elem:ty, $width:expr) => {
        impl Holder for Vec<$elem> {
            fn encode_binary(&self, w: &mut dyn Write) -> Result<()> {
                let len = i32::try_from(self.len()).map_err(|_| {
                    ArkError::UnsupportedEncoding(format!(
                        "vector of {} elements exceeds the i32 length prefix",
                        self.len()
                    ))
                })?;
                write_tagged(w, &len.to_le_bytes())?;
                for elem in self {
                    write_tagged(w, &elem.to_le_bytes())?;
                }
                Ok(())
            }

            fn decode_binary(r: &mut dyn BufRead) -> Result<Self> {
                let len = i32::from_le_bytes(read_tagged::<4>(r)?);
                if len < 0 {
                    return Err(ArkError::CorruptArchive(format!(
                        "negative vector length {}",
                        len
                    )));
                }
                let mut out = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    let bytes = read_tagged::<$width>(r)?;
                    out.push(<$elem>::from_le_bytes(bytes));
                }
                Ok(out)
            }

            fn encode_text(&self, w: &mut dyn Write) -> Result<()> {
                let joined = self
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(w, "{}", joined)?;
                Ok(())
            }

            fn decode_text(r: &mut dyn BufRead) -> Result<Self> {
                let line = read_text_line(r)?;
                line.split_whitespace()
                    .map(|tok| {
                        tok.parse::<$elem>().map_err(|e| {
                            ArkError::CorruptArchive(format!(
                                "cannot parse vector element '{}': {}",
                                tok, e
                            ))
                        })
                    })
                    .collect()
            }
        }
    };
}

vector_holder!(i32, 4);
vector_holder!(f32, 4);
