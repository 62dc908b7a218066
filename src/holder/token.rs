//! Holder for tokens
//!
//! A token is a non-empty, whitespace-free string. The format is
//! fundamentally textual (`token\n`), so the binary and text forms are
//! identical and the `\0B` marker is omitted.

use std::io::{BufRead, Write};

use crate::error::{ArkError, Result};

use super::{read_text_line, Holder};

fn write_token(w: &mut dyn Write, token: &str) -> Result<()> {
    if token.is_empty() || token.chars().any(|c| c.is_whitespace()) {
        return Err(ArkError::UnsupportedEncoding(format!(
            "'{}' is not a token (must be non-empty with no whitespace)",
            token.escape_default()
        )));
    }
    writeln!(w, "{}", token)?;
    Ok(())
}

fn read_token(r: &mut dyn BufRead) -> Result<String> {
    let line = read_text_line(r)?;
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(ArkError::CorruptArchive(format!(
            "expected a single token, found '{}'",
            line.escape_default()
        )));
    }
    Ok(trimmed.to_string())
}

impl Holder for String {
    fn encode_binary(&self, w: &mut dyn Write) -> Result<()> {
        write_token(w, self)
    }

    fn decode_binary(r: &mut dyn BufRead) -> Result<Self> {
        read_token(r)
    }

    fn encode_text(&self, w: &mut dyn Write) -> Result<()> {
        write_token(w, self)
    }

    fn decode_text(r: &mut dyn BufRead) -> Result<Self> {
        read_token(r)
    }

    fn binary_marker() -> bool {
        false
    }
}
