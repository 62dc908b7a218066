//! Holder for single-precision matrices
//!
//! ## Binary Format
//! ```text
//! "FM " (3) | tag+rows: i32 (5) | tag+cols: i32 (5) | rows*cols f32 LE
//! ```
//!
//! ## Text Format
//! ```text
//! [
//!   1 2 3
//!   4 5 6 ]
//! ```
//! An empty matrix is written as `[ ]` on one line. Rows must all have the
//! same number of columns.

use std::io::{BufRead, Read, Write};

use crate::error::{ArkError, Result};

use super::{read_tagged, read_text_line, write_tagged, Holder};

/// Binary type token for a single-precision matrix
const TYPE_TOKEN: &[u8; 3] = b"FM ";

/// Dense row-major matrix of `f32`
#[derive(Debug, Clone, PartialEq)]
pub struct FloatMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl FloatMatrix {
    /// Build from row-major data; `data.len()` must equal `rows * cols`
    ///
    /// Degenerate shapes (`3x0`, `0x5`) are rejected: the text form cannot
    /// represent them, so only `0x0` may be empty.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if (rows == 0) != (cols == 0) {
            return Err(ArkError::UnsupportedEncoding(format!(
                "degenerate matrix shape {}x{}",
                rows, cols
            )));
        }
        if rows * cols != data.len() {
            return Err(ArkError::UnsupportedEncoding(format!(
                "matrix shape {}x{} does not match {} elements",
                rows,
                cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// The 0x0 empty matrix
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            data: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major element storage
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// One row as a slice
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }
}

impl Holder for FloatMatrix {
    fn encode_binary(&self, w: &mut dyn Write) -> Result<()> {
        w.write_all(TYPE_TOKEN)?;
        let rows = i32::try_from(self.rows)
            .map_err(|_| ArkError::UnsupportedEncoding("matrix too large".to_string()))?;
        let cols = i32::try_from(self.cols)
            .map_err(|_| ArkError::UnsupportedEncoding("matrix too large".to_string()))?;
        write_tagged(w, &rows.to_le_bytes())?;
        write_tagged(w, &cols.to_le_bytes())?;
        for value in &self.data {
            w.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    fn decode_binary(r: &mut dyn BufRead) -> Result<Self> {
        let mut token = [0u8; 3];
        r.read_exact(&mut token)?;
        if &token != TYPE_TOKEN {
            return Err(ArkError::CorruptArchive(format!(
                "expected matrix token \"FM \", found {:?}",
                String::from_utf8_lossy(&token)
            )));
        }
        let rows = i32::from_le_bytes(read_tagged::<4>(r)?);
        let cols = i32::from_le_bytes(read_tagged::<4>(r)?);
        if rows < 0 || cols < 0 || (rows == 0) != (cols == 0) {
            return Err(ArkError::CorruptArchive(format!(
                "bad matrix dimensions {}x{}",
                rows, cols
            )));
        }
        let (rows, cols) = (rows as usize, cols as usize);
        let mut payload = vec![0u8; rows * cols * 4];
        r.read_exact(&mut payload)?;
        let data = payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { rows, cols, data })
    }

    fn encode_text(&self, w: &mut dyn Write) -> Result<()> {
        if self.rows == 0 {
            writeln!(w, "[ ]")?;
            return Ok(());
        }
        writeln!(w, "[")?;
        for r in 0..self.rows {
            let joined = self
                .row(r)
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            if r + 1 == self.rows {
                writeln!(w, "  {} ]", joined)?;
            } else {
                writeln!(w, "  {}", joined)?;
            }
        }
        Ok(())
    }

    fn decode_text(r: &mut dyn BufRead) -> Result<Self> {
        let first = read_text_line(r)?;
        let first = first.trim();
        if !first.starts_with('[') {
            return Err(ArkError::CorruptArchive(format!(
                "expected '[' opening a matrix, found '{}'",
                first
            )));
        }
        // "[ ]" or "[]" on the opening line is the empty matrix.
        let remainder = first[1..].trim();
        if remainder == "]" {
            return Ok(Self::empty());
        }
        if !remainder.is_empty() {
            return Err(ArkError::CorruptArchive(format!(
                "unexpected content after '[': '{}'",
                remainder
            )));
        }

        let mut rows: Vec<Vec<f32>> = Vec::new();
        loop {
            let line = read_text_line(r)?;
            let (row_text, last) = match line.split_once(']') {
                Some((head, tail)) if tail.trim().is_empty() => (head.to_string(), true),
                Some((_, tail)) => {
                    return Err(ArkError::CorruptArchive(format!(
                        "unexpected content after ']': '{}'",
                        tail
                    )))
                }
                None => (line, false),
            };
            let row: Vec<f32> = row_text
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f32>().map_err(|e| {
                        ArkError::CorruptArchive(format!(
                            "cannot parse matrix element '{}': {}",
                            tok, e
                        ))
                    })
                })
                .collect::<Result<_>>()?;
            if !row.is_empty() {
                rows.push(row);
            }
            if last {
                break;
            }
        }

        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(ArkError::CorruptArchive(
                "ragged matrix rows in text form".to_string(),
            ));
        }
        let data = rows.into_iter().flatten().collect();
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// Extract a submatrix
    ///
    /// Range grammar: `r1:r2` (rows, inclusive) optionally followed by
    /// `,c1:c2` (columns, inclusive), e.g. `0:0` for the first row or
    /// `1:2,0:1` for a 2x2 block.
    fn extract_range(&self, range: &str) -> Result<Self> {
        let (row_part, col_part) = match range.split_once(',') {
            Some((r, c)) => (r, Some(c)),
            None => (range, None),
        };
        let (r1, r2) = parse_span(range, row_part, self.rows)?;
        let (c1, c2) = match col_part {
            Some(part) => parse_span(range, part, self.cols)?,
            None if self.cols == 0 => {
                return Err(ArkError::InvalidSpecifier(format!(
                    "range '{}' on an empty matrix",
                    range
                )))
            }
            None => (0, self.cols - 1),
        };

        let mut data = Vec::with_capacity((r2 - r1 + 1) * (c2 - c1 + 1));
        for r in r1..=r2 {
            data.extend_from_slice(&self.row(r)[c1..=c2]);
        }
        Self::new(r2 - r1 + 1, c2 - c1 + 1, data)
    }
}

/// Parse one inclusive `lo:hi` span and bounds-check it against `limit`
fn parse_span(range: &str, part: &str, limit: usize) -> Result<(usize, usize)> {
    let invalid = || ArkError::InvalidSpecifier(format!("malformed range '{}'", range));
    let (lo, hi) = part.split_once(':').ok_or_else(invalid)?;
    let lo: usize = lo.trim().parse().map_err(|_| invalid())?;
    let hi: usize = hi.trim().parse().map_err(|_| invalid())?;
    if lo > hi || hi >= limit {
        return Err(ArkError::InvalidSpecifier(format!(
            "range '{}' out of bounds for extent {}",
            range, limit
        )));
    }
    Ok((lo, hi))
}
