//! Byte locations for index records
//!
//! An index line maps a key to a location string:
//! - `path` — the whole file is one value (scp-only storage)
//! - `path:offset` — the value starts at `offset` inside an archive
//! - `path:offset:length` — the value occupies exactly `length` bytes
//!
//! Numeric suffixes are parsed from the right, so paths containing colons
//! keep working.

use std::fmt;
use std::path::PathBuf;

/// Resolved byte location of one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File holding the value
    pub path: PathBuf,
    /// Byte offset of the value inside the file; `None` means offset 0
    pub offset: Option<u64>,
    /// Byte length of the value; `None` means self-delimiting / whole file
    pub length: Option<u64>,
}

impl Location {
    /// Location covering a whole file
    pub fn whole_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: None,
            length: None,
        }
    }

    /// Location at a byte offset inside an archive
    pub fn at_offset(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset: Some(offset),
            length: None,
        }
    }

    /// Parse a location string (`path[:offset[:length]]`)
    pub fn parse(text: &str) -> Self {
        // path:offset:length — only when both trailing segments are numeric
        // and a non-empty path remains.
        if let Some((head, last)) = text.rsplit_once(':') {
            if let Ok(last_num) = last.parse::<u64>() {
                if let Some((head2, mid)) = head.rsplit_once(':') {
                    if let Ok(mid_num) = mid.parse::<u64>() {
                        if !head2.is_empty() {
                            return Self {
                                path: PathBuf::from(head2),
                                offset: Some(mid_num),
                                length: Some(last_num),
                            };
                        }
                    }
                }
                if !head.is_empty() {
                    return Self::at_offset(head, last_num);
                }
            }
        }
        Self::whole_file(text)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(offset) = self.offset {
            write!(f, ":{}", offset)?;
            if let Some(length) = self.length {
                write!(f, ":{}", length)?;
            }
        }
        Ok(())
    }
}
