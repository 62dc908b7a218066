//! Specifier parsing
//!
//! A specifier string configures how a table is written or read. It is
//! parsed once at open time into an immutable [`Specifier`] which is then
//! passed by value into the reader/writer constructors.
//!
//! ## Grammar
//! ```text
//! write:  {token,...}:{archive-path}[,{index-path}]
//! read:   {token,...}:{path}
//! ```
//!
//! ## Tokens
//! - `ark`       archive storage
//! - `scp`       index-file storage
//! - `t` / `b`   text / binary encoding (mutually exclusive, default binary)
//! - `s`         assert keys strictly increasing (sequential read)
//! - `cs`        assert called-sorted access (random-access read)
//! - `o`         each key read at most once (random-access read)
//! - `p`         permissive: skip unreadable entries with a warning
//! - `bg`        background prefetch for random access
//! - `f`/`flush` flush streams after every write (writer only)
//!
//! Examples: `ark,scp,t:data.ark,data.scp` (write both, text mode),
//! `scp:data.scp` (read via index), `ark:data.ark` (read archive directly).

use std::fmt;
use std::path::PathBuf;

use crate::error::{ArkError, Result};

/// Which storage artifacts a specifier names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Archive file only (`ark:`)
    ArchiveOnly,
    /// Index file only (`scp:`)
    IndexOnly,
    /// Archive plus index (`ark,scp:` — write side only)
    ArchiveAndIndex,
}

/// On-disk value encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Text,
}

/// Parsed, immutable description of one open operation
///
/// Built once by [`Specifier::for_writing`] or [`Specifier::for_reading`];
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    /// Storage mode (ark / scp / both)
    pub mode: StorageMode,
    /// Value encoding for writers; readers auto-detect per entry
    pub encoding: Encoding,
    /// Assert strictly increasing keys during sequential reading (`s`)
    pub sorted: bool,
    /// Assert non-regressing keys during random access (`cs`)
    pub called_sorted: bool,
    /// Each key may be retrieved at most once (`o`)
    pub once: bool,
    /// Skip unreadable entries with a warning instead of failing (`p`)
    pub permissive: bool,
    /// Prefetch the next indexed entry in a background worker (`bg`)
    pub background: bool,
    /// Flush streams after every write (`f`)
    pub flush: bool,
    /// Archive file path (present for ark modes)
    pub archive_path: Option<PathBuf>,
    /// Index file path (present for scp modes)
    pub index_path: Option<PathBuf>,
}

impl Specifier {
    /// Parse a write specifier, e.g. `ark,scp,t:data.ark,data.scp`
    ///
    /// Requires at least one of `ark`/`scp`. When both are present the path
    /// segment must contain exactly two comma-separated paths, archive first.
    pub fn for_writing(spec: &str) -> Result<Self> {
        let (tokens, paths) = split_spec(spec)?;
        let mut parsed = parse_tokens(spec, &tokens)?;

        // Read-only assertions make no sense on the write side.
        for (flag, name) in [
            (parsed.sorted, "s"),
            (parsed.called_sorted, "cs"),
            (parsed.once, "o"),
            (parsed.permissive, "p"),
            (parsed.background, "bg"),
        ] {
            if flag {
                return Err(ArkError::InvalidSpecifier(format!(
                    "token '{}' is read-only, not valid in write specifier '{}'",
                    name, spec
                )));
            }
        }

        match parsed.mode {
            StorageMode::ArchiveAndIndex => {
                let (ark, scp) = paths.split_once(',').ok_or_else(|| {
                    ArkError::InvalidSpecifier(format!(
                        "'{}' requests ark and scp but names only one path",
                        spec
                    ))
                })?;
                if ark.is_empty() || scp.is_empty() || scp.contains(',') {
                    return Err(ArkError::InvalidSpecifier(format!(
                        "expected exactly two paths (archive,index) in '{}'",
                        spec
                    )));
                }
                parsed.archive_path = Some(PathBuf::from(ark));
                parsed.index_path = Some(PathBuf::from(scp));
            }
            StorageMode::ArchiveOnly => {
                if paths.is_empty() {
                    return Err(ArkError::InvalidSpecifier(format!(
                        "missing archive path in '{}'",
                        spec
                    )));
                }
                parsed.archive_path = Some(PathBuf::from(paths));
            }
            StorageMode::IndexOnly => {
                if paths.is_empty() {
                    return Err(ArkError::InvalidSpecifier(format!(
                        "missing index path in '{}'",
                        spec
                    )));
                }
                parsed.index_path = Some(PathBuf::from(paths));
            }
        }

        Ok(parsed)
    }

    /// Parse a read specifier, e.g. `scp:data.scp` or `ark,s:data.ark`
    ///
    /// Requires exactly one of `ark`/`scp`; everything after the first `:`
    /// is the path (which may itself contain colons).
    pub fn for_reading(spec: &str) -> Result<Self> {
        let (tokens, path) = split_spec(spec)?;
        let mut parsed = parse_tokens(spec, &tokens)?;

        if parsed.flush {
            return Err(ArkError::InvalidSpecifier(format!(
                "token 'f' is writer-only, not valid in read specifier '{}'",
                spec
            )));
        }
        if parsed.mode == StorageMode::ArchiveAndIndex {
            return Err(ArkError::InvalidSpecifier(format!(
                "read specifier '{}' must name exactly one of ark, scp",
                spec
            )));
        }
        if path.is_empty() {
            return Err(ArkError::InvalidSpecifier(format!(
                "missing path in '{}'",
                spec
            )));
        }

        match parsed.mode {
            StorageMode::ArchiveOnly => parsed.archive_path = Some(PathBuf::from(path)),
            StorageMode::IndexOnly => parsed.index_path = Some(PathBuf::from(path)),
            StorageMode::ArchiveAndIndex => unreachable!(),
        }

        Ok(parsed)
    }
}

impl fmt::Display for Specifier {
    /// Renders the canonical specifier string (tokens in fixed order)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<&str> = Vec::new();
        match self.mode {
            StorageMode::ArchiveOnly => tokens.push("ark"),
            StorageMode::IndexOnly => tokens.push("scp"),
            StorageMode::ArchiveAndIndex => {
                tokens.push("ark");
                tokens.push("scp");
            }
        }
        if self.encoding == Encoding::Text {
            tokens.push("t");
        }
        if self.sorted {
            tokens.push("s");
        }
        if self.called_sorted {
            tokens.push("cs");
        }
        if self.once {
            tokens.push("o");
        }
        if self.permissive {
            tokens.push("p");
        }
        if self.background {
            tokens.push("bg");
        }
        if self.flush {
            tokens.push("f");
        }
        write!(f, "{}:", tokens.join(","))?;
        match (&self.archive_path, &self.index_path) {
            (Some(ark), Some(scp)) => write!(f, "{},{}", ark.display(), scp.display()),
            (Some(ark), None) => write!(f, "{}", ark.display()),
            (None, Some(scp)) => write!(f, "{}", scp.display()),
            (None, None) => Ok(()),
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Split `tokens:paths` at the first colon
fn split_spec(spec: &str) -> Result<(Vec<String>, String)> {
    let (tokens, rest) = spec.split_once(':').ok_or_else(|| {
        ArkError::InvalidSpecifier(format!("missing ':' separator in '{}'", spec))
    })?;
    if tokens.is_empty() {
        return Err(ArkError::InvalidSpecifier(format!(
            "empty token list in '{}'",
            spec
        )));
    }
    let tokens = tokens.split(',').map(|t| t.trim().to_string()).collect();
    Ok((tokens, rest.to_string()))
}

/// Interpret the comma-separated token list; paths are filled in later
fn parse_tokens(spec: &str, tokens: &[String]) -> Result<Specifier> {
    let mut ark = false;
    let mut scp = false;
    let mut encoding = None;
    let mut parsed = Specifier {
        mode: StorageMode::ArchiveOnly, // patched below
        encoding: Encoding::Binary,
        sorted: false,
        called_sorted: false,
        once: false,
        permissive: false,
        background: false,
        flush: false,
        archive_path: None,
        index_path: None,
    };

    for token in tokens {
        match token.as_str() {
            "ark" => ark = true,
            "scp" => scp = true,
            "t" => {
                if encoding == Some(Encoding::Binary) {
                    return Err(ArkError::InvalidSpecifier(format!(
                        "'t' and 'b' are mutually exclusive in '{}'",
                        spec
                    )));
                }
                encoding = Some(Encoding::Text);
            }
            "b" => {
                if encoding == Some(Encoding::Text) {
                    return Err(ArkError::InvalidSpecifier(format!(
                        "'t' and 'b' are mutually exclusive in '{}'",
                        spec
                    )));
                }
                encoding = Some(Encoding::Binary);
            }
            "s" => parsed.sorted = true,
            "cs" => parsed.called_sorted = true,
            "o" => parsed.once = true,
            "p" => parsed.permissive = true,
            "bg" => parsed.background = true,
            "f" | "flush" => parsed.flush = true,
            other => {
                return Err(ArkError::InvalidSpecifier(format!(
                    "unknown token '{}' in '{}'",
                    other, spec
                )))
            }
        }
    }

    parsed.mode = match (ark, scp) {
        (true, true) => StorageMode::ArchiveAndIndex,
        (true, false) => StorageMode::ArchiveOnly,
        (false, true) => StorageMode::IndexOnly,
        (false, false) => {
            return Err(ArkError::InvalidSpecifier(format!(
                "'{}' names neither ark nor scp storage",
                spec
            )))
        }
    };
    parsed.encoding = encoding.unwrap_or(Encoding::Binary);

    Ok(parsed)
}
