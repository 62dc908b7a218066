//! Sequential table reader
//!
//! Forward-only streaming over a source described by a read specifier:
//! either an archive file, or an scp listing whose lines each resolve to
//! one value.
//!
//! ## State machine
//! ```text
//! Open ──next()──▶ (current entry)* ──past last entry──▶ Exhausted
//! ```
//!
//! Entries are surfaced in underlying-source order, never re-sorted; the
//! `s` token only asserts strictly increasing keys and fails fast when the
//! order is violated. Archive sources decode values eagerly on advance
//! (entry boundaries require it); scp sources decode lazily on the first
//! `value()` call, except in permissive mode where eager loading lets
//! unreadable entries be skipped.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::PathBuf;

use crate::codec;
use crate::error::{ArkError, Result};
use crate::holder::Holder;
use crate::index::{self, Location};
use crate::specifier::{Specifier, StorageMode};

/// Underlying stream for a sequential reader
enum Source {
    Archive {
        reader: BufReader<File>,
    },
    Index {
        path: PathBuf,
        reader: BufReader<File>,
        line_no: usize,
    },
}

/// The current entry; scp entries stay unresolved until first access
enum Entry<H> {
    Loaded { key: String, value: H },
    Lazy { key: String, location: Location },
}

impl<H> Entry<H> {
    fn key(&self) -> &str {
        match self {
            Entry::Loaded { key, .. } => key,
            Entry::Lazy { key, .. } => key,
        }
    }
}

/// Streams `(key, value)` pairs in source order
pub struct SequentialTableReader<H: Holder> {
    spec: Specifier,
    source: Option<Source>,
    current: Option<Entry<H>>,
    last_key: Option<String>,
}

impl<H: Holder> SequentialTableReader<H> {
    /// Open a reader from a specifier string, e.g. `ark:data.ark`
    pub fn new(rspecifier: &str) -> Result<Self> {
        Self::open(Specifier::for_reading(rspecifier)?)
    }

    /// Open a reader from an already-parsed specifier
    pub fn open(spec: Specifier) -> Result<Self> {
        let source = match spec.mode {
            StorageMode::ArchiveOnly => {
                let path = spec
                    .archive_path
                    .as_ref()
                    .ok_or_else(|| ArkError::InvalidSpecifier("missing archive path".into()))?;
                Source::Archive {
                    reader: BufReader::new(File::open(path)?),
                }
            }
            StorageMode::IndexOnly => {
                let path = spec
                    .index_path
                    .as_ref()
                    .ok_or_else(|| ArkError::InvalidSpecifier("missing index path".into()))?;
                Source::Index {
                    path: path.clone(),
                    reader: BufReader::new(File::open(path)?),
                    line_no: 0,
                }
            }
            StorageMode::ArchiveAndIndex => {
                return Err(ArkError::InvalidSpecifier(
                    "read specifier must name exactly one of ark, scp".into(),
                ))
            }
        };
        tracing::debug!(spec = %spec, "opened sequential table reader");
        let mut reader = Self {
            spec,
            source: Some(source),
            current: None,
            last_key: None,
        };
        reader.advance()?;
        Ok(reader)
    }

    /// True once the source is exhausted (or closed)
    pub fn done(&self) -> bool {
        self.current.is_none()
    }

    /// Key of the current entry
    pub fn key(&self) -> Option<&str> {
        self.current.as_ref().map(Entry::key)
    }

    /// Value of the current entry, decoding it on first access
    pub fn value(&mut self) -> Result<&H> {
        self.ensure_loaded()?;
        match &self.current {
            Some(Entry::Loaded { value, .. }) => Ok(value),
            _ => Err(no_current_entry()),
        }
    }

    /// Advance to the next entry
    pub fn next(&mut self) -> Result<()> {
        if self.current.take().is_none() {
            return Err(no_current_entry());
        }
        self.advance()
    }

    /// Release the underlying stream; safe to call more than once
    pub fn close(&mut self) -> Result<()> {
        self.source = None;
        self.current = None;
        Ok(())
    }

    /// Consume the reader, iterating `Result<(key, value)>` pairs
    pub fn entries(self) -> Entries<H> {
        Entries {
            reader: self,
            pending: None,
            failed: false,
        }
    }

    /// Take the current entry (decoding it if needed) without advancing
    fn take_entry(&mut self) -> Result<(String, H)> {
        self.ensure_loaded()?;
        match self.current.take() {
            Some(Entry::Loaded { key, value }) => Ok((key, value)),
            _ => Err(no_current_entry()),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Resolve a lazy scp entry in place
    fn ensure_loaded(&mut self) -> Result<()> {
        if let Some(Entry::Lazy { key, location }) = &self.current {
            let (key, location) = (key.clone(), location.clone());
            let value = index::resolve::<H>(&location)?;
            self.current = Some(Entry::Loaded { key, value });
        }
        Ok(())
    }

    /// Enforce the `s` assertion and remember the key
    ///
    /// Skipped (permissive) entries still pass through here: their keys were
    /// observed in source order, so they count toward the check.
    fn check_order(&mut self, key: &str) -> Result<()> {
        if self.spec.sorted {
            if let Some(last) = &self.last_key {
                if key <= last.as_str() {
                    self.source = None;
                    return Err(ArkError::OrderingViolation(format!(
                        "key '{}' follows '{}' in a source asserted sorted (s)",
                        key, last
                    )));
                }
            }
        }
        self.last_key = Some(key.to_string());
        Ok(())
    }

    /// Read the next entry from the source into `current`
    fn advance(&mut self) -> Result<()> {
        match self.source.as_mut() {
            None => Ok(()),
            Some(Source::Archive { .. }) => self.advance_archive(),
            Some(Source::Index { .. }) => self.advance_index(),
        }
    }

    fn advance_archive(&mut self) -> Result<()> {
        let permissive = self.spec.permissive;
        let key = {
            let Some(Source::Archive { reader }) = self.source.as_mut() else {
                return Ok(());
            };
            match codec::read_key(reader) {
                Ok(Some(key)) => key,
                Ok(None) => {
                    self.source = None;
                    return Ok(());
                }
                Err(e) => return self.fail_entry(e, permissive, "<key>"),
            }
        };
        self.check_order(&key)?;
        let Some(Source::Archive { reader }) = self.source.as_mut() else {
            return Ok(());
        };
        match codec::read_value::<H>(reader) {
            Ok(value) => {
                self.current = Some(Entry::Loaded { key, value });
                Ok(())
            }
            Err(e) => self.fail_entry(e, permissive, &key),
        }
    }

    /// Handle a broken archive entry: permissive mode logs and stops (a
    /// corrupt binary entry leaves no way to find the next boundary),
    /// otherwise the error surfaces after the valid prefix was yielded.
    fn fail_entry(&mut self, e: ArkError, permissive: bool, key: &str) -> Result<()> {
        self.source = None;
        match e {
            ArkError::CorruptArchive(_) | ArkError::Io(_) if permissive => {
                tracing::warn!(key, error = %e, "skipping unreadable archive entry and stopping");
                Ok(())
            }
            e => Err(e),
        }
    }

    fn advance_index(&mut self) -> Result<()> {
        let permissive = self.spec.permissive;
        loop {
            let (line, line_no, path) = {
                let Some(Source::Index {
                    path,
                    reader,
                    line_no,
                }) = self.source.as_mut()
                else {
                    return Ok(());
                };
                match codec::read_line(reader) {
                    Ok(Some(line)) => {
                        *line_no += 1;
                        (line, *line_no, path.clone())
                    }
                    Ok(None) => {
                        self.source = None;
                        return Ok(());
                    }
                    Err(e) => {
                        self.source = None;
                        return Err(e);
                    }
                }
            };

            if line.trim().is_empty() {
                continue;
            }
            let Some((key, location)) = line.trim().split_once(char::is_whitespace) else {
                let e = ArkError::CorruptArchive(format!(
                    "{}:{}: expected 'key location'",
                    path.display(),
                    line_no
                ));
                if permissive {
                    tracing::warn!(error = %e, "skipping malformed index line");
                    continue;
                }
                self.source = None;
                return Err(e);
            };
            let key = key.to_string();
            let location = Location::parse(location.trim());
            self.check_order(&key)?;

            if permissive {
                // Eager load so unreadable entries can be skipped.
                match index::resolve::<H>(&location) {
                    Ok(value) => {
                        self.current = Some(Entry::Loaded { key, value });
                        return Ok(());
                    }
                    Err(e @ (ArkError::CorruptArchive(_) | ArkError::Io(_))) => {
                        tracing::warn!(key, error = %e, "skipping unreadable entry");
                        continue;
                    }
                    Err(e) => {
                        self.source = None;
                        return Err(e);
                    }
                }
            }

            self.current = Some(Entry::Lazy { key, location });
            return Ok(());
        }
    }
}

fn no_current_entry() -> ArkError {
    ArkError::Io(std::io::Error::new(
        ErrorKind::NotFound,
        "no current entry (reader exhausted or not advanced)",
    ))
}

/// Owning iterator over a sequential reader
///
/// Yields each entry once; an error ends the iteration after being yielded.
pub struct Entries<H: Holder> {
    reader: SequentialTableReader<H>,
    pending: Option<ArkError>,
    failed: bool,
}

impl<H: Holder> Iterator for Entries<H> {
    type Item = Result<(String, H)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(e) = self.pending.take() {
            self.failed = true;
            return Some(Err(e));
        }
        if self.reader.done() {
            return None;
        }
        match self.reader.take_entry() {
            Ok(pair) => {
                // Advance now; a failure there surfaces on the next call so
                // the current pair is not lost.
                if let Err(e) = self.reader.advance() {
                    self.pending = Some(e);
                }
                Some(Ok(pair))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
