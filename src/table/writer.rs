//! Table writer
//!
//! Appends typed entries to an archive and/or an index file, as described
//! by a write specifier.
//!
//! ## Responsibilities
//! - Append `key value` entries to the archive stream
//! - Record each value's offset and append the matching scp line immediately,
//!   so the index file stays valid even if the process later dies
//! - scp-only mode: store each value in its own per-key file
//! - Flush-after-every-write when the `f` token is set
//!
//! Key ordering is a caller contract: the writer does not enforce it, it
//! only matters if a downstream reader asserts `s`.

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::codec::{self, CountingWriter};
use crate::error::{ArkError, Result};
use crate::holder::Holder;
use crate::specifier::{Specifier, StorageMode};

/// Writes `(key, value)` entries for one value type `H`
pub struct TableWriter<H: Holder> {
    spec: Specifier,
    /// Archive stream with offset tracking (ark modes)
    archive: Option<CountingWriter<BufWriter<File>>>,
    /// Index file stream (scp modes)
    scp: Option<BufWriter<File>>,
    entries_written: u64,
    closed: bool,
    _holder: PhantomData<H>,
}

impl<H: Holder> TableWriter<H> {
    /// Open a writer from a specifier string, e.g. `ark,scp,t:data.ark,data.scp`
    pub fn new(wspecifier: &str) -> Result<Self> {
        Self::open(Specifier::for_writing(wspecifier)?)
    }

    /// Open a writer from an already-parsed specifier
    pub fn open(spec: Specifier) -> Result<Self> {
        let archive = match &spec.archive_path {
            Some(path) => Some(CountingWriter::new(BufWriter::new(File::create(path)?))),
            None => None,
        };
        let scp = match &spec.index_path {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        tracing::debug!(spec = %spec, "opened table writer");
        Ok(Self {
            spec,
            archive,
            scp,
            entries_written: 0,
            closed: false,
            _holder: PhantomData,
        })
    }

    /// Write one entry
    ///
    /// In archive modes the entry is appended to the archive and, if an
    /// index was requested, a `key path:offset:length` line is appended to
    /// the scp file in the same call. In scp-only mode the value goes to
    /// its own file and the scp line names that file.
    pub fn write(&mut self, key: &str, value: &H) -> Result<()> {
        if self.closed {
            return Err(ArkError::Io(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "write on closed table writer",
            )));
        }
        codec::validate_key(key)?;

        match self.spec.mode {
            StorageMode::ArchiveOnly | StorageMode::ArchiveAndIndex => {
                self.write_archive_entry(key, value)?;
            }
            StorageMode::IndexOnly => {
                self.write_value_file(key, value)?;
            }
        }

        self.entries_written += 1;
        if self.spec.flush {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush all open streams
    pub fn flush(&mut self) -> Result<()> {
        if let Some(archive) = &mut self.archive {
            archive.flush()?;
        }
        if let Some(scp) = &mut self.scp {
            scp.flush()?;
        }
        Ok(())
    }

    /// Flush and finalize all streams; safe to call more than once
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.archive = None;
        self.scp = None;
        self.closed = true;
        tracing::debug!(entries = self.entries_written, "closed table writer");
        Ok(())
    }

    /// Number of entries written so far
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Append one entry to the archive and mirror it into the scp file
    fn write_archive_entry(&mut self, key: &str, value: &H) -> Result<()> {
        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| ArkError::InvalidSpecifier("writer has no archive stream".into()))?;

        codec::write_key(archive, key)?;
        let offset = archive.written();
        codec::write_value(archive, self.spec.encoding, value)?;
        let length = archive.written() - offset;

        if let Some(scp) = &mut self.scp {
            let ark_path = self
                .spec
                .archive_path
                .as_ref()
                .ok_or_else(|| ArkError::InvalidSpecifier("missing archive path".into()))?;
            writeln!(scp, "{} {}:{}:{}", key, ark_path.display(), offset, length)?;
        }
        Ok(())
    }

    /// scp-only mode: one file per key, plus the scp line naming it
    fn write_value_file(&mut self, key: &str, value: &H) -> Result<()> {
        if key.contains('/') || key.contains('\\') {
            return Err(ArkError::InvalidKey(format!(
                "key '{}' contains a path separator, not allowed in scp-only mode",
                key
            )));
        }
        let path = self.value_file_path(key)?;
        let mut file = BufWriter::new(File::create(&path)?);
        codec::write_value(&mut file, self.spec.encoding, value)?;
        file.flush()?;

        let scp = self
            .scp
            .as_mut()
            .ok_or_else(|| ArkError::InvalidSpecifier("writer has no index stream".into()))?;
        writeln!(scp, "{} {}", key, path.display())?;
        Ok(())
    }

    /// `data.scp` + key `a` → `data.a`
    fn value_file_path(&self, key: &str) -> Result<PathBuf> {
        let scp_path = self
            .spec
            .index_path
            .as_ref()
            .ok_or_else(|| ArkError::InvalidSpecifier("missing index path".into()))?;
        let mut name = scp_path.with_extension("").into_os_string();
        name.push(".");
        name.push(key);
        Ok(PathBuf::from(name))
    }
}

impl<H: Holder> Drop for TableWriter<H> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to close table writer on drop");
        }
    }
}
