//! Index (scp) model
//!
//! Maps keys to byte locations in one or more archive files. The index is
//! built incrementally while writing, loaded from an scp file
//! (`key location` lines), or derived by a full linear scan of an archive
//! when no index file exists.
//!
//! Keys are unique within one index; a duplicate is fatal.

mod location;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::codec;
use crate::error::{ArkError, Result};
use crate::holder::Holder;

pub use location::Location;

/// In-memory key → location map, preserving source order
#[derive(Debug, Default)]
pub struct ScpIndex {
    /// Records in source order (scp line order, or archive entry order)
    records: Vec<(String, Location)>,
    /// Key → position in `records`
    by_key: HashMap<String, usize>,
}

impl ScpIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; duplicate keys are fatal
    pub fn insert(&mut self, key: String, location: Location) -> Result<()> {
        if self.by_key.contains_key(&key) {
            return Err(ArkError::DuplicateKey(key));
        }
        self.by_key.insert(key.clone(), self.records.len());
        self.records.push((key, location));
        Ok(())
    }

    /// Load an index file (`key location` per line)
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut index = Self::new();
        let mut line_no = 0usize;
        while let Some(line) = codec::read_line(&mut reader)? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let (key, location) = line.trim().split_once(char::is_whitespace).ok_or_else(|| {
                ArkError::CorruptArchive(format!(
                    "{}:{}: expected 'key location'",
                    path.display(),
                    line_no
                ))
            })?;
            index.insert(key.to_string(), Location::parse(location.trim()))?;
        }
        tracing::debug!(path = %path.display(), entries = index.len(), "loaded index file");
        Ok(index)
    }

    /// Derive an index by a full single pass over an archive
    ///
    /// Required before any random-access lookup on an archive-only source;
    /// sequential reading never needs this pre-pass. Each value is decoded
    /// through `H` to find the entry boundary, and its exact byte range is
    /// recorded.
    pub fn from_archive<H: Holder>(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut index = Self::new();
        while let Some(key) = codec::read_key(&mut reader)? {
            let start = reader.stream_position()?;
            let _ = codec::read_value::<H>(&mut reader).map_err(|e| match e {
                ArkError::CorruptArchive(msg) => ArkError::CorruptArchive(format!(
                    "{} (entry '{}' at offset {})",
                    msg, key, start
                )),
                other => other,
            })?;
            let end = reader.stream_position()?;
            index.insert(
                key,
                Location {
                    path: path.to_path_buf(),
                    offset: Some(start),
                    length: Some(end - start),
                },
            )?;
        }
        tracing::debug!(path = %path.display(), entries = index.len(), "scanned archive into index");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a key in source order
    pub fn position(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn location(&self, key: &str) -> Option<&Location> {
        self.position(key).map(|pos| &self.records[pos].1)
    }

    pub fn record(&self, pos: usize) -> Option<&(String, Location)> {
        self.records.get(pos)
    }

    /// Records in source order
    pub fn iter(&self) -> impl Iterator<Item = &(String, Location)> {
        self.records.iter()
    }
}

/// Read exactly one value from a location
///
/// Opens the file, seeks to the offset, limits the stream to the recorded
/// length when one is present, and decodes a single value. The resulting
/// byte range must contain exactly one well-formed value.
pub fn resolve<H: Holder>(location: &Location) -> Result<H> {
    let mut file = File::open(&location.path)?;
    if let Some(offset) = location.offset {
        file.seek(SeekFrom::Start(offset))?;
    }
    let reader = BufReader::new(file);
    match location.length {
        Some(length) => {
            let mut bounded = reader.take(length);
            let value = codec::read_value::<H>(&mut bounded)?;
            if bounded.limit() != 0 {
                return Err(ArkError::CorruptArchive(format!(
                    "{} trailing bytes after value at {}",
                    bounded.limit(),
                    location
                )));
            }
            Ok(value)
        }
        None => {
            let mut reader = reader;
            codec::read_value::<H>(&mut reader)
        }
    }
}
