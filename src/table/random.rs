//! Random-access table reader
//!
//! On-demand key lookup backed by the scp index. Construction builds the
//! index: loaded directly from an scp source, or derived by a full single
//! pass when the source is a bare archive.
//!
//! ## Access assertions
//! - `cs` (called-sorted): requested keys must not regress below the
//!   last-seen maximum key; this supports streaming joins across multiple
//!   co-indexed archives.
//! - `o` (access once): additionally, no key may be retrieved twice and
//!   access positions must be non-decreasing in index order. This catches
//!   pipelines that use random access as if it were sequential.
//!
//! `get` takes `&self`; the access-tracking state sits behind a mutex so
//! one reader instance still has a single logical stream.

use std::io::ErrorKind;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ArkError, Result};
use crate::holder::Holder;
use crate::index::{self, ScpIndex};
use crate::specifier::{Specifier, StorageMode};

use super::readahead::Prefetcher;

/// Mutable access-tracking state, one logical stream per reader
struct AccessState<H> {
    /// Byte-wise maximum key seen so far (`cs` check)
    max_key: Option<String>,
    /// Highest index position retrieved so far (`o` check)
    max_pos: Option<usize>,
    /// Per-position retrieval flags; allocated only under `o`
    accessed: Vec<bool>,
    prefetch: Option<Prefetcher<H>>,
    closed: bool,
}

/// Key-indexed lookup reader
pub struct RandomAccessTableReader<H: Holder + Send + 'static> {
    spec: Specifier,
    index: Arc<ScpIndex>,
    state: Mutex<AccessState<H>>,
}

impl<H: Holder + Send + 'static> RandomAccessTableReader<H> {
    /// Open a reader from a specifier string, e.g. `scp:data.scp`
    pub fn new(rspecifier: &str) -> Result<Self> {
        Self::open(Specifier::for_reading(rspecifier)?)
    }

    /// Open a reader from an already-parsed specifier
    pub fn open(spec: Specifier) -> Result<Self> {
        let index = match spec.mode {
            StorageMode::IndexOnly => {
                let path = spec
                    .index_path
                    .as_ref()
                    .ok_or_else(|| ArkError::InvalidSpecifier("missing index path".into()))?;
                ScpIndex::load(path)?
            }
            StorageMode::ArchiveOnly => {
                let path = spec
                    .archive_path
                    .as_ref()
                    .ok_or_else(|| ArkError::InvalidSpecifier("missing archive path".into()))?;
                ScpIndex::from_archive::<H>(path)?
            }
            StorageMode::ArchiveAndIndex => {
                return Err(ArkError::InvalidSpecifier(
                    "read specifier must name exactly one of ark, scp".into(),
                ))
            }
        };
        let index = Arc::new(index);

        let prefetch = if spec.background {
            Some(Prefetcher::spawn(Arc::clone(&index))?)
        } else {
            None
        };
        let accessed = if spec.once {
            vec![false; index.len()]
        } else {
            Vec::new()
        };
        tracing::debug!(spec = %spec, entries = index.len(), "opened random-access table reader");

        Ok(Self {
            spec,
            index,
            state: Mutex::new(AccessState {
                max_key: None,
                max_pos: None,
                accessed,
                prefetch,
                closed: false,
            }),
        })
    }

    /// Whether the index holds this key (side-effect free)
    pub fn contains(&self, key: &str) -> bool {
        self.index.position(key).is_some()
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Retrieve the value for `key`
    pub fn get(&self, key: &str) -> Result<H> {
        let pos = self
            .index
            .position(key)
            .ok_or_else(|| ArkError::KeyNotFound(key.to_string()))?;
        let Some((_, location)) = self.index.record(pos) else {
            return Err(ArkError::KeyNotFound(key.to_string()));
        };

        let mut state = self.state.lock();
        if state.closed {
            return Err(ArkError::Io(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "get on closed table reader",
            )));
        }
        self.check_order(&state, key, pos)?;

        // Prefetch hit avoids the disk read; a miss or a failed prefetch
        // falls back to reading the location directly.
        let value = match state.prefetch.as_ref().and_then(|p| p.take(pos)) {
            Some(Ok(value)) => value,
            _ => index::resolve::<H>(location)?,
        };

        if state.max_key.as_deref().map_or(true, |max| key > max) {
            state.max_key = Some(key.to_string());
        }
        if state.max_pos.map_or(true, |max| pos > max) {
            state.max_pos = Some(pos);
        }
        if self.spec.once {
            state.accessed[pos] = true;
        }
        if let Some(prefetch) = &state.prefetch {
            prefetch.request(pos + 1);
        }
        Ok(value)
    }

    /// Iterate all `(key, value)` pairs in index order
    ///
    /// Pure traversal: does not advance the `cs`/`o` trackers.
    pub fn iter(&self) -> impl Iterator<Item = Result<(String, H)>> + '_ {
        self.index
            .iter()
            .map(|(key, location)| index::resolve::<H>(location).map(|v| (key.clone(), v)))
    }

    /// Join the prefetch worker and release resources; safe to call twice
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(mut prefetch) = state.prefetch.take() {
            prefetch.shutdown();
        }
        state.closed = true;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Enforce the `cs` and `o` assertions for a request
    fn check_order(&self, state: &AccessState<H>, key: &str, pos: usize) -> Result<()> {
        if self.spec.called_sorted {
            if let Some(max) = state.max_key.as_deref() {
                if key < max {
                    return Err(ArkError::OrderingViolation(format!(
                        "key '{}' requested after '{}' in called-sorted (cs) mode",
                        key, max
                    )));
                }
            }
        }
        if self.spec.once {
            if state.accessed[pos] {
                return Err(ArkError::OrderingViolation(format!(
                    "key '{}' retrieved twice in access-once (o) mode",
                    key
                )));
            }
            if let Some(max) = state.max_pos {
                if pos < max {
                    return Err(ArkError::OrderingViolation(format!(
                        "key '{}' accessed out of index order in access-once (o) mode",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<H: Holder + Send + 'static> Drop for RandomAccessTableReader<H> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
