//! # arkio
//!
//! A typed key-value archive I/O engine for streaming ML pipelines:
//! - Archive (`ark`) files holding concatenated `(key, value)` entries
//! - Index (`scp`) files mapping keys to byte locations for random access
//! - Binary and human-readable text encodings per entry
//! - Pluggable value types via the [`Holder`] contract
//! - Sequential and random-access readers with ordering assertions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Specifier Parser                            │
//! │        "ark,scp,t:data.ark,data.scp" → Specifier             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴─────────────┬──────────────────┐
//!          ▼                          ▼                  ▼
//!   ┌─────────────┐           ┌──────────────┐   ┌──────────────┐
//!   │ TableWriter │           │  Sequential  │   │ RandomAccess │
//!   │ (ark + scp) │           │    Reader    │   │    Reader    │
//!   └──────┬──────┘           └──────┬───────┘   └──────┬───────┘
//!          │                         │                  │
//!          ▼                         ▼                  ▼
//!   ┌─────────────────────────────────────────────────────────┐
//!   │              Archive Codec  +  Holder                   │
//!   │        (key framing, \0B marker, typed payloads)        │
//!   └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use arkio::{RandomAccessTableReader, SequentialTableReader, TableWriter};
//!
//! # fn main() -> arkio::Result<()> {
//! let mut writer = TableWriter::<i32>::new("ark,scp,t:data.ark,data.scp")?;
//! writer.write("a", &10)?;
//! writer.write("b", &20)?;
//! writer.close()?;
//!
//! let reader = SequentialTableReader::<i32>::new("scp:data.scp")?;
//! for entry in reader.entries() {
//!     let (key, value) = entry?;
//!     println!("{} {}", key, value);
//! }
//!
//! let reader = RandomAccessTableReader::<i32>::new("scp:data.scp")?;
//! assert_eq!(reader.get("b")?, 20);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;

pub mod codec;
pub mod holder;
pub mod index;
pub mod specifier;
pub mod table;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ArkError, Result};
pub use holder::{FloatMatrix, Holder};
pub use index::{Location, ScpIndex};
pub use specifier::{Encoding, Specifier, StorageMode};
pub use table::{RandomAccessTableReader, SequentialTableReader, TableWriter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of arkio
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
