//! Table reader/writer components
//!
//! The collaborator-facing surface of the engine:
//! - [`TableWriter`] — append entries per a write specifier
//! - [`SequentialTableReader`] — forward-only streaming in source order
//! - [`RandomAccessTableReader`] — key lookup backed by the index
//!
//! One owner drives each instance; independent instances on different
//! archives need no coordination, but a given archive stream belongs to a
//! single writer for its lifetime.

mod readahead;
mod random;
mod sequential;
mod writer;

pub use random::RandomAccessTableReader;
pub use sequential::{Entries, SequentialTableReader};
pub use writer::TableWriter;
