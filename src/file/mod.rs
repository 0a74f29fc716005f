//! Byte-source abstraction for executable containers.
//!
//! This module provides the pieces every resource reader is built on: pluggable
//! data backends, the explicit stream-ownership tag, and the low-level parsing
//! utilities.
//!
//! # Architecture
//!
//! - **Backend system** - [`crate::file::Backend`] abstracts over where the container
//!   bytes live: a memory-mapped file on disk ([`crate::file::Physical`]) or a heap
//!   buffer ([`crate::file::Memory`]).
//! - **Ownership tag** - [`crate::file::Source`] records whether a reader borrows its
//!   bytes from the caller or owns a backend outright, so teardown responsibility
//!   is explicit rather than implied by a flag.
//! - **Parsing infrastructure** - [`crate::file::parser::Parser`] and
//!   [`crate::file::io`] provide bounds-checked, endian-aware access to the raw
//!   layouts.
//!
//! All access is read-only; the library never mutates a container.
//!
//! # Examples
//!
//! ```rust,no_run
//! use exescope::file::{Backend, Physical, Source};
//!
//! let backend = Physical::new("game.exe")?;
//! let source = Source::Owned(Box::new(backend));
//! assert!(!source.data().is_empty());
//! # Ok::<(), exescope::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

pub use memory::Memory;
pub use physical::Physical;

use crate::Result;

/// A source of raw container bytes.
///
/// Implementations provide bounds-checked access to a fully materialized byte
/// buffer. Readers never perform incremental I/O: NE and PE resource tables are
/// parsed with offset arithmetic over the whole image, so the backend only has
/// to answer slice requests.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no data.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Explicit ownership tag for the byte source behind a reader.
///
/// A reader either borrows bytes the caller keeps responsibility for, or owns a
/// backend that is torn down when the reader is dropped. Modeling this as an
/// enum keeps the disposal contract in the type instead of a runtime flag.
pub enum Source<'a> {
    /// The reader borrows the bytes; the caller retains ownership.
    Borrowed(&'a [u8]),
    /// The reader owns the backend and drops it on teardown.
    Owned(Box<dyn Backend>),
}

impl Source<'_> {
    /// Access the full byte buffer regardless of ownership.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match self {
            Source::Borrowed(data) => data,
            Source::Owned(backend) => backend.data(),
        }
    }

    /// Returns the total length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Source::Borrowed(data) => data.len(),
            Source::Owned(backend) => backend.len(),
        }
    }

    /// Returns `true` if the underlying buffer holds no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when the reader owns the backing storage.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self, Source::Owned(_))
    }
}

impl std::fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Borrowed(data) => f
                .debug_tuple("Borrowed")
                .field(&format_args!("{} bytes", data.len()))
                .finish(),
            Source::Owned(backend) => f
                .debug_tuple("Owned")
                .field(&format_args!("{} bytes", backend.len()))
                .finish(),
        }
    }
}
