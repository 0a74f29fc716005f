//! Memory-mapped file backend.
//!
//! Provides [`crate::file::physical::Physical`], a [`crate::file::Backend`]
//! implementation over a `memmap2` read-only mapping. Mapping the container keeps
//! resource extraction cheap even for large executables: only the header, table
//! and requested resource ranges are ever touched.

use std::{fs, path::Path};

use memmap2::Mmap;

use super::Backend;
use crate::{
    Error::{Error, FileError, OutOfBounds},
    Result,
};

/// Input container backed by a memory-mapped file on disk.
///
/// The mapping is read-only; the library never writes to the source executable.
///
/// # Examples
///
/// ```rust,no_run
/// use exescope::file::{Backend, Physical};
/// use std::path::Path;
///
/// let physical = Physical::new(Path::new("game.exe"))?;
/// assert!(physical.len() > 0);
/// # Ok::<(), exescope::Error>(())
/// ```
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Creates a new physical file backend by memory-mapping the file at `path`.
    ///
    /// # Arguments
    /// * `path` - Path of the file to map
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }

    /// Creates a new physical file backend from an already opened file handle.
    ///
    /// Useful when the caller needs to open the file with specific permissions
    /// or flags before handing it over.
    ///
    /// # Arguments
    /// * `file` - An opened file handle
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if memory mapping fails.
    #[allow(clippy::needless_pass_by_value)]
    pub fn from_std_file(file: fs::File) -> Result<Physical> {
        // The handle is taken by value on purpose: the mapping keeps the file
        // alive internally, and the signature makes that handover explicit.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|error| Error(error.to_string()))?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
