//! Resource extraction from NE and PE executable containers.
//!
//! This module is the main entry point of the library. It provides the two
//! container readers, the identifier and type vocabulary they share, and the
//! format-agnostic front end that picks the right reader automatically.
//!
//! # Architecture
//!
//! - **Front end** - [`crate::resources::WinResources`] probes a byte source as
//!   NE first, then PE, and transparently expands SZDD-compressed inputs before
//!   probing.
//! - **Readers** - [`crate::resources::NeResources`] and
//!   [`crate::resources::PeResources`] each parse their container's resource
//!   table up front; lookups afterwards are pure in-memory scans.
//! - **Common surface** - [`crate::resources::ResourceReader`] is the trait both
//!   readers implement, so decoders and callers can work against either
//!   container through dynamic dispatch.
//! - **Diagnostics** - recoverable oddities in shipped containers (clamped
//!   counts, broken name references, out-of-range entries) are collected as
//!   [`crate::resources::Diagnostic`] values on the reader instead of being
//!   logged or escalated to errors.
//!
//! # Examples
//!
//! ```rust,no_run
//! use exescope::resources::{ResourceReader, ResourceType, WinResources};
//!
//! let exe = WinResources::from_file("install.exe")?;
//! for id in exe.get_id_list(&ResourceType::Bitmap.id()) {
//!     let data = exe.get_resource(&ResourceType::Bitmap.id(), &id).unwrap();
//!     println!("bitmap {id}: {} bytes", data.len());
//! }
//! # Ok::<(), exescope::Error>(())
//! ```

mod id;
mod ne;
mod pe;
mod types;
mod version;

pub use id::ResourceId;
pub use ne::{NeResourceEntry, NeResources};
pub use pe::PeResources;
pub use types::{NeEntryFlags, ResourceType, VersionFileFlags};
pub use version::{VersionFormat, VersionInfo};

use std::fmt;

use strum::Display;

use crate::{
    compress,
    file::{Memory, Physical, Source},
    Error, Result,
};

/// Category of a recoverable parse oddity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DiagnosticKind {
    /// A per-type entry count exceeded the sanity cap and was clamped.
    CountClamped,
    /// A string's declared length disagreed with its actual terminator.
    StringLengthMismatch,
    /// A name reference could not be resolved; the affected entry was skipped.
    UnresolvedName,
    /// A table or tree entry pointed outside the image and was skipped.
    EntryOutOfBounds,
    /// The PE resource tree deviated from the type/id/language shape.
    MalformedTree,
}

/// A recoverable oddity found while parsing a container.
///
/// Shipped executables are full of mildly broken resource tables. Anything the
/// reader can work around is recorded here rather than failing the load, so
/// callers that care (asset-auditing tools, test harnesses) can inspect what
/// was tolerated while ordinary callers ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What category of oddity was encountered
    pub kind: DiagnosticKind,
    /// Human-readable description with offsets and values
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(kind: DiagnosticKind, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Common lookup surface of the NE and PE readers.
///
/// The trait is object safe; the cursor and font decoders take
/// `&dyn ResourceReader` so they work against either container.
pub trait ResourceReader {
    /// The raw bytes of one resource, or `None` if it does not exist.
    ///
    /// Both the type and the id can be numeric or named; NE containers
    /// additionally match a numeric entry against the display name its
    /// name table assigns to it.
    fn get_resource(&self, res_type: &ResourceId, id: &ResourceId) -> Option<&[u8]>;

    /// All resource ids of one type, in container order. Empty if the type is
    /// absent.
    fn get_id_list(&self, res_type: &ResourceId) -> Vec<ResourceId>;

    /// One entry of the string table, or `None` if its bucket is absent or
    /// the slot cannot be read.
    fn load_string(&self, string_id: u32) -> Option<String>;

    /// The decoded version resource, or `None` if the container has none (or
    /// only an empty one).
    fn version_info(&self) -> Option<VersionInfo>;

    /// Recoverable oddities encountered while parsing the container.
    fn diagnostics(&self) -> &[Diagnostic];
}

/// Format-agnostic resource reader.
///
/// Wraps either container reader behind one type. Construction probes the
/// input as NE first, then PE; SZDD-compressed inputs are expanded in memory
/// before probing, so a compressed executable loads the same way a plain one
/// does.
///
/// # Examples
///
/// ```rust,no_run
/// use exescope::resources::{ResourceReader, WinResources};
///
/// let exe = WinResources::from_file("setup.exe")?;
/// if let Some(title) = exe.load_string(0) {
///     println!("string 0: {title}");
/// }
/// # Ok::<(), exescope::Error>(())
/// ```
pub enum WinResources<'a> {
    /// A 16-bit New Executable container.
    Ne(NeResources<'a>),
    /// A 32-bit Portable Executable container.
    Pe(PeResources<'a>),
}

impl<'a> WinResources<'a> {
    /// Load a container from a file on disk, memory-mapping it.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if the file is neither an NE nor
    /// a PE container, or an I/O / parse error for unreadable or broken files.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<WinResources<'static>> {
        WinResources::from_source(Source::Owned(Box::new(Physical::new(path)?)))
    }

    /// Load a container from an owned byte buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if the data is neither an NE nor
    /// a PE container.
    pub fn from_mem(data: Vec<u8>) -> Result<WinResources<'static>> {
        WinResources::from_source(Source::Owned(Box::new(Memory::new(data))))
    }

    /// Load a container from borrowed bytes the caller retains ownership of.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if the data is neither an NE nor
    /// a PE container.
    pub fn from_slice(data: &'a [u8]) -> Result<WinResources<'a>> {
        WinResources::from_source(Source::Borrowed(data))
    }

    /// Load a container from an explicit [`Source`], probing NE then PE.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input,
    /// [`crate::Error::NotSupported`] when neither probe matches, or the parse
    /// error of the matching container when its mandatory structures are
    /// broken.
    pub fn from_source(mut source: Source<'a>) -> Result<WinResources<'a>> {
        if source.is_empty() {
            return Err(Error::Empty);
        }

        if compress::is_szdd(source.data()) {
            let expanded = compress::decompress(source.data())?;
            source = Source::Owned(Box::new(Memory::new(expanded)));
        }

        match ne::NeDirectory::read(source.data()) {
            Ok(directory) => return Ok(WinResources::Ne(NeResources::from_parts(source, directory))),
            Err(Error::NotSupported) => {}
            Err(error) => return Err(error),
        }

        match pe::PeDirectory::read(source.data()) {
            Ok(directory) => Ok(WinResources::Pe(PeResources::from_parts(source, directory))),
            Err(error) => Err(error),
        }
    }

    /// Returns `true` when the loaded container is a 16-bit NE executable.
    #[must_use]
    pub fn is_ne(&self) -> bool {
        matches!(self, WinResources::Ne(_))
    }

    /// Returns `true` when the loaded container is a 32-bit PE executable.
    #[must_use]
    pub fn is_pe(&self) -> bool {
        matches!(self, WinResources::Pe(_))
    }

    /// The NE reader, when the container is NE.
    #[must_use]
    pub fn as_ne(&self) -> Option<&NeResources<'a>> {
        match self {
            WinResources::Ne(ne) => Some(ne),
            WinResources::Pe(_) => None,
        }
    }

    /// The PE reader, when the container is PE.
    #[must_use]
    pub fn as_pe(&self) -> Option<&PeResources<'a>> {
        match self {
            WinResources::Ne(_) => None,
            WinResources::Pe(pe) => Some(pe),
        }
    }

    fn reader(&self) -> &dyn ResourceReader {
        match self {
            WinResources::Ne(ne) => ne,
            WinResources::Pe(pe) => pe,
        }
    }
}

impl ResourceReader for WinResources<'_> {
    fn get_resource(&self, res_type: &ResourceId, id: &ResourceId) -> Option<&[u8]> {
        self.reader().get_resource(res_type, id)
    }

    fn get_id_list(&self, res_type: &ResourceId) -> Vec<ResourceId> {
        self.reader().get_id_list(res_type)
    }

    fn load_string(&self, string_id: u32) -> Option<String> {
        self.reader().load_string(string_id)
    }

    fn version_info(&self) -> Option<VersionInfo> {
        self.reader().version_info()
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        self.reader().diagnostics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(matches!(
            WinResources::from_slice(&[]),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn unknown_format() {
        assert!(matches!(
            WinResources::from_mem(vec![0x7F, b'E', b'L', b'F', 0, 0, 0, 0]),
            Err(Error::NotSupported)
        ));
    }

    #[test]
    fn diagnostic_display() {
        let diagnostic = Diagnostic::new(DiagnosticKind::CountClamped, "count 1000 clamped");
        assert_eq!(
            diagnostic.to_string(),
            "CountClamped: count 1000 clamped"
        );
    }
}
