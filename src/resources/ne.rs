//! 16-bit New Executable (NE) resource table reader.
//!
//! NE containers carry a flat resource table inside the NE sub-header segment:
//! a global alignment shift followed by per-type blocks of fixed 12-byte entries,
//! terminated by a zero type word. Type and entry identifiers use the high-bit
//! convention — `0x8000` set means a numeric ordinal (low 15 bits), clear means
//! the low 15 bits are a byte offset from the table base to a length-prefixed
//! Pascal name.
//!
//! # Key Components
//!
//! - [`crate::resources::ne::NeResources`] - The loaded reader with the lookup API
//! - [`crate::resources::ne::NeResourceEntry`] - One parsed table entry
//!
//! The reader is best-effort on corrupt tables: an implausible entry count is
//! clamped, a broken name offset or an entry pointing past the end of the image
//! skips that entry only, and every such event is recorded on the diagnostics
//! channel instead of failing the load.
//!
//! # Examples
//!
//! ```rust,no_run
//! use exescope::resources::{NeResources, ResourceReader, ResourceType};
//!
//! let exe = NeResources::from_file("game.exe")?;
//! for id in exe.get_id_list(&ResourceType::Cursor.id()) {
//!     println!("cursor resource: {id}");
//! }
//! # Ok::<(), exescope::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    file::{parser::Parser, Memory, Physical, Source},
    resources::{
        types::NeEntryFlags,
        version::{VersionFormat, VersionInfo},
        Diagnostic, DiagnosticKind, ResourceId, ResourceReader, ResourceType,
    },
    Error, Result,
};

/// The type word that terminates the NE resource table.
const TABLE_END: u16 = 0;
/// High bit marking a numeric (rather than named) type or id word.
const NUMERIC_BIT: u16 = 0x8000;
/// Sanity cap on the per-type entry count of a corrupt table.
const MAX_ENTRIES_PER_TYPE: u16 = 256;

/// One entry of the NE resource table.
///
/// `file_offset` and `size` are already scaled by the table's alignment shift
/// and validated against the image length at load time.
#[derive(Debug, Clone)]
pub struct NeResourceEntry {
    /// Type of the resource, numeric or named
    pub res_type: ResourceId,
    /// Identifier of the resource, numeric or named
    pub id: ResourceId,
    /// Absolute file offset of the resource bytes
    pub file_offset: u32,
    /// Size of the resource bytes
    pub size: u32,
    /// Raw entry flag word
    pub flags: u16,
    /// Loader handle slot, preserved verbatim
    pub handle: u16,
    /// Loader usage count slot, preserved verbatim
    pub usage: u16,
}

impl NeResourceEntry {
    /// The typed view of the entry flag word.
    #[must_use]
    pub fn entry_flags(&self) -> NeEntryFlags {
        NeEntryFlags::from_bits_truncate(self.flags)
    }
}

/// Parsed directory state, built once during load and never mutated afterwards.
#[derive(Debug, Default)]
pub(crate) struct NeDirectory {
    entries: Vec<NeResourceEntry>,
    name_overrides: HashMap<ResourceId, HashMap<u16, String>>,
    diagnostics: Vec<Diagnostic>,
}

/// Resource reader for 16-bit New Executable containers.
///
/// Construction parses the full resource table up front; lookups afterwards are
/// pure in-memory scans plus one bounded slice into the source image. Lookups
/// for absent resources return `None`/empty rather than an error, so callers can
/// fall back (e.g. to the PE reader) without special cases.
pub struct NeResources<'a> {
    source: Source<'a>,
    directory: NeDirectory,
}

impl<'a> NeResources<'a> {
    /// Load an NE container from a file on disk, memory-mapping it.
    ///
    /// The reader owns the mapping and releases it when dropped.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not an NE container.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<NeResources<'static>> {
        NeResources::from_source(Source::Owned(Box::new(Physical::new(path)?)))
    }

    /// Load an NE container from an owned byte buffer.
    ///
    /// # Errors
    /// Returns an error if the data is not an NE container.
    pub fn from_mem(data: Vec<u8>) -> Result<NeResources<'static>> {
        NeResources::from_source(Source::Owned(Box::new(Memory::new(data))))
    }

    /// Load an NE container from borrowed bytes the caller retains ownership of.
    ///
    /// # Errors
    /// Returns an error if the data is not an NE container.
    pub fn from_slice(data: &'a [u8]) -> Result<NeResources<'a>> {
        NeResources::from_source(Source::Borrowed(data))
    }

    /// Load an NE container from an explicit [`Source`].
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if the `MZ`/`NE` signatures are
    /// absent (the data may still be a PE container), or a parse error if the
    /// container is structurally broken at a mandatory offset.
    pub fn from_source(source: Source<'a>) -> Result<NeResources<'a>> {
        let directory = NeDirectory::read(source.data())?;
        Ok(NeResources { source, directory })
    }

    pub(crate) fn from_parts(source: Source<'a>, directory: NeDirectory) -> NeResources<'a> {
        NeResources { source, directory }
    }

    /// All parsed resource table entries, in table order.
    #[must_use]
    pub fn entries(&self) -> &[NeResourceEntry] {
        &self.directory.entries
    }

    /// Recoverable oddities encountered while parsing the table.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.directory.diagnostics
    }

    /// Returns `true` when the reader owns its byte source.
    #[must_use]
    pub fn owns_source(&self) -> bool {
        self.source.is_owned()
    }

    fn find_entry(&self, res_type: &ResourceId, id: &ResourceId) -> Option<&NeResourceEntry> {
        for entry in &self.directory.entries {
            if entry.res_type != *res_type {
                continue;
            }

            if entry.id == *id {
                return Some(entry);
            }

            // A numeric entry can also be found under the display name the
            // container's name table assigns to its ordinal.
            if let (ResourceId::Name(wanted), ResourceId::Numeric(ordinal)) = (id, &entry.id) {
                let override_name = self
                    .directory
                    .name_overrides
                    .get(res_type)
                    .and_then(|names| names.get(&(*ordinal as u16)));
                if let Some(name) = override_name {
                    if name.eq_ignore_ascii_case(wanted) {
                        return Some(entry);
                    }
                }
            }
        }

        None
    }
}

impl ResourceReader for NeResources<'_> {
    fn get_resource(&self, res_type: &ResourceId, id: &ResourceId) -> Option<&[u8]> {
        let entry = self.find_entry(res_type, id)?;
        let start = entry.file_offset as usize;
        let end = start + entry.size as usize;

        // Bounds were validated when the entry was admitted at load time.
        Some(&self.source.data()[start..end])
    }

    fn get_id_list(&self, res_type: &ResourceId) -> Vec<ResourceId> {
        self.directory
            .entries
            .iter()
            .filter(|entry| entry.res_type == *res_type)
            .map(|entry| entry.id.clone())
            .collect()
    }

    fn load_string(&self, string_id: u32) -> Option<String> {
        // String resources are bucketed 16 per resource; the bucket ordinal is
        // (id >> 4) + 1 and the low nibble selects the slot within the bucket.
        let bucket = ResourceId::Numeric((string_id >> 4) + 1);
        let data = self.get_resource(&ResourceType::String.id(), &bucket)?;

        let mut parser = Parser::new(data);
        for _ in 0..(string_id & 0xF) {
            parser.read_pascal_string().ok()?;
        }

        parser.read_pascal_string().ok()
    }

    fn version_info(&self) -> Option<VersionInfo> {
        let ids = self.get_id_list(&ResourceType::Version.id());
        let data = self.get_resource(&ResourceType::Version.id(), ids.first()?)?;

        let info = VersionInfo::read(data, VersionFormat::Ne);
        (!info.is_empty()).then_some(info)
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.directory.diagnostics
    }
}

impl NeDirectory {
    /// Parse the resource table out of a full NE image.
    pub(crate) fn read(data: &[u8]) -> Result<NeDirectory> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut parser = Parser::new(data);

        if parser.read_be::<u16>()? != 0x4D5A {
            return Err(Error::NotSupported);
        }

        // Only the low 16 bits of the header-offset field are consumed, even
        // though DOS headers reserve 32. Legacy loaders did the same and some
        // shipped containers depend on the truncation.
        parser.seek(60)?;
        let ne_offset = parser.read_le::<u16>()? as usize;

        parser.seek(ne_offset)?;
        if parser.read_be::<u16>()? != 0x4E45 {
            return Err(Error::NotSupported);
        }

        parser.seek(ne_offset + 36)?;
        let table_offset = parser.read_le::<u16>()? as usize;
        if table_offset == 0 {
            // No resources at all; a valid, empty container.
            return Ok(NeDirectory::default());
        }

        let table_base = ne_offset + table_offset;
        parser.seek(table_base)?;

        let mut directory = NeDirectory::default();

        let align_shift = parser.read_le::<u16>()?;
        if align_shift > 15 {
            return Err(malformed_error!(
                "Implausible resource alignment shift {}",
                align_shift
            ));
        }
        let alignment = 1u32 << align_shift;

        loop {
            let type_word = parser.read_le::<u16>()?;
            if type_word == TABLE_END {
                break;
            }

            let res_type = if type_word & NUMERIC_BIT != 0 {
                ResourceId::Numeric(u32::from(type_word & !NUMERIC_BIT))
            } else {
                match read_table_name(
                    &mut parser,
                    table_base + (type_word & !NUMERIC_BIT) as usize,
                    &mut directory.diagnostics,
                ) {
                    Some(name) => ResourceId::Name(name),
                    None => ResourceId::Null,
                }
            };

            let mut count = parser.read_le::<u16>()?;
            parser.advance_by(4)?; // reserved

            if count > MAX_ENTRIES_PER_TYPE {
                directory.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::CountClamped,
                    format!(
                        "Resource count {} for type {} clamped to {}",
                        count, res_type, MAX_ENTRIES_PER_TYPE
                    ),
                ));
                count = MAX_ENTRIES_PER_TYPE;
            }

            for _ in 0..count {
                let file_offset = u32::from(parser.read_le::<u16>()?) * alignment;
                let size = u32::from(parser.read_le::<u16>()?) * alignment;
                let flags = parser.read_le::<u16>()?;
                let id_word = parser.read_le::<u16>()?;
                let handle = parser.read_le::<u16>()?;
                let usage = parser.read_le::<u16>()?;

                let id = if id_word & NUMERIC_BIT != 0 {
                    ResourceId::Numeric(u32::from(id_word & !NUMERIC_BIT))
                } else {
                    match read_table_name(
                        &mut parser,
                        table_base + (id_word & !NUMERIC_BIT) as usize,
                        &mut directory.diagnostics,
                    ) {
                        Some(name) => ResourceId::Name(name),
                        None => {
                            // Unresolvable id name; drop this entry, keep the table.
                            continue;
                        }
                    }
                };

                if file_offset as usize + size as usize > data.len() {
                    directory.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::EntryOutOfBounds,
                        format!(
                            "Entry {} of type {} spans {}..{} past the image end {}",
                            id,
                            res_type,
                            file_offset,
                            file_offset as usize + size as usize,
                            data.len()
                        ),
                    ));
                    continue;
                }

                if res_type == ResourceType::NameTable.id() {
                    let block = &data[file_offset as usize..(file_offset + size) as usize];
                    read_name_table(
                        block,
                        &mut directory.name_overrides,
                        &mut directory.diagnostics,
                    );
                }

                directory.entries.push(NeResourceEntry {
                    res_type: res_type.clone(),
                    id,
                    file_offset,
                    size,
                    flags,
                    handle,
                    usage,
                });
            }
        }

        Ok(directory)
    }
}

/// Read a Pascal name the table refers to by absolute offset.
///
/// Saves and restores the parser position around its own seek so the caller's
/// sequential table reads stay aligned. An embedded NUL ends the name early and
/// is reported as a length mismatch; a broken offset returns `None`.
fn read_table_name(
    parser: &mut Parser<'_>,
    offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let saved = parser.pos();

    let name = (|| -> Result<String> {
        parser.seek(offset)?;
        let declared = parser.read_le::<u8>()? as usize;
        let bytes = parser.read_bytes(declared)?;

        let name: String = match bytes.iter().position(|&b| b == 0) {
            Some(nul) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::StringLengthMismatch,
                    format!(
                        "Name at offset {} declares {} bytes but ends after {}",
                        offset, declared, nul
                    ),
                ));
                bytes[..nul].iter().map(|&b| b as char).collect()
            }
            None => bytes.iter().map(|&b| b as char).collect(),
        };

        Ok(name)
    })();

    // The table cursor must survive even a failed name read.
    let _ = parser.seek(saved);

    match name {
        Ok(name) => Some(name),
        Err(_) => {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnresolvedName,
                format!("Unreadable name reference at offset {offset}"),
            ));
            None
        }
    }
}

/// Parse a name-table resource block into ordinal-to-name overrides.
///
/// Each record is `{u16 totalLen, u16 type, u16 id, u8 pad, name[totalLen-7]}`,
/// with a zero `totalLen` terminating the list. Records are best-effort; a
/// truncated record ends the scan with a diagnostic.
fn read_name_table(
    block: &[u8],
    overrides: &mut HashMap<ResourceId, HashMap<u16, String>>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut parser = Parser::new(block);

    loop {
        if parser.remaining() < 2 {
            break;
        }

        let Ok(total_len) = parser.read_le::<u16>() else {
            break;
        };
        if total_len == 0 {
            break;
        }
        if total_len < 7 {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::StringLengthMismatch,
                format!("Name table record of {total_len} bytes is too short"),
            ));
            break;
        }

        let record = (|| -> Result<(u16, u16, String)> {
            let res_type = parser.read_le::<u16>()?;
            let id = parser.read_le::<u16>()? & !NUMERIC_BIT;
            parser.advance()?; // pad
            let name_bytes = parser.read_bytes(total_len as usize - 7)?;
            let name = name_bytes.iter().map(|&b| b as char).collect();
            Ok((res_type, id, name))
        })();

        match record {
            Ok((res_type, id, name)) => {
                overrides
                    .entry(ResourceId::Numeric(u32::from(res_type & !NUMERIC_BIT)))
                    .or_default()
                    .insert(id, name);
            }
            Err(_) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::StringLengthMismatch,
                    "Truncated name table record".to_string(),
                ));
                break;
            }
        }
    }
}
