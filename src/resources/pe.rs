//! 32-bit Portable Executable (PE) resource directory reader.
//!
//! PE containers store resources in the `.rsrc` section as a three-level
//! directory tree: type, then id, then language. Directory offsets are relative
//! to the start of the section; leaf data entries give a virtual address that
//! must be translated back to a file offset through the section header.
//!
//! # Key Components
//!
//! - [`crate::resources::pe::PeResources`] - The loaded reader with the lookup API
//!
//! Only the pieces of the PE format needed to reach the resource tree are
//! parsed: the COFF header for the section count, the section table for
//! `.rsrc`, and the tree itself. The optional header is skipped over by its
//! declared size.
//!
//! # Examples
//!
//! ```rust,no_run
//! use exescope::resources::{PeResources, ResourceReader, ResourceType};
//!
//! let exe = PeResources::from_file("setup.exe")?;
//! for id in exe.get_id_list(&ResourceType::GroupCursor.id()) {
//!     println!("cursor group: {id}");
//! }
//! # Ok::<(), exescope::Error>(())
//! ```

use crate::{
    file::{parser::Parser, Memory, Physical, Source},
    resources::{
        version::{VersionFormat, VersionInfo},
        Diagnostic, DiagnosticKind, ResourceId, ResourceReader, ResourceType,
    },
    Error, Result,
};

/// High bit flagging a directory entry field as an offset rather than a value.
const OFFSET_BIT: u32 = 0x8000_0000;
/// The resource tree is exactly three levels deep: type, id, language.
const TREE_DEPTH: usize = 3;

/// A leaf of the resource tree, already translated to file coordinates.
#[derive(Debug, Clone, Copy)]
struct PeDataEntry {
    file_offset: u32,
    size: u32,
    #[allow(dead_code)]
    codepage: u32,
}

/// One raw directory entry before descending.
struct RawDirEntry {
    id: ResourceId,
    offset: u32,
    is_dir: bool,
}

/// Parsed `.rsrc` tree: type level, id level, language level.
#[derive(Debug, Default)]
pub(crate) struct PeDirectory {
    types: Vec<(ResourceId, Vec<(ResourceId, Vec<(ResourceId, PeDataEntry)>)>)>,
    diagnostics: Vec<Diagnostic>,
}

/// Resource reader for 32-bit Portable Executable containers.
///
/// Construction walks the whole `.rsrc` tree up front. Lookups afterwards scan
/// the parsed tree in directory order; the language dimension is collapsed by
/// [`PeResources::get_resource`], which returns the first language of an id,
/// while [`PeResources::get_resource_lang`] selects one explicitly.
pub struct PeResources<'a> {
    source: Source<'a>,
    directory: PeDirectory,
}

impl<'a> PeResources<'a> {
    /// Load a PE container from a file on disk, memory-mapping it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not a PE container.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<PeResources<'static>> {
        PeResources::from_source(Source::Owned(Box::new(Physical::new(path)?)))
    }

    /// Load a PE container from an owned byte buffer.
    ///
    /// # Errors
    /// Returns an error if the data is not a PE container.
    pub fn from_mem(data: Vec<u8>) -> Result<PeResources<'static>> {
        PeResources::from_source(Source::Owned(Box::new(Memory::new(data))))
    }

    /// Load a PE container from borrowed bytes the caller retains ownership of.
    ///
    /// # Errors
    /// Returns an error if the data is not a PE container.
    pub fn from_slice(data: &'a [u8]) -> Result<PeResources<'a>> {
        PeResources::from_source(Source::Borrowed(data))
    }

    /// Load a PE container from an explicit [`Source`].
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] if the `MZ`/`PE\0\0` signatures
    /// are absent, or a parse error if the container is structurally broken at
    /// a mandatory offset.
    pub fn from_source(source: Source<'a>) -> Result<PeResources<'a>> {
        let directory = PeDirectory::read(source.data())?;
        Ok(PeResources { source, directory })
    }

    pub(crate) fn from_parts(source: Source<'a>, directory: PeDirectory) -> PeResources<'a> {
        PeResources { source, directory }
    }

    /// All resource types present, in directory order.
    #[must_use]
    pub fn get_type_list(&self) -> Vec<ResourceId> {
        self.directory
            .types
            .iter()
            .map(|(res_type, _)| res_type.clone())
            .collect()
    }

    /// The languages available for one resource, in directory order.
    #[must_use]
    pub fn get_lang_list(&self, res_type: &ResourceId, id: &ResourceId) -> Vec<ResourceId> {
        self.find_languages(res_type, id)
            .map(|langs| langs.iter().map(|(lang, _)| lang.clone()).collect())
            .unwrap_or_default()
    }

    /// The raw bytes of one resource in a specific language.
    #[must_use]
    pub fn get_resource_lang(
        &self,
        res_type: &ResourceId,
        id: &ResourceId,
        lang: &ResourceId,
    ) -> Option<&[u8]> {
        let langs = self.find_languages(res_type, id)?;
        let entry = langs
            .iter()
            .find(|(candidate, _)| candidate == lang)
            .map(|(_, entry)| entry)?;
        self.slice_entry(entry)
    }

    /// Returns `true` when the reader owns its byte source.
    #[must_use]
    pub fn owns_source(&self) -> bool {
        self.source.is_owned()
    }

    /// Recoverable oddities encountered while walking the tree.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.directory.diagnostics
    }

    fn find_languages(
        &self,
        res_type: &ResourceId,
        id: &ResourceId,
    ) -> Option<&[(ResourceId, PeDataEntry)]> {
        let (_, ids) = self
            .directory
            .types
            .iter()
            .find(|(candidate, _)| candidate == res_type)?;
        let (_, langs) = ids.iter().find(|(candidate, _)| candidate == id)?;
        Some(langs)
    }

    fn slice_entry(&self, entry: &PeDataEntry) -> Option<&[u8]> {
        let start = entry.file_offset as usize;
        let end = start + entry.size as usize;

        // Bounds were validated when the leaf was admitted at load time.
        Some(&self.source.data()[start..end])
    }
}

impl ResourceReader for PeResources<'_> {
    fn get_resource(&self, res_type: &ResourceId, id: &ResourceId) -> Option<&[u8]> {
        let langs = self.find_languages(res_type, id)?;
        let (_, entry) = langs.first()?;
        self.slice_entry(entry)
    }

    fn get_id_list(&self, res_type: &ResourceId) -> Vec<ResourceId> {
        self.directory
            .types
            .iter()
            .find(|(candidate, _)| candidate == res_type)
            .map(|(_, ids)| ids.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }

    fn load_string(&self, string_id: u32) -> Option<String> {
        // Same 16-per-bucket layout as the NE table, but the strings are
        // length-prefixed UTF-16 instead of Pascal.
        let bucket = ResourceId::Numeric((string_id >> 4) + 1);
        let data = self.get_resource(&ResourceType::String.id(), &bucket)?;

        let mut parser = Parser::new(data);
        for _ in 0..(string_id & 0xF) {
            parser.read_prefixed_string_utf16().ok()?;
        }

        parser.read_prefixed_string_utf16().ok()
    }

    fn version_info(&self) -> Option<VersionInfo> {
        let ids = self.get_id_list(&ResourceType::Version.id());
        let data = self.get_resource(&ResourceType::Version.id(), ids.first()?)?;

        let info = VersionInfo::read(data, VersionFormat::Pe);
        (!info.is_empty()).then_some(info)
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.directory.diagnostics
    }
}

impl PeDirectory {
    /// Locate the `.rsrc` section and walk the resource tree out of it.
    pub(crate) fn read(data: &[u8]) -> Result<PeDirectory> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut parser = Parser::new(data);

        if parser.read_be::<u16>()? != 0x4D5A {
            return Err(Error::NotSupported);
        }

        parser.seek(60)?;
        let pe_offset = parser.read_le::<u32>()? as usize;

        parser.seek(pe_offset)?;
        if parser.read_le::<u32>()? != 0x0000_4550 {
            return Err(Error::NotSupported);
        }

        // COFF header
        let _machine = parser.read_le::<u16>()?;
        let num_sections = parser.read_le::<u16>()?;
        let _timestamp = parser.read_le::<u32>()?;
        let _symbol_table = parser.read_le::<u32>()?;
        let _num_symbols = parser.read_le::<u32>()?;
        let opt_header_size = parser.read_le::<u16>()?;
        let _characteristics = parser.read_le::<u16>()?;

        parser.advance_by(opt_header_size as usize)?;

        // Section table: 40 bytes per section, find .rsrc
        let mut rsrc: Option<(u32, u32)> = None; // (virtual_address, raw_offset)
        for _ in 0..num_sections {
            let name = parser.read_bytes(8)?;
            let _virtual_size = parser.read_le::<u32>()?;
            let virtual_address = parser.read_le::<u32>()?;
            let _raw_size = parser.read_le::<u32>()?;
            let raw_offset = parser.read_le::<u32>()?;
            parser.advance_by(16)?; // relocations, line numbers, characteristics

            let name_len = name.iter().position(|&b| b == 0).unwrap_or(8);
            if &name[..name_len] == b".rsrc" {
                rsrc = Some((virtual_address, raw_offset));
                break;
            }
        }

        let Some((section_va, section_offset)) = rsrc else {
            // No resource section; a valid, empty container.
            return Ok(PeDirectory::default());
        };

        let mut directory = PeDirectory::default();
        directory.read_tree(data, section_offset as usize, section_va)?;
        Ok(directory)
    }

    fn read_tree(&mut self, data: &[u8], rsrc_offset: usize, section_va: u32) -> Result<()> {
        let type_entries = self.read_dir_entries(data, rsrc_offset, 0)?;

        for type_entry in type_entries {
            let Some(type_offset) = self.expect_subdir(&type_entry, 0) else {
                continue;
            };
            let mut ids = Vec::new();

            for id_entry in self.read_dir_entries(data, rsrc_offset, type_offset)? {
                let Some(id_offset) = self.expect_subdir(&id_entry, 1) else {
                    continue;
                };
                let mut langs = Vec::new();

                for lang_entry in self.read_dir_entries(data, rsrc_offset, id_offset)? {
                    if lang_entry.is_dir {
                        // Deeper than type/id/language; real containers never do this.
                        self.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::MalformedTree,
                            format!(
                                "Subdirectory below level {TREE_DEPTH} at entry {}",
                                lang_entry.id
                            ),
                        ));
                        continue;
                    }

                    if let Some(leaf) = self.read_data_entry(
                        data,
                        rsrc_offset,
                        lang_entry.offset as usize,
                        section_va,
                    )? {
                        langs.push((lang_entry.id, leaf));
                    }
                }

                ids.push((id_entry.id, langs));
            }

            self.types.push((type_entry.id, ids));
        }

        Ok(())
    }

    /// Read one directory header plus its entry list at `dir_offset` relative
    /// to the start of the resource section.
    fn read_dir_entries(
        &mut self,
        data: &[u8],
        rsrc_offset: usize,
        dir_offset: u32,
    ) -> Result<Vec<RawDirEntry>> {
        let mut parser = Parser::new(data);
        parser.seek(rsrc_offset + dir_offset as usize)?;

        let _characteristics = parser.read_le::<u32>()?;
        let _timestamp = parser.read_le::<u32>()?;
        let _major_version = parser.read_le::<u16>()?;
        let _minor_version = parser.read_le::<u16>()?;
        let num_named = parser.read_le::<u16>()?;
        let num_id = parser.read_le::<u16>()?;

        let total = usize::from(num_named) + usize::from(num_id);
        let mut entries = Vec::with_capacity(total);

        for _ in 0..total {
            let name_or_id = parser.read_le::<u32>()?;
            let offset = parser.read_le::<u32>()?;

            let id = if name_or_id & OFFSET_BIT != 0 {
                match self.read_entry_name(data, rsrc_offset, name_or_id & !OFFSET_BIT) {
                    Some(name) => ResourceId::Name(name),
                    None => continue,
                }
            } else {
                ResourceId::Numeric(name_or_id)
            };

            entries.push(RawDirEntry {
                id,
                offset: offset & !OFFSET_BIT,
                is_dir: offset & OFFSET_BIT != 0,
            });
        }

        Ok(entries)
    }

    /// Resolve a directory entry name: a 16-bit character count followed by
    /// UTF-16 units, at `name_offset` relative to the section start.
    fn read_entry_name(
        &mut self,
        data: &[u8],
        rsrc_offset: usize,
        name_offset: u32,
    ) -> Option<String> {
        let mut parser = Parser::new(data);
        let name = parser
            .seek(rsrc_offset + name_offset as usize)
            .and_then(|()| parser.read_prefixed_string_utf16());

        match name {
            Ok(name) => Some(name),
            Err(_) => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvedName,
                    format!("Unreadable name reference at section offset {name_offset}"),
                ));
                None
            }
        }
    }

    /// Read one leaf data entry and translate its virtual address back to a
    /// file offset. Returns `None` (with a diagnostic) when the leaf points
    /// outside the image.
    fn read_data_entry(
        &mut self,
        data: &[u8],
        rsrc_offset: usize,
        entry_offset: usize,
        section_va: u32,
    ) -> Result<Option<PeDataEntry>> {
        let mut parser = Parser::new(data);
        parser.seek(rsrc_offset + entry_offset)?;

        let data_rva = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;
        let codepage = parser.read_le::<u32>()?;
        let _reserved = parser.read_le::<u32>()?;

        let file_offset = data_rva
            .checked_sub(section_va)
            .and_then(|relative| relative.checked_add(rsrc_offset as u32));

        let in_bounds = file_offset
            .map(|offset| offset as usize + size as usize <= data.len())
            .unwrap_or(false);

        match file_offset {
            Some(offset) if in_bounds => Ok(Some(PeDataEntry {
                file_offset: offset,
                size,
                codepage,
            })),
            _ => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::EntryOutOfBounds,
                    format!(
                        "Data entry at RVA 0x{data_rva:08X} ({size} bytes) falls outside the image"
                    ),
                ));
                Ok(None)
            }
        }
    }

    fn expect_subdir(&mut self, entry: &RawDirEntry, level: usize) -> Option<u32> {
        if entry.is_dir {
            Some(entry.offset)
        } else {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedTree,
                format!("Data entry {} at tree level {level}", entry.id),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u16(image: &mut Vec<u8>, value: u16) {
        image.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(image: &mut Vec<u8>, value: u32) {
        image.extend_from_slice(&value.to_le_bytes());
    }

    /// Directory header with `count` id entries and no named ones.
    fn push_dir_header(image: &mut Vec<u8>, named: u16, ids: u16) {
        push_u32(image, 0); // characteristics
        push_u32(image, 0); // timestamp
        push_u16(image, 0); // major version
        push_u16(image, 0); // minor version
        push_u16(image, named);
        push_u16(image, ids);
    }

    /// A minimal PE with one `.rsrc` section at file offset 0x200 (virtual
    /// address 0x1000) holding one resource: `res_type`/`res_id`/lang 0x409
    /// pointing at `payload` placed at file offset 0x300.
    fn build_pe(res_type: u32, res_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut image = vec![0u8; 0x40];
        image[0] = b'M';
        image[1] = b'Z';
        image[60] = 0x80; // e_lfanew

        image.resize(0x80, 0);
        image.extend_from_slice(b"PE\0\0");
        push_u16(&mut image, 0x014C); // machine: i386
        push_u16(&mut image, 1); // one section
        push_u32(&mut image, 0); // timestamp
        push_u32(&mut image, 0); // symbol table
        push_u32(&mut image, 0); // symbol count
        push_u16(&mut image, 0); // optional header size
        push_u16(&mut image, 0x0102); // characteristics

        // Section header
        image.extend_from_slice(b".rsrc\0\0\0");
        push_u32(&mut image, 0x200); // virtual size
        push_u32(&mut image, 0x1000); // virtual address
        push_u32(&mut image, 0x200); // raw size
        push_u32(&mut image, 0x200); // raw offset
        image.resize(image.len() + 16, 0);

        image.resize(0x200, 0);

        // Root directory: one type entry -> subdir at 0x18
        push_dir_header(&mut image, 0, 1);
        push_u32(&mut image, res_type);
        push_u32(&mut image, OFFSET_BIT | 0x18);

        // Id directory at 0x218 -> subdir at 0x30
        push_dir_header(&mut image, 0, 1);
        push_u32(&mut image, res_id);
        push_u32(&mut image, OFFSET_BIT | 0x30);

        // Language directory at 0x230 -> data entry at 0x48
        push_dir_header(&mut image, 0, 1);
        push_u32(&mut image, 0x409);
        push_u32(&mut image, 0x48);

        // Data entry at 0x248: RVA 0x1100 -> file offset 0x300
        push_u32(&mut image, 0x1100);
        push_u32(&mut image, payload.len() as u32);
        push_u32(&mut image, 0); // codepage
        push_u32(&mut image, 0); // reserved

        image.resize(0x300, 0);
        image.extend_from_slice(payload);
        image
    }

    #[test]
    fn rejects_foreign_signatures() {
        assert!(matches!(
            PeDirectory::read(&[0x7F, b'E', b'L', b'F']),
            Err(Error::NotSupported)
        ));
        assert!(matches!(PeDirectory::read(&[]), Err(Error::Empty)));

        // NE containers share the MZ stub but not the PE signature
        let mut image = vec![0u8; 0x84];
        image[0] = b'M';
        image[1] = b'Z';
        image[60] = 0x80;
        image[0x80] = b'N';
        image[0x81] = b'E';
        assert!(matches!(
            PeResources::from_slice(&image),
            Err(Error::NotSupported)
        ));
    }

    #[test]
    fn leaf_lookup_through_the_tree() {
        let image = build_pe(10, 7, &[0xCA, 0xFE, 0xBA, 0xBE]);
        let exe = PeResources::from_slice(&image).unwrap();

        assert_eq!(exe.get_type_list(), vec![ResourceId::Numeric(10)]);
        assert_eq!(
            exe.get_id_list(&ResourceId::Numeric(10)),
            vec![ResourceId::Numeric(7)]
        );
        assert_eq!(
            exe.get_lang_list(&ResourceId::Numeric(10), &ResourceId::Numeric(7)),
            vec![ResourceId::Numeric(0x409)]
        );

        let data = exe
            .get_resource(&ResourceId::Numeric(10), &ResourceId::Numeric(7))
            .unwrap();
        assert_eq!(data, &[0xCA, 0xFE, 0xBA, 0xBE]);

        let data = exe
            .get_resource_lang(
                &ResourceId::Numeric(10),
                &ResourceId::Numeric(7),
                &ResourceId::Numeric(0x409),
            )
            .unwrap();
        assert_eq!(data, &[0xCA, 0xFE, 0xBA, 0xBE]);

        assert!(exe
            .get_resource_lang(
                &ResourceId::Numeric(10),
                &ResourceId::Numeric(7),
                &ResourceId::Numeric(0x407),
            )
            .is_none());
        assert!(exe
            .get_resource(&ResourceId::Numeric(11), &ResourceId::Numeric(7))
            .is_none());
        assert!(exe.diagnostics().is_empty());
    }

    #[test]
    fn missing_rsrc_section_is_an_empty_container() {
        let mut image = build_pe(10, 7, &[1, 2, 3]);
        // Rename the section so the scan cannot find .rsrc
        let pos = image.windows(5).position(|w| w == b".rsrc").unwrap();
        image[pos..pos + 5].copy_from_slice(b".data");

        let exe = PeResources::from_slice(&image).unwrap();
        assert!(exe.get_type_list().is_empty());
        assert!(exe
            .get_resource(&ResourceId::Numeric(10), &ResourceId::Numeric(7))
            .is_none());
    }

    #[test]
    fn leaf_outside_the_image_is_skipped() {
        let mut image = build_pe(10, 7, &[1, 2, 3]);
        // Rewrite the data entry's RVA to point far outside the image
        let entry = 0x248;
        image[entry..entry + 4].copy_from_slice(&0x00FF_0000u32.to_le_bytes());

        let exe = PeResources::from_slice(&image).unwrap();
        assert!(exe
            .get_resource(&ResourceId::Numeric(10), &ResourceId::Numeric(7))
            .is_none());
        assert_eq!(exe.diagnostics().len(), 1);
        assert_eq!(exe.diagnostics()[0].kind, DiagnosticKind::EntryOutOfBounds);
    }

    #[test]
    fn named_type_entry() {
        let mut image = build_pe(10, 7, &[0x11, 0x22]);
        // Turn the type entry into a named one: name at section offset 0x80
        let root_entry = 0x200 + 16;
        image[root_entry..root_entry + 4].copy_from_slice(&(OFFSET_BIT | 0x80).to_le_bytes());
        let name_at = 0x200 + 0x80;
        image[name_at..name_at + 2].copy_from_slice(&4u16.to_le_bytes());
        for (i, unit) in "WAVE".encode_utf16().enumerate() {
            let at = name_at + 2 + i * 2;
            image[at..at + 2].copy_from_slice(&unit.to_le_bytes());
        }

        let exe = PeResources::from_slice(&image).unwrap();
        assert_eq!(exe.get_type_list(), vec![ResourceId::from("WAVE")]);
        assert!(exe
            .get_resource(&ResourceId::from("wave"), &ResourceId::Numeric(7))
            .is_some());
    }

    #[test]
    fn utf16_string_bucket() {
        // String bucket 2 (ids 16..31) with four prefixed UTF-16 strings.
        let mut bucket = Vec::new();
        for text in ["Alpha", "Beta", "Gamma", "Delta"] {
            push_u16(&mut bucket, text.len() as u16);
            for unit in text.encode_utf16() {
                push_u16(&mut bucket, unit);
            }
        }

        let image = build_pe(6, 2, &bucket);
        let exe = PeResources::from_slice(&image).unwrap();

        assert_eq!(exe.load_string(16).unwrap(), "Alpha");
        assert_eq!(exe.load_string(19).unwrap(), "Delta");
        assert!(exe.load_string(20).is_none()); // Slot past the bucket's data
        assert!(exe.load_string(0).is_none()); // Bucket 1 does not exist
    }
}
