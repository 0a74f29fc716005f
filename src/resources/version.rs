//! VS_VERSION_INFO block decoding.
//!
//! Version resources carry a fixed numeric block (file and product version,
//! flags, target OS) followed by nested key/value entries. The container flavors
//! differ only in string encoding and one header field: NE blocks use NUL
//! terminated Latin-1 keys and have no entry type word, PE blocks use UTF-16
//! keys and carry a `type` word that distinguishes text from binary values.
//!
//! Decoding is deliberately lenient. Shipped executables contain truncated and
//! hand-patched version blocks, so any structural problem ends the walk and the
//! fields parsed up to that point are kept. Callers treat a block that produced
//! nothing at all as an absent resource.

use std::collections::HashMap;

use crate::file::parser::Parser;

/// Fixed-block signature that must open a `VS_VERSION_INFO` value.
const FIXED_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// String encoding flavor of a version-info block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFormat {
    /// 16-bit container flavor: Latin-1 keys, no entry type word.
    Ne,
    /// 32-bit container flavor: UTF-16 keys, entries carry a type word.
    Pe,
}

/// Decoded contents of a version resource.
///
/// The numeric fields come from the fixed block; `strings` holds the nested
/// text entries (PE only, NE blocks have no typed text values) plus two
/// synthesized entries, `"File:"` and `"Prod:"`, with the dotted rendering of
/// the numeric versions.
///
/// # Examples
///
/// ```rust,no_run
/// use exescope::resources::{ResourceReader, WinResources};
///
/// let exe = WinResources::from_file("setup.exe")?;
/// if let Some(info) = exe.version_info() {
///     println!("file version {}", info.file_version_string());
///     if let Some(company) = info.string("CompanyName") {
///         println!("published by {company}");
///     }
/// }
/// # Ok::<(), exescope::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    /// File version as `[major, minor, build, revision]`
    pub file_version: [u16; 4],
    /// Product version as `[major, minor, build, revision]`
    pub product_version: [u16; 4],
    /// Mask selecting which bits of `file_flags` are valid
    pub file_flags_mask: u32,
    /// Build attribute flags, see [`crate::resources::VersionFileFlags`]
    pub file_flags: u32,
    /// Target operating system of the executable
    pub file_os: u32,
    /// General type of the file (application, DLL, driver, ...)
    pub file_type: u32,
    /// Subtype within `file_type`
    pub file_subtype: u32,
    /// Binary creation date, usually zero
    pub file_date: [u32; 2],
    strings: HashMap<String, String>,
}

impl VersionInfo {
    /// Decode a version resource payload.
    ///
    /// Never fails: structural errors end the walk and whatever was decoded up
    /// to that point is returned. Use [`VersionInfo::is_empty`] to detect a
    /// block that yielded nothing.
    #[must_use]
    pub fn read(data: &[u8], format: VersionFormat) -> VersionInfo {
        let mut info = VersionInfo::default();
        let mut parser = Parser::new(data);

        // Best-effort walk; a failed read anywhere keeps the partial result.
        let _ = info.read_entries(&mut parser, format);

        info
    }

    /// Returns `true` when the block yielded no fields at all.
    ///
    /// Empty blocks come from zero-filled or hopelessly truncated version
    /// resources; callers surface them as an absent resource.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_version == [0; 4] && self.product_version == [0; 4] && self.strings.is_empty()
    }

    /// Look up a nested text entry by key, e.g. `"CompanyName"`.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// All nested text entries, including the synthesized `"File:"`/`"Prod:"`.
    #[must_use]
    pub fn strings(&self) -> &HashMap<String, String> {
        &self.strings
    }

    /// Dotted rendering of the file version, e.g. `"3.10.0.66"`.
    #[must_use]
    pub fn file_version_string(&self) -> String {
        dotted(self.file_version)
    }

    /// Dotted rendering of the product version.
    #[must_use]
    pub fn product_version_string(&self) -> String {
        dotted(self.product_version)
    }

    fn read_entries(&mut self, parser: &mut Parser<'_>, format: VersionFormat) -> crate::Result<()> {
        while parser.has_more_data() {
            parser.align(4)?;
            if !parser.has_more_data() {
                break;
            }

            let _entry_len = parser.read_le::<u16>()?;
            let value_len = parser.read_le::<u16>()? as usize;
            let value_type = match format {
                VersionFormat::Ne => 0,
                VersionFormat::Pe => parser.read_le::<u16>()?,
            };

            let key = match format {
                VersionFormat::Ne => parser.read_string_latin1()?,
                VersionFormat::Pe => parser.read_string_utf16()?,
            };
            parser.align(4)?;

            if key == "VS_VERSION_INFO" {
                if !self.read_fixed_block(parser) {
                    break;
                }
            } else if value_type != 0 && value_len > 0 {
                // Text value: value_len counts UTF-16 units, terminator included.
                // Structural headers (StringFileInfo, StringTable, VarFileInfo)
                // also carry the text type but declare no value; skip those.
                let mut units = Vec::with_capacity(value_len);
                for _ in 0..value_len {
                    units.push(parser.read_le::<u16>()?);
                }
                while units.last() == Some(&0) {
                    units.pop();
                }
                self.strings
                    .insert(key, widestring::U16Str::from_slice(&units).to_string_lossy());
            } else if value_len > 0 {
                // Binary value (e.g. the translation table); not decoded.
                parser.advance_by(value_len)?;
            }
        }

        Ok(())
    }

    /// Decode the fixed numeric block. Returns `false` when the signature does
    /// not match, which aborts the walk without discarding anything.
    fn read_fixed_block(&mut self, parser: &mut Parser<'_>) -> bool {
        let inner = |parser: &mut Parser<'_>, info: &mut VersionInfo| -> crate::Result<bool> {
            if parser.read_le::<u32>()? != FIXED_INFO_SIGNATURE {
                return Ok(false);
            }
            let _struct_version = parser.read_le::<u32>()?;

            info.file_version = read_version_pair(parser)?;
            info.product_version = read_version_pair(parser)?;
            info.file_flags_mask = parser.read_le::<u32>()?;
            info.file_flags = parser.read_le::<u32>()?;
            info.file_os = parser.read_le::<u32>()?;
            info.file_type = parser.read_le::<u32>()?;
            info.file_subtype = parser.read_le::<u32>()?;
            info.file_date = [parser.read_le::<u32>()?, parser.read_le::<u32>()?];

            Ok(true)
        };

        match inner(parser, self) {
            Ok(true) => {
                self.strings
                    .insert("File:".to_string(), dotted(self.file_version));
                self.strings
                    .insert("Prod:".to_string(), dotted(self.product_version));
                true
            }
            _ => false,
        }
    }
}

/// Read two packed version dwords as four 16-bit words.
///
/// On disk the words arrive as minor, major, revision, build (each dword packs
/// its high half last in little-endian order); re-pair to the conventional
/// `[major, minor, build, revision]`.
fn read_version_pair(parser: &mut Parser<'_>) -> crate::Result<[u16; 4]> {
    let minor = parser.read_le::<u16>()?;
    let major = parser.read_le::<u16>()?;
    let revision = parser.read_le::<u16>()?;
    let build = parser.read_le::<u16>()?;
    Ok([major, minor, build, revision])
}

fn dotted(version: [u16; 4]) -> String {
    format!(
        "{}.{}.{}.{}",
        version[0], version[1], version[2], version[3]
    )
}
