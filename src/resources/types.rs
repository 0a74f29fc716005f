//! Well-known resource type constants and flag sets.
//!
//! The numeric resource types (`RT_*` in the platform headers) are shared by the
//! NE and PE containers. The values here are the observed on-disk constants; the
//! NE container stores them with the high bit (`0x8000`) set, which the reader
//! masks off before they reach this level.

use bitflags::bitflags;
use strum::{Display, EnumIter, FromRepr};

use crate::resources::ResourceId;

/// Well-known resource types shared by NE and PE containers.
///
/// Only the numeric value travels through the lookup API ([`ResourceId::Numeric`]);
/// this enum exists so callers and decoders can name types without magic numbers.
///
/// # Examples
///
/// ```rust
/// use exescope::resources::{ResourceId, ResourceType};
///
/// assert_eq!(ResourceType::GroupCursor.id(), ResourceId::Numeric(12));
/// assert_eq!(ResourceType::from_repr(16), Some(ResourceType::Version));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr)]
#[repr(u16)]
pub enum ResourceType {
    /// Hardware-dependent cursor image (one per group entry)
    Cursor = 1,
    /// Bitmap image
    Bitmap = 2,
    /// Hardware-dependent icon image
    Icon = 3,
    /// Menu definition
    Menu = 4,
    /// Dialog template
    Dialog = 5,
    /// String table bucket (16 strings per resource)
    String = 6,
    /// Font directory, the per-container index of embedded fonts
    FontDir = 7,
    /// Raster font (FNT payload)
    Font = 8,
    /// Accelerator table
    Accelerator = 9,
    /// Application-defined raw data
    RcData = 10,
    /// Message table
    MessageTable = 11,
    /// Cursor group directory
    GroupCursor = 12,
    /// Icon group directory
    GroupIcon = 14,
    /// NE ordinal-to-name override table
    NameTable = 15,
    /// VS_VERSION_INFO block
    Version = 16,
}

impl ResourceType {
    /// The [`ResourceId`] form used by the lookup API.
    #[must_use]
    pub fn id(self) -> ResourceId {
        ResourceId::Numeric(self as u32)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Per-entry flags of an NE resource table entry
    pub struct NeEntryFlags: u16 {
        /// Resource may be moved in memory by the loader
        const MOVEABLE = 0x0010;
        /// Resource is read-only and shareable
        const PURE = 0x0020;
        /// Resource is loaded when the module loads
        const PRELOAD = 0x0040;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Attributes carried in the `fileFlags` word of a VS_VERSION_INFO block
    pub struct VersionFileFlags: u32 {
        /// Debug build
        const DEBUG = 0x0000_0001;
        /// Pre-release build
        const PRERELEASE = 0x0000_0002;
        /// Build has been patched after release
        const PATCHED = 0x0000_0004;
        /// Private build, not built through the release process
        const PRIVATEBUILD = 0x0000_0008;
        /// Version data was inferred rather than authored
        const INFOINFERRED = 0x0000_0010;
        /// Special build, annotated in the string table
        const SPECIALBUILD = 0x0000_0020;
    }
}
