//! # exescope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits of the library. Import this module to get quick access to the
//! essential types for resource extraction.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all exescope operations
pub use crate::Error;

/// The result type used throughout exescope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Format-agnostic resource reader, probing NE then PE
pub use crate::resources::WinResources;

/// The container-specific readers
pub use crate::resources::{NeResources, PeResources};

/// Low-level byte parsing utilities
pub use crate::Parser;

// ================================================================================================
// Resource Lookup Surface
// ================================================================================================

/// Common lookup trait implemented by every reader
pub use crate::resources::ResourceReader;

/// Resource and type identifiers
pub use crate::resources::{ResourceId, ResourceType};

/// Recoverable parse oddities collected during a load
pub use crate::resources::{Diagnostic, DiagnosticKind};

/// Decoded version-information resources
pub use crate::resources::{VersionFileFlags, VersionFormat, VersionInfo};

// ================================================================================================
// Payload Decoders
// ================================================================================================

/// Monochrome cursor groups with hotspots
pub use crate::graphics::{WinCursor, WinCursorGroup};

/// Raster FNT/FON fonts
pub use crate::graphics::{WinFont, WinFontGlyph};

// ================================================================================================
// Byte Sources
// ================================================================================================

/// Pluggable container byte sources and the ownership tag
pub use crate::file::{Backend, Memory, Physical, Source};
