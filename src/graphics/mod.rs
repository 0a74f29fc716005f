//! Decoders for the graphical resource payloads.
//!
//! These are thin consumers of the [`crate::resources::ResourceReader`] lookup
//! surface: they fetch raw resource bytes through the trait and carry their own
//! knowledge of the cursor DIB and FNT byte layouts. Nothing here touches the
//! container formats directly, so each decoder works against NE and PE
//! containers alike.
//!
//! # Key Components
//!
//! - [`crate::graphics::WinCursorGroup`] - Monochrome cursor groups with hotspots
//! - [`crate::graphics::WinFont`] - Raster FNT/FON fonts with glyph rasters
//!
//! Following the convention of the resource readers, a payload that does not
//! decode (wrong header size, unexpected plane count, unsupported font version)
//! yields `None` rather than an error: a missing or broken asset is something
//! callers substitute a default for, not a crash.

mod cursor;
mod font;

pub use cursor::{WinCursor, WinCursorGroup};
pub use font::{WinFont, WinFontGlyph};
