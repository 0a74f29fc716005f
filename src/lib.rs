// Copyright 2026 the exescope contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # exescope
//!
//! A cross-platform library for extracting embedded resources from legacy Windows
//! executables. `exescope` reads the resource tables of 16-bit NE ("New
//! Executable") and 32-bit PE ("Portable Executable") containers without loading
//! or executing any code, and decodes the classic resource payloads: cursors,
//! strings, version metadata, and FNT/FON raster fonts. SZDD-compressed inputs
//! (`COMPRESS.EXE` output, the `.EX_` files of old installers) are expanded
//! transparently.
//!
//! ## Features
//!
//! - **Read-only container access** - memory-mapped or in-memory, never mutates the input
//! - **Both container generations** - NE resource tables and the PE `.rsrc` tree behind one trait
//! - **Robust against shipped breakage** - malformed tables degrade per entry, with diagnostics, instead of failing the load
//! - **Payload decoders** - monochrome cursor groups, string tables, `VS_VERSION_INFO`, raster fonts
//! - **SZDD decompression** - compressed executables and standalone `.XX_` files
//!
//! ## Quick Start
//!
//! Add `exescope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! exescope = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust,no_run
//! use exescope::prelude::*;
//!
//! let exe = WinResources::from_file("game.exe")?;
//! for id in exe.get_id_list(&ResourceType::GroupCursor.id()) {
//!     println!("cursor group {id}");
//! }
//! # Ok::<(), exescope::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use exescope::resources::{ResourceReader, ResourceType, ResourceId, WinResources};
//!
//! // Load a container; NE is probed first, then PE, and SZDD-compressed
//! // inputs are expanded automatically.
//! let exe = WinResources::from_file("install.exe")?;
//!
//! if let Some(info) = exe.version_info() {
//!     println!("version {}", info.file_version_string());
//! }
//!
//! if let Some(data) = exe.get_resource(&ResourceType::RcData.id(), &ResourceId::Numeric(1)) {
//!     println!("RCDATA #1: {} bytes", data.len());
//! }
//! # Ok::<(), exescope::Error>(())
//! ```
//!
//! ### Decoding Payloads
//!
//! ```rust,no_run
//! use exescope::{graphics::{WinCursorGroup, WinFont}, resources::{ResourceId, WinResources}};
//!
//! let exe = WinResources::from_file("game.exe")?;
//!
//! if let Some(group) = WinCursorGroup::read(&exe, &ResourceId::Numeric(100)) {
//!     let (_, cursor) = &group.cursors[0];
//!     println!("{}x{} cursor, hotspot ({}, {})",
//!         cursor.width, cursor.height, cursor.hotspot_x, cursor.hotspot_y);
//! }
//!
//! let fon = WinResources::from_file("system.fon")?;
//! if let Some(font) = WinFont::from_exe(&fon, "System", 10) {
//!     println!("font height {} px", font.pix_height);
//! }
//! # Ok::<(), exescope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`crate::resources`] - container readers, resource identifiers, the common
//!   [`crate::resources::ResourceReader`] trait, and the diagnostics channel
//! - [`crate::graphics`] - cursor group and raster font decoders built on that trait
//! - [`crate::compress`] - SZDD expansion
//! - [`crate::file`] - byte-source backends, stream ownership, and the
//!   bounds-checked [`crate::Parser`]
//!
//! All parsing happens against a fully materialized byte buffer; readers build
//! their directory once at load time and answer lookups from memory afterwards.

#[macro_use]
mod error;

pub use crate::error::Error;

/// Standard result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

pub mod compress;
pub mod file;
pub mod graphics;
pub mod prelude;
pub mod resources;

pub use crate::file::parser::Parser;
