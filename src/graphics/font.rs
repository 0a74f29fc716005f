//! Raster FNT/FON font decoding.
//!
//! A FON file is itself an NE (or PE) executable whose font resources carry
//! FNT payloads; the font directory resource indexes them by face name and
//! point size. Decoding goes through two steps: match the requested face in
//! the `FONTDIR` resource to find the right font resource id, then unpack the
//! FNT glyph table into byte-per-pixel rasters.
//!
//! FNT glyph data is column-major: each glyph stores `ceil(width/8)` column
//! groups of `pixHeight` bytes, one bit per pixel, most significant bit
//! leftmost.

use crate::{
    file::parser::Parser,
    resources::{ResourceId, ResourceReader, ResourceType},
    Result,
};

/// The FNT versions this decoder understands.
const SUPPORTED_VERSIONS: [u16; 3] = [0x100, 0x200, 0x300];
/// Type-word bit marking a vector (stroke) font.
const TYPE_VECTOR: u16 = 0x0001;

/// In a FONTDIR record, the point-size word sits this far past the record id.
const FONTDIR_POINTS_OFFSET: usize = 68;
/// Bytes between the point-size word and the device-name string.
const FONTDIR_POINTS_TO_NAMES: usize = 43;

/// One glyph of a raster font.
pub struct WinFontGlyph {
    /// Advance width in pixels
    pub char_width: u16,
    /// `char_width * pixHeight` bytes, one per pixel, row-major top-down
    pub bitmap: Vec<u8>,
}

/// A decoded raster font.
///
/// Glyphs cover the character range `[first_char, last_char]` plus one
/// trailing synthetic space glyph. Characters outside the range are
/// substituted by `default_char`, falling back to the space slot when the
/// default itself is out of range.
///
/// # Examples
///
/// ```rust,no_run
/// use exescope::{graphics::WinFont, resources::WinResources};
///
/// let fon = WinResources::from_file("system.fon")?;
/// let font = WinFont::from_exe(&fon, "System", 10).unwrap();
/// println!("height {} px, 'A' is {} px wide", font.pix_height, font.char_width(b'A'));
/// # Ok::<(), exescope::Error>(())
/// ```
pub struct WinFont {
    /// Glyph height in pixels
    pub pix_height: u16,
    /// Widest glyph advance in the font
    pub max_width: u16,
    /// First character code covered
    pub first_char: u8,
    /// Last character code covered
    pub last_char: u8,
    /// Substitute for out-of-range characters
    pub default_char: u8,
    /// Typographic ascent in pixels
    pub ascent: u16,
    /// Weight class (400 regular, 700 bold)
    pub weight: u16,
    /// Italic style flag
    pub italic: bool,
    /// Underline style flag
    pub underline: bool,
    /// Strikeout style flag
    pub strikeout: bool,
    glyphs: Vec<WinFontGlyph>,
}

impl WinFont {
    /// Load a font from an executable container, matching the font directory.
    ///
    /// An empty `face` accepts the first directory entry regardless of
    /// `points`. Returns `None` when the container has no font directory, no
    /// entry matches, or the matched FNT payload does not decode.
    #[must_use]
    pub fn from_exe(reader: &dyn ResourceReader, face: &str, points: u16) -> Option<WinFont> {
        let font_id = match_font_directory(reader, face, points)?;
        let data = reader.get_resource(&ResourceType::Font.id(), &font_id)?;
        WinFont::from_fnt(data)
    }

    /// Decode a raw FNT payload.
    ///
    /// Returns `None` for unsupported versions (anything but 0x100, 0x200,
    /// 0x300), vector fonts, and truncated payloads.
    #[must_use]
    pub fn from_fnt(data: &[u8]) -> Option<WinFont> {
        Self::read_fnt(data).ok().flatten()
    }

    fn read_fnt(data: &[u8]) -> Result<Option<WinFont>> {
        let mut parser = Parser::new(data);

        let version = parser.read_le::<u16>()?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Ok(None);
        }

        let _size = parser.read_le::<u32>()?;
        parser.advance_by(60)?; // copyright

        let font_type = parser.read_le::<u16>()?;
        if font_type & TYPE_VECTOR != 0 {
            return Ok(None);
        }

        let _points = parser.read_le::<u16>()?;
        let _vert_res = parser.read_le::<u16>()?;
        let _horiz_res = parser.read_le::<u16>()?;
        let ascent = parser.read_le::<u16>()?;
        let _internal_leading = parser.read_le::<u16>()?;
        let _external_leading = parser.read_le::<u16>()?;
        let italic = parser.read_le::<u8>()? != 0;
        let underline = parser.read_le::<u8>()? != 0;
        let strikeout = parser.read_le::<u8>()? != 0;
        let weight = parser.read_le::<u16>()?;
        let _charset = parser.read_le::<u8>()?;
        let _pix_width = parser.read_le::<u16>()?;
        let pix_height = parser.read_le::<u16>()?;
        let _pitch_and_family = parser.read_le::<u8>()?;
        let avg_width = parser.read_le::<u16>()?;
        let max_width = parser.read_le::<u16>()?;
        let first_char = parser.read_le::<u8>()?;
        let last_char = parser.read_le::<u8>()?;
        let default_char = parser.read_le::<u8>()?;
        let _break_char = parser.read_le::<u8>()?;
        let _width_bytes = parser.read_le::<u16>()?;
        let _device = parser.read_le::<u32>()?;
        let _face = parser.read_le::<u32>()?;
        let _bits_pointer = parser.read_le::<u32>()?;
        let bits_offset = parser.read_le::<u32>()?;
        let _reserved = parser.read_le::<u8>()?;

        if version == 0x300 {
            let _flags = parser.read_le::<u32>()?;
            let _a_space = parser.read_le::<u16>()?;
            let _b_space = parser.read_le::<u16>()?;
            let _c_space = parser.read_le::<u16>()?;
            let _color_pointer = parser.read_le::<u32>()?;
            parser.advance_by(16)?; // reserved1
        }

        if last_char < first_char {
            return Ok(None);
        }
        let glyph_count = usize::from(last_char) - usize::from(first_char) + 2;

        // Glyph table: advance width plus bitmap offset per slot.
        let mut table = Vec::with_capacity(glyph_count);
        for _ in 0..glyph_count {
            let char_width = parser.read_le::<u16>()?;
            let offset = match version {
                0x300 => parser.read_le::<u32>()? as usize,
                // v1 offsets are relative to the bitmap block
                0x100 => parser.read_le::<u16>()? as usize + bits_offset as usize,
                _ => parser.read_le::<u16>()? as usize,
            };
            table.push((char_width, offset));
        }

        let mut glyphs = Vec::with_capacity(glyph_count);
        for &(char_width, offset) in table.iter().take(glyph_count - 1) {
            parser.seek(offset)?;
            glyphs.push(WinFontGlyph {
                char_width,
                bitmap: read_glyph_raster(&mut parser, char_width, pix_height)?,
            });
        }

        // The trailing slot is a synthetic blank space.
        glyphs.push(WinFontGlyph {
            char_width: avg_width,
            bitmap: vec![0; usize::from(avg_width) * usize::from(pix_height)],
        });

        Ok(Some(WinFont {
            pix_height,
            max_width,
            first_char,
            last_char,
            default_char,
            ascent,
            weight,
            italic,
            underline,
            strikeout,
            glyphs,
        }))
    }

    /// Number of glyph slots, including the trailing space slot.
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// The glyph a character code renders as, after default substitution.
    #[must_use]
    pub fn glyph(&self, character: u8) -> &WinFontGlyph {
        &self.glyphs[self.character_index(character)]
    }

    /// Advance width of a character, after default substitution.
    #[must_use]
    pub fn char_width(&self, character: u8) -> u16 {
        self.glyph(character).char_width
    }

    /// Blit one character into a byte-per-pixel destination buffer.
    ///
    /// Set pixels are written as `color`; unset pixels leave the destination
    /// untouched. Pixels falling outside the destination are clipped.
    pub fn draw_char(
        &self,
        dest: &mut [u8],
        dest_pitch: usize,
        x: usize,
        y: usize,
        character: u8,
        color: u8,
    ) {
        let glyph = self.glyph(character);
        let width = usize::from(glyph.char_width);

        for row in 0..usize::from(self.pix_height) {
            for col in 0..width {
                if glyph.bitmap[row * width + col] == 0 {
                    continue;
                }
                let index = (y + row) * dest_pitch + x + col;
                if x + col < dest_pitch && index < dest.len() {
                    dest[index] = color;
                }
            }
        }
    }

    fn character_index(&self, character: u8) -> usize {
        let mut code = character;
        if code < self.first_char || code > self.last_char {
            code = self.default_char;
        }
        if code < self.first_char || code > self.last_char {
            return self.glyphs.len() - 1;
        }
        usize::from(code - self.first_char)
    }
}

/// Unpack one column-major 1-bit glyph raster into a byte-per-pixel buffer.
fn read_glyph_raster(parser: &mut Parser<'_>, width: u16, height: u16) -> Result<Vec<u8>> {
    let width = usize::from(width);
    let height = usize::from(height);
    let mut bitmap = vec![0u8; width * height];

    for group in 0..width.div_ceil(8) {
        for row in 0..height {
            let byte = parser.read_le::<u8>()?;
            for bit in 0..8 {
                let col = group * 8 + bit;
                if col < width {
                    bitmap[row * width + col] = (byte >> (7 - bit)) & 1;
                }
            }
        }
    }

    Ok(bitmap)
}

/// Scan the font directory for the resource id of a face/size combination.
///
/// The directory resource is looked up under the name `FONTDIR` first, then
/// under the first id of the font-directory type. An empty `face` accepts the
/// first record.
fn match_font_directory(
    reader: &dyn ResourceReader,
    face: &str,
    points: u16,
) -> Option<ResourceId> {
    let dir_type = ResourceType::FontDir.id();
    let data = reader
        .get_resource(&dir_type, &ResourceId::from("FONTDIR"))
        .or_else(|| {
            let ids = reader.get_id_list(&dir_type);
            reader.get_resource(&dir_type, ids.first()?)
        })?;

    scan_font_directory(data, face, points).ok().flatten()
}

fn scan_font_directory(data: &[u8], face: &str, points: u16) -> Result<Option<ResourceId>> {
    let mut parser = Parser::new(data);
    let count = parser.read_le::<u16>()?;

    for _ in 0..count {
        let font_id = parser.read_le::<u16>()?;
        parser.advance_by(FONTDIR_POINTS_OFFSET)?;
        let record_points = parser.read_le::<u16>()?;
        parser.advance_by(FONTDIR_POINTS_TO_NAMES)?;
        let _device = parser.read_string_latin1()?;
        let record_face = parser.read_string_latin1()?;

        if face.is_empty() || (record_face.eq_ignore_ascii_case(face) && record_points == points) {
            return Ok(Some(ResourceId::Numeric(u32::from(font_id))));
        }
    }

    Ok(None)
}
