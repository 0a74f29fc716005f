//! Monochrome cursor group decoding.
//!
//! A cursor group resource is a small directory listing the individual cursor
//! resources that make up one logical cursor. Each cursor payload is a hotspot
//! followed by a DIB whose height covers two stacked 1-bit planes: the AND
//! (transparency) mask and the XOR (color) mask, rows stored bottom-up.

use crate::{
    file::parser::Parser,
    resources::{ResourceId, ResourceReader, ResourceType},
    Result,
};

/// Group directory type word for cursors (icons use 1).
const GROUP_TYPE_CURSOR: u16 = 2;
/// The only DIB header size these resources ever carry.
const DIB_HEADER_SIZE: u16 = 40;

/// Palette index of the transparent key color.
const INDEX_KEY: u8 = 0;
/// Palette index of black pixels.
const INDEX_BLACK: u8 = 1;
/// Palette index of white pixels.
const INDEX_WHITE: u8 = 2;

/// One decoded monochrome cursor.
///
/// `pixels` holds `width * height` palette indices in top-down row order.
/// The palette is fixed: index 0 is the transparent key, index 1 black,
/// index 2 white; `key_color` names the transparent index for blitters that
/// honor color keys.
pub struct WinCursor {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels (a single plane, not the stacked DIB height)
    pub height: u16,
    /// Hotspot x coordinate
    pub hotspot_x: u16,
    /// Hotspot y coordinate
    pub hotspot_y: u16,
    /// Palette index treated as transparent
    pub key_color: u8,
    /// Palette indices, top-down, one byte per pixel
    pub pixels: Vec<u8>,
    /// 256-entry RGB palette, 3 bytes per entry
    pub palette: [u8; 768],
}

impl WinCursor {
    /// Decode one cursor resource payload.
    ///
    /// Returns `None` when the DIB deviates from the monochrome cursor shape
    /// (header size, plane count, bit depth, compression) or the payload is
    /// truncated.
    #[must_use]
    pub fn read(data: &[u8]) -> Option<WinCursor> {
        Self::read_inner(data).ok().flatten()
    }

    fn read_inner(data: &[u8]) -> Result<Option<WinCursor>> {
        let mut parser = Parser::new(data);

        let hotspot_x = parser.read_le::<u16>()?;
        let hotspot_y = parser.read_le::<u16>()?;

        if parser.read_le::<u16>()? != DIB_HEADER_SIZE {
            return Ok(None);
        }
        let width = parser.read_le::<u32>()?;
        let height_doubled = parser.read_le::<u32>()?;
        let planes = parser.read_le::<u16>()?;
        let bits_per_pixel = parser.read_le::<u16>()?;
        let compression = parser.read_le::<u32>()?;
        let _image_size = parser.read_le::<u32>()?;
        let _x_resolution = parser.read_le::<u32>()?;
        let _y_resolution = parser.read_le::<u32>()?;
        let num_colors = parser.read_le::<u32>()?;

        if planes != 1 || bits_per_pixel != 1 || compression != 0 {
            return Ok(None);
        }

        let height = height_doubled / 2;
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Ok(None);
        }
        let width = width as usize;
        let height = height as usize;

        // Palette entries are present but fixed by convention; skip them.
        let palette_entries = if num_colors == 0 { 2 } else { num_colors as usize };
        parser.advance_by(palette_entries * 4)?;

        let row_bytes = width.div_ceil(8);
        let plane_size = row_bytes * height;
        let and_plane = parser.read_bytes(plane_size)?;
        let xor_plane = parser.read_bytes(plane_size)?;

        let mut pixels = vec![0u8; width * height];
        for y in 0..height {
            // Planes store rows bottom-up; output is top-down.
            let src_row = height - 1 - y;
            for x in 0..width {
                let byte = src_row * row_bytes + x / 8;
                let bit = 7 - (x % 8);
                let and_bit = (and_plane[byte] >> bit) & 1;
                let xor_bit = (xor_plane[byte] >> bit) & 1;

                pixels[y * width + x] = match (and_bit, xor_bit) {
                    (1, _) => INDEX_KEY,
                    (0, 1) => INDEX_WHITE,
                    _ => INDEX_BLACK,
                };
            }
        }

        let mut palette = [0u8; 768];
        palette[usize::from(INDEX_WHITE) * 3..usize::from(INDEX_WHITE) * 3 + 3]
            .copy_from_slice(&[0xFF, 0xFF, 0xFF]);

        Ok(Some(WinCursor {
            width: width as u16,
            height: height as u16,
            hotspot_x,
            hotspot_y,
            key_color: INDEX_KEY,
            pixels,
            palette,
        }))
    }
}

/// A decoded cursor group: the cursors of one logical pointer, in directory
/// order, each paired with the id of the cursor resource it came from.
pub struct WinCursorGroup {
    /// The member cursors with their resource ids
    pub cursors: Vec<(ResourceId, WinCursor)>,
}

impl WinCursorGroup {
    /// Fetch and decode a cursor group from a resource reader.
    ///
    /// Returns `None` when the group resource is absent, its directory is not
    /// a cursor directory, any member declares an unexpected plane count or
    /// bit depth, or any referenced cursor fails to decode. A group either
    /// decodes completely or not at all.
    #[must_use]
    pub fn read(reader: &dyn ResourceReader, group_id: &ResourceId) -> Option<WinCursorGroup> {
        let data = reader.get_resource(&ResourceType::GroupCursor.id(), group_id)?;
        Self::read_inner(reader, data).ok().flatten()
    }

    fn read_inner(reader: &dyn ResourceReader, data: &[u8]) -> Result<Option<WinCursorGroup>> {
        if data.len() <= 6 {
            return Ok(None);
        }

        let mut parser = Parser::new(data);
        let _reserved = parser.read_le::<u16>()?;
        if parser.read_le::<u16>()? != GROUP_TYPE_CURSOR {
            return Ok(None);
        }
        let count = parser.read_le::<u16>()?;

        let mut cursors = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let _width = parser.read_le::<u16>()?;
            let _height = parser.read_le::<u16>()?;
            let planes = parser.read_le::<u16>()?;
            let bits_per_pixel = parser.read_le::<u16>()?;
            let _data_size = parser.read_le::<u32>()?;
            let cursor_id = parser.read_le::<u32>()?;

            if planes != 1 || bits_per_pixel != 1 {
                return Ok(None);
            }

            let id = ResourceId::Numeric(cursor_id);
            let Some(cursor_data) = reader.get_resource(&ResourceType::Cursor.id(), &id) else {
                return Ok(None);
            };
            let Some(cursor) = WinCursor::read(cursor_data) else {
                return Ok(None);
            };

            cursors.push((id, cursor));
        }

        Ok(Some(WinCursorGroup { cursors }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::resources::{Diagnostic, VersionInfo};

    /// In-memory reader handing out canned resources, for decoder tests.
    struct FakeReader {
        resources: HashMap<(ResourceId, ResourceId), Vec<u8>>,
    }

    impl FakeReader {
        fn new() -> FakeReader {
            FakeReader {
                resources: HashMap::new(),
            }
        }

        fn insert(&mut self, res_type: ResourceType, id: u32, data: Vec<u8>) {
            self.resources
                .insert((res_type.id(), ResourceId::Numeric(id)), data);
        }
    }

    impl ResourceReader for FakeReader {
        fn get_resource(&self, res_type: &ResourceId, id: &ResourceId) -> Option<&[u8]> {
            self.resources
                .get(&(res_type.clone(), id.clone()))
                .map(Vec::as_slice)
        }

        fn get_id_list(&self, res_type: &ResourceId) -> Vec<ResourceId> {
            self.resources
                .keys()
                .filter(|(candidate, _)| candidate == res_type)
                .map(|(_, id)| id.clone())
                .collect()
        }

        fn load_string(&self, _string_id: u32) -> Option<String> {
            None
        }

        fn version_info(&self) -> Option<VersionInfo> {
            None
        }

        fn diagnostics(&self) -> &[Diagnostic] {
            &[]
        }
    }

    fn push_u16(data: &mut Vec<u8>, value: u16) {
        data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(data: &mut Vec<u8>, value: u32) {
        data.extend_from_slice(&value.to_le_bytes());
    }

    /// A 4x2 cursor payload. AND rows (bottom-up): bottom = 0b1111 (all
    /// transparent), top = 0b0000; XOR rows: bottom = 0, top = 0b1010.
    fn cursor_payload(planes: u16, bpp: u16) -> Vec<u8> {
        let mut data = Vec::new();
        push_u16(&mut data, 3); // hotspot x
        push_u16(&mut data, 1); // hotspot y
        push_u16(&mut data, 40); // DIB header size
        push_u32(&mut data, 4); // width
        push_u32(&mut data, 4); // doubled height
        push_u16(&mut data, planes);
        push_u16(&mut data, bpp);
        push_u32(&mut data, 0); // compression
        push_u32(&mut data, 0); // image size
        push_u32(&mut data, 0); // x resolution
        push_u32(&mut data, 0); // y resolution
        push_u32(&mut data, 0); // colors: 0 -> 2 palette entries
        data.extend_from_slice(&[0u8; 8]); // two RGBQUADs
        data.push(0xF0); // AND bottom row: 1111
        data.push(0x00); // AND top row: 0000
        data.push(0x00); // XOR bottom row: 0000
        data.push(0xA0); // XOR top row: 1010
        data
    }

    fn group_payload(planes: u16, bpp: u16, cursor_id: u32) -> Vec<u8> {
        let mut data = Vec::new();
        push_u16(&mut data, 0); // reserved
        push_u16(&mut data, GROUP_TYPE_CURSOR);
        push_u16(&mut data, 1); // one cursor
        push_u16(&mut data, 4); // width, ignored
        push_u16(&mut data, 2); // height, ignored
        push_u16(&mut data, planes);
        push_u16(&mut data, bpp);
        push_u32(&mut data, 0); // data size, ignored
        push_u32(&mut data, cursor_id);
        data
    }

    #[test]
    fn decode_single_cursor() {
        let cursor = WinCursor::read(&cursor_payload(1, 1)).unwrap();

        assert_eq!(cursor.width, 4);
        assert_eq!(cursor.height, 2);
        assert_eq!(cursor.hotspot_x, 3);
        assert_eq!(cursor.hotspot_y, 1);
        assert_eq!(cursor.key_color, 0);

        // Top row: AND=0, XOR=1010 -> white, black, white, black
        assert_eq!(&cursor.pixels[..4], &[2, 1, 2, 1]);
        // Bottom row: AND=1111 -> all transparent
        assert_eq!(&cursor.pixels[4..], &[0, 0, 0, 0]);

        assert_eq!(&cursor.palette[3..6], &[0, 0, 0]); // black
        assert_eq!(&cursor.palette[6..9], &[0xFF, 0xFF, 0xFF]); // white
    }

    #[test]
    fn group_decode_through_reader() {
        let mut reader = FakeReader::new();
        reader.insert(ResourceType::GroupCursor, 100, group_payload(1, 1, 5));
        reader.insert(ResourceType::Cursor, 5, cursor_payload(1, 1));

        let group = WinCursorGroup::read(&reader, &ResourceId::Numeric(100)).unwrap();
        assert_eq!(group.cursors.len(), 1);
        assert_eq!(group.cursors[0].0, ResourceId::Numeric(5));
        assert_eq!(group.cursors[0].1.width, 4);
    }

    #[test]
    fn wrong_planes_or_depth_rejects_the_group() {
        let mut reader = FakeReader::new();
        reader.insert(ResourceType::GroupCursor, 100, group_payload(2, 1, 5));
        reader.insert(ResourceType::Cursor, 5, cursor_payload(1, 1));
        assert!(WinCursorGroup::read(&reader, &ResourceId::Numeric(100)).is_none());

        let mut reader = FakeReader::new();
        reader.insert(ResourceType::GroupCursor, 100, group_payload(1, 8, 5));
        reader.insert(ResourceType::Cursor, 5, cursor_payload(1, 1));
        assert!(WinCursorGroup::read(&reader, &ResourceId::Numeric(100)).is_none());

        // The same checks inside the cursor payload itself
        assert!(WinCursor::read(&cursor_payload(2, 1)).is_none());
        assert!(WinCursor::read(&cursor_payload(1, 8)).is_none());
    }

    #[test]
    fn missing_pieces_reject_the_group() {
        // No group resource at all
        let reader = FakeReader::new();
        assert!(WinCursorGroup::read(&reader, &ResourceId::Numeric(100)).is_none());

        // Group present, referenced cursor missing
        let mut reader = FakeReader::new();
        reader.insert(ResourceType::GroupCursor, 100, group_payload(1, 1, 5));
        assert!(WinCursorGroup::read(&reader, &ResourceId::Numeric(100)).is_none());
    }

    #[test]
    fn truncated_cursor_payload() {
        let mut payload = cursor_payload(1, 1);
        payload.truncate(payload.len() - 2); // cut into the XOR plane
        assert!(WinCursor::read(&payload).is_none());
    }

    #[test]
    fn wrong_dib_header_size() {
        let mut payload = cursor_payload(1, 1);
        payload[4] = 124; // BITMAPV5 size instead of 40
        assert!(WinCursor::read(&payload).is_none());
    }
}
