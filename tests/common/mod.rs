//! Synthetic container builders shared by the integration tests.
//!
//! These construct byte-exact NE and PE images in memory so tests can verify
//! lookups against the exact payload ranges they wrote, without any sample
//! files on disk.

#![allow(dead_code)]

/// Builds a minimal NE container around a synthetic resource table.
///
/// The MZ stub sits at 0, the NE header at 0x40, and the resource table at
/// 0x80. Payloads are appended after the table, aligned to the table's
/// alignment unit; each payload's length must be a multiple of that unit so
/// the stored size word round-trips exactly.
pub struct NeBuilder {
    align_shift: u16,
    types: Vec<TypeBlock>,
}

struct TypeBlock {
    type_word: u16,
    declared_count: Option<u16>,
    entries: Vec<(u16, Vec<u8>)>,
}

impl NeBuilder {
    pub fn new(align_shift: u16) -> NeBuilder {
        NeBuilder {
            align_shift,
            types: Vec::new(),
        }
    }

    /// Add a resource with a numeric type and id. The high bit of both words
    /// is applied by the builder.
    pub fn add(&mut self, type_id: u16, id: u16, data: &[u8]) -> &mut NeBuilder {
        let align = 1usize << self.align_shift;
        assert!(
            data.len() % align == 0,
            "payload length must be a multiple of the alignment unit"
        );

        let type_word = 0x8000 | type_id;
        let index = match self
            .types
            .iter()
            .position(|block| block.type_word == type_word)
        {
            Some(index) => index,
            None => {
                self.types.push(TypeBlock {
                    type_word,
                    declared_count: None,
                    entries: Vec::new(),
                });
                self.types.len() - 1
            }
        };
        self.types[index].entries.push((0x8000 | id, data.to_vec()));
        self
    }

    /// Override the count word written for a type, independently of how many
    /// entries are actually present.
    pub fn declare_count(&mut self, type_id: u16, count: u16) -> &mut NeBuilder {
        let type_word = 0x8000 | type_id;
        let block = self
            .types
            .iter_mut()
            .find(|block| block.type_word == type_word)
            .expect("declare_count on a type with no entries");
        block.declared_count = Some(count);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let align = 1usize << self.align_shift;
        let table_base = 0x80usize;

        let table_len = 2
            + self
                .types
                .iter()
                .map(|block| 8 + 12 * block.entries.len())
                .sum::<usize>()
            + 2;

        // Lay out payloads after the table, each aligned to the unit.
        let mut cursor = (table_base + table_len).next_multiple_of(align);
        let mut placements: Vec<Vec<(usize, usize)>> = Vec::new();
        for block in &self.types {
            let mut rows = Vec::new();
            for (_, data) in &block.entries {
                rows.push((cursor, data.len()));
                cursor = (cursor + data.len()).next_multiple_of(align);
            }
            placements.push(rows);
        }

        let mut image = vec![0u8; 0x80];
        image[0] = b'M';
        image[1] = b'Z';
        image[60] = 0x40;
        image[0x40] = b'N';
        image[0x41] = b'E';
        image[0x40 + 36] = 0x40; // resource table at 0x80

        image.extend_from_slice(&self.align_shift.to_le_bytes());
        for (block, rows) in self.types.iter().zip(&placements) {
            image.extend_from_slice(&block.type_word.to_le_bytes());
            let count = block
                .declared_count
                .unwrap_or(block.entries.len() as u16);
            image.extend_from_slice(&count.to_le_bytes());
            image.extend_from_slice(&[0u8; 4]); // reserved

            for ((id_word, data), (offset, _)) in block.entries.iter().zip(rows) {
                image.extend_from_slice(&((offset / align) as u16).to_le_bytes());
                image.extend_from_slice(&((data.len() / align) as u16).to_le_bytes());
                image.extend_from_slice(&0u16.to_le_bytes()); // flags
                image.extend_from_slice(&id_word.to_le_bytes());
                image.extend_from_slice(&0u16.to_le_bytes()); // handle
                image.extend_from_slice(&0u16.to_le_bytes()); // usage
            }
        }
        image.extend_from_slice(&0u16.to_le_bytes()); // table terminator

        for (block, rows) in self.types.iter().zip(&placements) {
            for ((_, data), (offset, _)) in block.entries.iter().zip(rows) {
                if image.len() < *offset {
                    image.resize(*offset, 0);
                }
                image.extend_from_slice(data);
            }
        }

        image
    }
}

/// Builds a minimal PE container with a `.rsrc` section.
///
/// The section lands at file offset 0x400 with virtual address 0x1000; the
/// three-level tree is emitted breadth-first and payloads follow the
/// structures.
pub struct PeBuilder {
    resources: Vec<(u32, u32, u32, Vec<u8>)>,
}

impl PeBuilder {
    pub fn new() -> PeBuilder {
        PeBuilder {
            resources: Vec::new(),
        }
    }

    pub fn add(&mut self, res_type: u32, id: u32, lang: u32, data: &[u8]) -> &mut PeBuilder {
        self.resources.push((res_type, id, lang, data.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        const SECTION_OFFSET: usize = 0x400;
        const SECTION_VA: u32 = 0x1000;

        // Group into type -> id -> [(lang, data)], keeping insertion order.
        let mut types: Vec<(u32, Vec<(u32, Vec<(u32, &[u8])>)>)> = Vec::new();
        for (res_type, id, lang, data) in &self.resources {
            let type_index = match types.iter().position(|(t, _)| t == res_type) {
                Some(index) => index,
                None => {
                    types.push((*res_type, Vec::new()));
                    types.len() - 1
                }
            };
            let ids = &mut types[type_index].1;
            let id_index = match ids.iter().position(|(i, _)| i == id) {
                Some(index) => index,
                None => {
                    ids.push((*id, Vec::new()));
                    ids.len() - 1
                }
            };
            ids[id_index].1.push((*lang, data.as_slice()));
        }

        let dir_size = |entries: usize| 16 + 8 * entries;

        // Offsets within the section, breadth-first: root, type dirs, id dirs,
        // then data entries.
        let root_size = dir_size(types.len());
        let mut type_dir_offsets = Vec::new();
        let mut cursor = root_size;
        for (_, ids) in &types {
            type_dir_offsets.push(cursor);
            cursor += dir_size(ids.len());
        }
        let mut id_dir_offsets = Vec::new();
        for (_, ids) in &types {
            let mut offsets = Vec::new();
            for (_, langs) in ids {
                offsets.push(cursor);
                cursor += dir_size(langs.len());
            }
            id_dir_offsets.push(offsets);
        }
        let mut data_entry_offsets = Vec::new();
        for (_, ids) in &types {
            let mut per_id = Vec::new();
            for (_, langs) in ids {
                let mut per_lang = Vec::new();
                for _ in langs {
                    per_lang.push(cursor);
                    cursor += 16;
                }
                per_id.push(per_lang);
            }
            data_entry_offsets.push(per_id);
        }

        // Payloads after the structures, each at a fresh RVA.
        let mut payload_rvas = Vec::new();
        for (_, ids) in &types {
            let mut per_id = Vec::new();
            for (_, langs) in ids {
                let mut per_lang = Vec::new();
                for (_, data) in langs {
                    per_lang.push(SECTION_VA + cursor as u32);
                    cursor += data.len();
                }
                per_id.push(per_lang);
            }
            payload_rvas.push(per_id);
        }
        let section_size = cursor;

        let mut image = vec![0u8; 0x40];
        image[0] = b'M';
        image[1] = b'Z';
        image[60] = 0x80; // e_lfanew
        image.resize(0x80, 0);
        image.extend_from_slice(b"PE\0\0");
        image.extend_from_slice(&0x014Cu16.to_le_bytes()); // machine
        image.extend_from_slice(&1u16.to_le_bytes()); // sections
        image.extend_from_slice(&[0u8; 12]); // timestamp, symbols
        image.extend_from_slice(&0u16.to_le_bytes()); // optional header size
        image.extend_from_slice(&0x0102u16.to_le_bytes()); // characteristics

        image.extend_from_slice(b".rsrc\0\0\0");
        image.extend_from_slice(&(section_size as u32).to_le_bytes());
        image.extend_from_slice(&SECTION_VA.to_le_bytes());
        image.extend_from_slice(&(section_size as u32).to_le_bytes());
        image.extend_from_slice(&(SECTION_OFFSET as u32).to_le_bytes());
        image.resize(image.len() + 16, 0);

        image.resize(SECTION_OFFSET, 0);

        let push_dir = |image: &mut Vec<u8>, entries: &[(u32, u32)]| {
            image.extend_from_slice(&[0u8; 12]); // characteristics, timestamp, versions
            image.extend_from_slice(&0u16.to_le_bytes()); // named entries
            image.extend_from_slice(&(entries.len() as u16).to_le_bytes());
            for (name_or_id, offset) in entries {
                image.extend_from_slice(&name_or_id.to_le_bytes());
                image.extend_from_slice(&offset.to_le_bytes());
            }
        };

        // Root
        let root_entries: Vec<(u32, u32)> = types
            .iter()
            .zip(&type_dir_offsets)
            .map(|((res_type, _), offset)| (*res_type, 0x8000_0000 | *offset as u32))
            .collect();
        push_dir(&mut image, &root_entries);

        // Type level
        for (type_index, (_, ids)) in types.iter().enumerate() {
            let entries: Vec<(u32, u32)> = ids
                .iter()
                .zip(&id_dir_offsets[type_index])
                .map(|((id, _), offset)| (*id, 0x8000_0000 | *offset as u32))
                .collect();
            push_dir(&mut image, &entries);
        }

        // Id level
        for (type_index, (_, ids)) in types.iter().enumerate() {
            for (id_index, (_, langs)) in ids.iter().enumerate() {
                let entries: Vec<(u32, u32)> = langs
                    .iter()
                    .zip(&data_entry_offsets[type_index][id_index])
                    .map(|((lang, _), offset)| (*lang, *offset as u32))
                    .collect();
                push_dir(&mut image, &entries);
            }
        }

        // Data entries
        for (type_index, (_, ids)) in types.iter().enumerate() {
            for (id_index, (_, langs)) in ids.iter().enumerate() {
                for (lang_index, (_, data)) in langs.iter().enumerate() {
                    let rva = payload_rvas[type_index][id_index][lang_index];
                    image.extend_from_slice(&rva.to_le_bytes());
                    image.extend_from_slice(&(data.len() as u32).to_le_bytes());
                    image.extend_from_slice(&[0u8; 8]); // codepage, reserved
                }
            }
        }

        // Payloads
        for (_, ids) in &types {
            for (_, langs) in ids {
                for (_, data) in langs {
                    image.extend_from_slice(data);
                }
            }
        }

        image
    }
}

/// Reference SZDD encoder. Runs of a repeated byte become window
/// back-references (self-overlapping, the way run-length matches work in
/// LZSS); everything else is emitted as literals. Exercises both item kinds
/// of the decoder's control-byte loop.
pub fn szdd_compress(data: &[u8]) -> Vec<u8> {
    const WINDOW_SIZE: usize = 0x1000;
    const MAX_MATCH: usize = 18;

    // (is_literal, encoded bytes) items, grouped into control bytes below.
    fn literal(items: &mut Vec<(bool, Vec<u8>)>, window_pos: &mut usize, byte: u8) {
        items.push((true, vec![byte]));
        *window_pos = (*window_pos + 1) % WINDOW_SIZE;
    }

    let mut items: Vec<(bool, Vec<u8>)> = Vec::new();
    let mut window_pos = WINDOW_SIZE - 16;

    let mut index = 0;
    while index < data.len() {
        let byte = data[index];
        let mut run = 1;
        while index + run < data.len() && data[index + run] == byte {
            run += 1;
        }

        if run >= 4 {
            // One literal seeds the window, then references copy it forward
            // from one byte behind the write cursor.
            literal(&mut items, &mut window_pos, byte);
            let mut remaining = run - 1;
            while remaining >= 3 {
                let len = remaining.min(MAX_MATCH);
                let pos = (window_pos + WINDOW_SIZE - 1) % WINDOW_SIZE;
                items.push((
                    false,
                    vec![
                        (pos & 0xFF) as u8,
                        (((pos >> 8) as u8) << 4) | (len - 3) as u8,
                    ],
                ));
                window_pos = (window_pos + len) % WINDOW_SIZE;
                remaining -= len;
            }
            for _ in 0..remaining {
                literal(&mut items, &mut window_pos, byte);
            }
            index += run;
        } else {
            for _ in 0..run {
                literal(&mut items, &mut window_pos, byte);
            }
            index += run;
        }
    }

    let mut out = b"SZDD\x88\xF0\x27\x33".to_vec();
    out.push(b'A');
    out.push(b'_');
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    for group in items.chunks(8) {
        let mut control = 0u8;
        for (bit, (is_literal, _)) in group.iter().enumerate() {
            if *is_literal {
                control |= 1 << bit;
            }
        }
        out.push(control);
        for (_, bytes) in group {
            out.extend_from_slice(bytes);
        }
    }
    out
}
