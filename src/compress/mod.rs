//! SZDD (`COMPRESS.EXE`) decompression.
//!
//! Installers of the era shipped executables and resource files run through
//! `COMPRESS.EXE`, which produces an LZSS stream behind an `SZDD` header (the
//! trailing file-name character of such files is replaced by an underscore,
//! e.g. `SETUP.EX_`). [`crate::resources::WinResources`] expands these inputs
//! transparently; the functions here are public for callers that deal with
//! compressed non-executable files themselves.
//!
//! The stream format is plain LZSS over a 4096-byte ring buffer pre-filled
//! with spaces, with a control byte announcing eight literal-or-reference
//! items at a time, least significant bit first.
//!
//! # Examples
//!
//! ```rust,no_run
//! use exescope::compress;
//!
//! let data = std::fs::read("README.TX_")?;
//! if compress::is_szdd(&data) {
//!     let text = compress::decompress(&data)?;
//!     println!("{}", String::from_utf8_lossy(&text));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::{file::parser::Parser, Result};

/// The 8-byte signature opening every SZDD file.
const SZDD_MAGIC: [u8; 8] = *b"SZDD\x88\xF0\x27\x33";
/// Compression mode byte; `COMPRESS.EXE` only ever wrote mode `A`.
const SZDD_MODE: u8 = b'A';

const WINDOW_SIZE: usize = 0x1000;
const WINDOW_START: usize = WINDOW_SIZE - 16;
/// Minimum match length; the length nibble stores `len - MIN_MATCH`.
const MIN_MATCH: usize = 3;

/// Returns `true` when the data starts with an SZDD header.
#[must_use]
pub fn is_szdd(data: &[u8]) -> bool {
    data.len() >= SZDD_MAGIC.len() && data[..SZDD_MAGIC.len()] == SZDD_MAGIC
}

/// Expand an SZDD-compressed file into its original bytes.
///
/// The output never exceeds the uncompressed length declared in the header;
/// extra bytes after the stream reaches it are ignored. A stream that ends
/// early yields the bytes decoded so far, matching how the original
/// `EXPAND.EXE` treated truncated files.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the signature or mode byte is wrong,
/// or [`crate::Error::OutOfBounds`] if the header itself is truncated.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut parser = Parser::new(data);

    if parser.read_bytes(SZDD_MAGIC.len())? != &SZDD_MAGIC[..] {
        return Err(malformed_error!("Missing SZDD signature"));
    }

    let mode = parser.read_le::<u8>()?;
    if mode != SZDD_MODE {
        return Err(malformed_error!("Unsupported SZDD mode 0x{:02X}", mode));
    }

    let _last_char = parser.read_le::<u8>()?; // original final file-name character
    let uncompressed_len = parser.read_le::<u32>()? as usize;

    let mut window = [0x20u8; WINDOW_SIZE];
    let mut window_pos = WINDOW_START;

    let mut output = Vec::with_capacity(uncompressed_len);

    'stream: while output.len() < uncompressed_len {
        let Ok(control) = parser.read_le::<u8>() else {
            break;
        };

        for bit in 0..8 {
            if output.len() >= uncompressed_len {
                break 'stream;
            }

            if control & (1 << bit) != 0 {
                let Ok(literal) = parser.read_le::<u8>() else {
                    break 'stream;
                };
                window[window_pos] = literal;
                window_pos = (window_pos + 1) % WINDOW_SIZE;
                output.push(literal);
            } else {
                let Ok(low) = parser.read_le::<u8>() else {
                    break 'stream;
                };
                let Ok(high) = parser.read_le::<u8>() else {
                    break 'stream;
                };

                let mut match_pos = usize::from(low) | (usize::from(high & 0xF0) << 4);
                let match_len = usize::from(high & 0x0F) + MIN_MATCH;

                for _ in 0..match_len {
                    if output.len() >= uncompressed_len {
                        break 'stream;
                    }
                    let byte = window[match_pos];
                    match_pos = (match_pos + 1) % WINDOW_SIZE;
                    window[window_pos] = byte;
                    window_pos = (window_pos + 1) % WINDOW_SIZE;
                    output.push(byte);
                }
            }
        }
    }

    Ok(output)
}
